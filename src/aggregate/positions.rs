//! Position log reduction

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::trace;

use crate::schema::PositionSample;

/// Latest sample per driver, by timestamp.
///
/// On equal timestamps the sample encountered later in iteration wins. A
/// sample without a timestamp sorts before any timestamped one. Samples missing
/// the driver number or the position are skipped.
pub fn latest_positions(samples: &[PositionSample]) -> BTreeMap<u32, PositionSample> {
    let mut latest: BTreeMap<u32, PositionSample> = BTreeMap::new();

    for sample in samples {
        let (Some(driver), Some(_)) = (sample.driver_number, sample.position) else {
            trace!("Skipping position sample without driver or position");
            continue;
        };

        match latest.entry(driver) {
            Entry::Vacant(slot) => {
                slot.insert(sample.clone());
            }
            Entry::Occupied(mut slot) => {
                if sample.date >= slot.get().date {
                    slot.insert(sample.clone());
                }
            }
        }
    }

    latest
}

/// `(driver_number, position)` pairs sorted ascending by position.
///
/// Equal positions, which the upstream briefly reports mid-overtake, are
/// ordered by driver number so the ranking is deterministic.
pub fn ranking(latest: &BTreeMap<u32, PositionSample>) -> Vec<(u32, u32)> {
    let mut ranked: Vec<(u32, u32)> = latest
        .iter()
        .filter_map(|(driver, sample)| sample.position.map(|p| (*driver, p)))
        .collect();
    ranked.sort_by_key(|&(driver, position)| (position, driver));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn t(seconds: i64) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 13, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    #[test]
    fn latest_sample_wins() {
        let samples = vec![PositionSample::new(5, 2, t(0)), PositionSample::new(5, 1, t(10))];
        assert_eq!(latest_positions(&samples)[&5].position, Some(1));

        let reversed: Vec<_> = samples.into_iter().rev().collect();
        assert_eq!(latest_positions(&reversed)[&5].position, Some(1));
    }

    #[test]
    fn equal_timestamps_are_last_wins() {
        let samples = vec![PositionSample::new(5, 3, t(0)), PositionSample::new(5, 4, t(0))];
        assert_eq!(latest_positions(&samples)[&5].position, Some(4));
    }

    #[test]
    fn undated_samples_lose_to_dated_ones() {
        let undated = PositionSample { date: None, ..PositionSample::new(8, 9, t(0)) };
        let samples = vec![PositionSample::new(8, 2, t(0)), undated];
        assert_eq!(latest_positions(&samples)[&8].position, Some(2));
    }

    #[test]
    fn ranking_sorts_by_position() {
        let samples = vec![
            PositionSample::new(44, 3, t(0)),
            PositionSample::new(1, 1, t(0)),
            PositionSample::new(16, 2, t(0)),
        ];
        let ranked = ranking(&latest_positions(&samples));
        assert_eq!(ranked, vec![(1, 1), (16, 2), (44, 3)]);
    }

    proptest! {
        #[test]
        fn prop_one_sample_per_driver_with_max_timestamp(
            raw in prop::collection::vec((1u32..8, 1u32..21, 0i64..500), 0..150)
        ) {
            let samples: Vec<_> = raw.iter().map(|&(d, p, s)| PositionSample::new(d, p, t(s))).collect();
            let latest = latest_positions(&samples);

            for (driver, sample) in &latest {
                let max = samples.iter().filter(|s| s.driver_number == Some(*driver)).map(|s| s.date).max();
                prop_assert_eq!(sample.date, max.flatten());
            }

            let ranked = ranking(&latest);
            prop_assert_eq!(ranked.len(), latest.len());
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].1 <= pair[1].1);
            }
        }
    }
}
