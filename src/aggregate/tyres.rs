//! Tyre compound usage for a single driver

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::schema::{TyreCompound, TyreStint};

/// Laps driven on one compound and their share of the total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct CompoundUsage {
    pub compound: TyreCompound,
    pub laps: u32,
    /// Share of all counted laps, 0..=100
    pub percentage: f64,
}

impl CompoundUsage {
    /// Chart label, e.g. `"SOFT (42.5%)"`
    pub fn label(&self) -> String {
        format!("{} ({:.1}%)", self.compound, self.percentage)
    }
}

/// Laps per compound across a driver's stints, in first-used order.
///
/// Stints with no compound or without both lap bounds (the running stint)
/// are not counted, and neither is a stint that would overflow its
/// compound's lap total.
pub fn tyre_usage(stints: &[TyreStint]) -> Vec<CompoundUsage> {
    let mut totals: Vec<(TyreCompound, u32)> = Vec::new();

    for stint in stints {
        let (Some(compound), Some(laps)) = (stint.tyre_compound(), stint.laps()) else {
            trace!(stint = ?stint.stint_number, "Skipping incomplete stint");
            continue;
        };
        match totals.iter_mut().find(|(c, _)| *c == compound) {
            Some((_, total)) => match total.checked_add(laps) {
                Some(sum) => *total = sum,
                None => trace!(stint = ?stint.stint_number, laps, "Skipping overflowing stint"),
            },
            None => totals.push((compound, laps)),
        }
    }

    let all_laps: u64 = totals.iter().map(|&(_, laps)| u64::from(laps)).sum();
    if all_laps == 0 {
        return Vec::new();
    }

    totals
        .into_iter()
        .map(|(compound, laps)| CompoundUsage {
            compound,
            laps,
            percentage: f64::from(laps) / all_laps as f64 * 100.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn groups_laps_by_compound() {
        let stints = vec![
            TyreStint::new(1, "MEDIUM", 1, 20),
            TyreStint::new(1, "HARD", 21, 45),
            TyreStint::new(1, "MEDIUM", 46, 50),
        ];

        let usage = tyre_usage(&stints);
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].compound, TyreCompound::Medium);
        assert_eq!(usage[0].laps, 25);
        assert_eq!(usage[0].label(), "MEDIUM (50.0%)");
        assert_eq!(usage[1].compound, TyreCompound::Hard);
        assert_eq!(usage[1].laps, 25);
    }

    #[test]
    fn open_and_unnamed_stints_are_skipped() {
        let running = TyreStint { lap_end: None, ..TyreStint::new(1, "SOFT", 30, 30) };
        let unnamed = TyreStint { compound: None, ..TyreStint::new(1, "SOFT", 1, 10) };

        assert!(tyre_usage(&[running, unnamed]).is_empty());
    }

    #[test]
    fn huge_lap_bounds_do_not_overflow() {
        assert!(tyre_usage(&[TyreStint::new(1, "SOFT", 0, u32::MAX)]).is_empty());

        let stints = vec![
            TyreStint::new(1, "SOFT", 1, 3_000_000_000),
            TyreStint::new(1, "SOFT", 1, 3_000_000_000),
            TyreStint::new(1, "HARD", 1, 3_000_000_000),
        ];
        let usage = tyre_usage(&stints);
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].laps, 3_000_000_000);
        assert_eq!(usage[0].label(), "SOFT (50.0%)");
        assert_eq!(usage[1].laps, 3_000_000_000);
    }

    proptest! {
        #[test]
        fn prop_percentages_sum_to_one_hundred(
            raw in prop::collection::vec((prop::sample::select(vec!["SOFT", "MEDIUM", "HARD", "WET"]), 1u32..30, 0u32..30), 1..10)
        ) {
            let stints: Vec<_> = raw.iter().map(|&(c, start, len)| TyreStint::new(1, c, start, start + len)).collect();
            let usage = tyre_usage(&stints);

            let sum: f64 = usage.iter().map(|u| u.percentage).sum();
            prop_assert!((sum - 100.0).abs() < 1e-6);

            let laps: u32 = usage.iter().map(|u| u.laps).sum();
            let expected: u32 = raw.iter().map(|&(_, _, len)| len + 1).sum();
            prop_assert_eq!(laps, expected);
        }
    }
}
