//! Per-driver lap reductions
//!
//! Both reductions are a single pass over the flat record list with a
//! per-driver accumulator, and produce at most one record per driver.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::trace;

use crate::schema::LapRecord;

/// Fastest lap per driver.
///
/// Records without a (finite) duration are skipped entirely; they never reset
/// or replace a running best. On equal durations the earlier record is kept.
pub fn best_lap_times(records: &[LapRecord]) -> BTreeMap<u32, LapRecord> {
    let mut best: BTreeMap<u32, LapRecord> = BTreeMap::new();

    for lap in records {
        let Some(driver) = lap.driver_number else {
            trace!("Skipping lap without driver number");
            continue;
        };
        let Some(duration) = lap.lap_duration.filter(|d| d.is_finite()) else {
            continue;
        };

        match best.entry(driver) {
            Entry::Vacant(slot) => {
                slot.insert(lap.clone());
            }
            Entry::Occupied(mut slot) => {
                if slot.get().lap_duration.is_none_or(|current| duration < current) {
                    slot.insert(lap.clone());
                }
            }
        }
    }

    best
}

/// Most recent lap per driver, by lap number.
///
/// The duration may be null: the lap in progress is still the latest one.
/// Records without a lap number cannot be ordered and are skipped.
pub fn last_lap_times(records: &[LapRecord]) -> BTreeMap<u32, LapRecord> {
    let mut last: BTreeMap<u32, LapRecord> = BTreeMap::new();

    for lap in records {
        let (Some(driver), Some(lap_number)) = (lap.driver_number, lap.lap_number) else {
            trace!("Skipping lap without driver or lap number");
            continue;
        };

        match last.entry(driver) {
            Entry::Vacant(slot) => {
                slot.insert(lap.clone());
            }
            Entry::Occupied(mut slot) => {
                if slot.get().lap_number.is_none_or(|current| lap_number > current) {
                    slot.insert(lap.clone());
                }
            }
        }
    }

    last
}
