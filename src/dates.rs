//! Resolution of a requested date range against the store's inventory.

use chrono::NaiveDate;

/// Returns the subsequence of `available` falling inside `[start, end]`,
/// both bounds inclusive, preserving the store's ordering.
///
/// The store lists snapshots in ascending date order, so scanning stops at
/// the first date past `end`.
pub fn resolve_dates(available: &[NaiveDate], start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut in_range = Vec::new();
    for &date in available {
        if date < start {
            continue;
        }
        if date > end {
            break;
        }
        in_range.push(date);
    }
    in_range
}
