/// Canonical calendar-day conversions
///
/// Record timestamps identify a local calendar day as epoch milliseconds of
/// that day's local midnight. Every write and read path must go through these
/// helpers; a toggle that normalizes on write but not on delete silently
/// no-ops, so there is exactly one conversion in the crate.

use chrono::{Duration, Local, NaiveDate, TimeZone};

/// Epoch milliseconds of local midnight for the given calendar date
///
/// DST gaps are resolved towards the earliest valid instant, which keeps the
/// mapping total and deterministic for any date SQLite can hold.
pub fn start_of_day_millis(date: NaiveDate) -> i64 {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    match Local.from_local_datetime(&midnight) {
        chrono::LocalResult::Single(dt) => dt.timestamp_millis(),
        chrono::LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
        // Midnight skipped by a DST transition: take the first valid instant
        chrono::LocalResult::None => {
            let later = midnight + Duration::hours(1);
            Local
                .from_local_datetime(&later)
                .earliest()
                .map(|dt| dt.timestamp_millis())
                .unwrap_or_default()
        }
    }
}

/// The local calendar date a record timestamp belongs to
pub fn date_of_millis(timestamp: i64) -> NaiveDate {
    match Local.timestamp_millis_opt(timestamp) {
        chrono::LocalResult::Single(dt) => dt.date_naive(),
        chrono::LocalResult::Ambiguous(earliest, _) => earliest.date_naive(),
        chrono::LocalResult::None => Local::now().date_naive(),
    }
}

/// Inclusive millisecond bounds covering one local calendar day
pub fn day_range_millis(date: NaiveDate) -> (i64, i64) {
    let start = start_of_day_millis(date);
    let end = start_of_day_millis(date + Duration::days(1)) - 1;
    (start, end)
}

/// Today's local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let millis = start_of_day_millis(date);
        assert_eq!(date_of_millis(millis), date);
    }

    #[test]
    fn test_day_range_covers_whole_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, end) = day_range_millis(date);
        assert!(end > start);
        assert_eq!(date_of_millis(start), date);
        assert_eq!(date_of_millis(end), date);
        // One past the end lands on the next day
        assert_eq!(date_of_millis(end + 1), date + Duration::days(1));
    }

    #[test]
    fn test_consecutive_days_are_distinct() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let next = date + Duration::days(1);
        assert_ne!(start_of_day_millis(date), start_of_day_millis(next));
    }
}
