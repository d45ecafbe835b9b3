/// Streak and consistency statistics over completion records
///
/// Pure, storage-free functions over a slice of records already filtered to
/// one habit. Each statistic has an `_on` variant that takes the evaluation
/// date explicitly; the plain wrappers use the local calendar date. Outputs
/// depend only on inputs, never on call order.
///
/// Day-boundary policy: a streak is not broken until a full day has passed
/// uncompleted. The backward walk therefore starts at today when today is
/// completed, otherwise at yesterday; a streak ending yesterday still counts
/// in full.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

use crate::domain::day;
use crate::domain::HabitRecord;

/// Lookback window for the strength score, matching the "recent records"
/// window used by the rest of the system.
pub const STRENGTH_WINDOW_DAYS: u32 = 30;

/// Consecutive completed days ending at today (or yesterday, per the
/// day-boundary policy). 0 when neither today nor yesterday is completed.
pub fn current_streak(records: &[HabitRecord]) -> u32 {
    current_streak_on(records, day::today())
}

/// `current_streak` evaluated as of an explicit date
pub fn current_streak_on(records: &[HabitRecord], today: NaiveDate) -> u32 {
    let completed = completed_dates(records);
    if completed.is_empty() {
        return 0;
    }

    let mut cursor = if completed.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while completed.contains(&cursor) {
        streak += 1;
        cursor = cursor - Duration::days(1);
    }
    streak
}

/// Longest run of consecutive completed days anywhere in the history
pub fn best_streak(records: &[HabitRecord]) -> u32 {
    let completed = completed_dates(records);

    let mut best = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for date in completed {
        run = match previous {
            Some(prev) if date == prev + Duration::days(1) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(date);
    }
    best
}

/// Percentage (0.0-100.0) of days in the trailing window with a completion
///
/// The denominator is plain calendar days; a habit due only on some days is
/// still rated against the full window.
pub fn completion_rate(records: &[HabitRecord], window_days: u32) -> f64 {
    completion_rate_on(records, window_days, day::today())
}

/// `completion_rate` evaluated as of an explicit date
pub fn completion_rate_on(records: &[HabitRecord], window_days: u32, today: NaiveDate) -> f64 {
    if window_days == 0 {
        return 0.0;
    }
    let window_start = today - Duration::days(window_days as i64 - 1);
    let completed_in_window = completed_dates(records)
        .into_iter()
        .filter(|date| *date >= window_start && *date <= today)
        .count();

    completed_in_window as f64 / window_days as f64 * 100.0
}

/// Habit strength, 0-100
///
/// Formula: distinct completed days within the trailing 30-day window,
/// divided by 30 and scaled to 0-100, rounded to the nearest integer.
/// No recency weighting.
pub fn strength(records: &[HabitRecord]) -> u32 {
    strength_on(records, day::today())
}

/// `strength` evaluated as of an explicit date
pub fn strength_on(records: &[HabitRecord], today: NaiveDate) -> u32 {
    let rate = completion_rate_on(records, STRENGTH_WINDOW_DAYS, today);
    rate.round().clamp(0.0, 100.0) as u32
}

/// Distinct local calendar dates carrying at least one completion
fn completed_dates(records: &[HabitRecord]) -> BTreeSet<NaiveDate> {
    records.iter().map(|record| record.date()).collect()
}
