/// Core types and enums used throughout the domain layer
///
/// This module defines the fundamental types like HabitId, SchedulingType and
/// GoalType that are used by Habit, HabitRecord, and other domain entities.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::DomainError;

/// Unique identifier for a habit
///
/// This is a wrapper around the store-assigned row id to provide type safety -
/// you can't accidentally pass an arbitrary integer where a habit id is expected.
/// Ids are assigned by the store on insert and are immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HabitId(pub i64);

impl HabitId {
    /// Raw integer value, for SQL parameters and display
    pub fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for HabitId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Which calendar days a habit is "due"
///
/// `Weekly` habits carry a times-per-week count in `Habit::frequency`;
/// `SpecificDays` habits carry a weekday set in `Habit::days_of_week`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulingType {
    /// Every single day
    Daily,
    /// A target number of completions per week (any days)
    Weekly,
    /// Only on specific weekdays (e.g. Mon/Wed/Fri)
    SpecificDays,
}

impl SchedulingType {
    /// Stable string form used by the storage layer
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulingType::Daily => "daily",
            SchedulingType::Weekly => "weekly",
            SchedulingType::SpecificDays => "specific_days",
        }
    }

    /// Parse the storage string form back into the enum
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "daily" => Ok(SchedulingType::Daily),
            "weekly" => Ok(SchedulingType::Weekly),
            "specific_days" => Ok(SchedulingType::SpecificDays),
            other => Err(DomainError::InvalidScheduling(format!(
                "Unknown scheduling type: {}",
                other
            ))),
        }
    }
}

/// Comparison semantics for a habit's numeric goal
///
/// The goal applies to a single completion's `value` (e.g. minutes read),
/// compared against `Habit::goal_target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalType {
    /// Completion value must reach the target or more
    AtLeast,
    /// Completion value must match the target exactly
    Exactly,
    /// Completion value must stay at or below the target
    AtMost,
}

impl GoalType {
    /// Stable string form used by the storage layer
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::AtLeast => "at_least",
            GoalType::Exactly => "exactly",
            GoalType::AtMost => "at_most",
        }
    }

    /// Parse the storage string form back into the enum
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "at_least" => Ok(GoalType::AtLeast),
            "exactly" => Ok(GoalType::Exactly),
            "at_most" => Ok(GoalType::AtMost),
            other => Err(DomainError::InvalidGoal(format!(
                "Unknown goal type: {}",
                other
            ))),
        }
    }

    /// Check a completion value against the target under these semantics
    pub fn is_met(&self, value: f64, target: f64) -> bool {
        match self {
            GoalType::AtLeast => value >= target,
            GoalType::Exactly => (value - target).abs() < f64::EPSILON,
            GoalType::AtMost => value <= target,
        }
    }
}

/// Parse a delimited weekday list like "1,3,5" (Mon=1 .. Sun=7)
///
/// This is the encoding the habits table uses for `SpecificDays` schedules.
/// Empty input yields an empty set; out-of-range or non-numeric entries
/// are rejected.
pub fn parse_days_of_week(encoded: &str) -> Result<BTreeSet<u8>, DomainError> {
    let mut days = BTreeSet::new();
    for part in encoded.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let day: u8 = part.parse().map_err(|_| {
            DomainError::InvalidScheduling(format!("Invalid weekday index: {}", part))
        })?;
        if !(1..=7).contains(&day) {
            return Err(DomainError::InvalidScheduling(format!(
                "Weekday index out of range 1-7: {}",
                day
            )));
        }
        days.insert(day);
    }
    Ok(days)
}
