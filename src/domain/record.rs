/// HabitRecord entity for tracking habit completions
///
/// A record is one completion event for a habit on a specific calendar day.
/// Records are created and deleted by the toggle path, never mutated in place.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::day;
use crate::domain::{DomainError, Habit, HabitId};

/// One completion event for a habit on a specific calendar day
///
/// The timestamp is the epoch-millisecond local midnight of the day the
/// completion belongs to; it is always produced by `domain::day`, so reads
/// and deletes agree on day boundaries. At most one record exists per
/// (habit, day) - the store enforces that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitRecord {
    /// Owning habit
    pub habit_id: HabitId,
    /// Local start-of-day, epoch milliseconds
    pub timestamp: i64,
    /// Magnitude of the completion; 1.0 for a simple check-off
    pub value: f64,
    /// Optional free-text annotation
    pub note: Option<String>,
}

impl HabitRecord {
    /// Build a record for the given calendar day, normalizing the timestamp
    pub fn for_date(
        habit_id: HabitId,
        date: NaiveDate,
        value: f64,
        note: Option<String>,
    ) -> Result<Self, DomainError> {
        validate_value(value)?;
        validate_note(&note)?;
        Ok(Self {
            habit_id,
            timestamp: day::start_of_day_millis(date),
            value,
            note,
        })
    }

    /// Reassemble a record from already-persisted fields
    pub fn from_existing(habit_id: HabitId, timestamp: i64, value: f64, note: Option<String>) -> Self {
        Self {
            habit_id,
            timestamp,
            value,
            note,
        }
    }

    /// The local calendar date this completion belongs to
    pub fn date(&self) -> NaiveDate {
        day::date_of_millis(self.timestamp)
    }

    /// Whether this completion satisfies the owning habit's goal
    pub fn goal_met(&self, habit: &Habit) -> bool {
        habit.goal_type.is_met(self.value, habit.goal_target)
    }

    /// Whether the record carries a non-blank note
    pub fn has_note(&self) -> bool {
        self.note.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

fn validate_value(value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DomainError::InvalidValue {
            message: "Completion value must be a positive number".to_string(),
        });
    }
    Ok(())
}

fn validate_note(note: &Option<String>) -> Result<(), DomainError> {
    if let Some(text) = note {
        if text.len() > 500 {
            return Err(DomainError::InvalidValue {
                message: "Note cannot be longer than 500 characters".to_string(),
            });
        }
    }
    Ok(())
}
