/// Habit entity and related functionality
///
/// This module defines the core Habit struct that represents a recurring
/// behavior the user tracks, along with its draft form and validation rules.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{parse_days_of_week, DomainError, GoalType, HabitId, SchedulingType};

/// A habit represents something the user wants to do regularly
///
/// Each habit has a title, a scheduling rule governing which days it is due,
/// and a numeric goal for a single completion (e.g. "at least 30 minutes").
/// The id and both timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Store-assigned identifier, immutable for the habit's lifetime
    pub id: HabitId,
    /// Display name (e.g. "Morning Run")
    pub title: String,
    /// Free-form description, may be empty
    pub description: String,
    /// ARGB display color, opaque to core logic
    pub color: u32,
    /// Which calendar days the habit is due
    pub scheduling: SchedulingType,
    /// Times per week for `Weekly` scheduling, otherwise 1
    pub frequency: u32,
    /// Delimited weekday indices for `SpecificDays`, e.g. "1,3,5" (Mon=1)
    pub days_of_week: String,
    /// Comparison semantics for the goal
    pub goal_type: GoalType,
    /// Target value for one completion (e.g. 30.0 minutes)
    pub goal_target: f64,
    /// Creation time, epoch milliseconds
    pub created_at: i64,
    /// Last update time, epoch milliseconds; never precedes created_at
    pub last_modified: i64,
    /// Soft-delete flag; archived habits keep their history
    pub is_archived: bool,
}

/// A habit definition before the store has assigned id and timestamps
///
/// Defaults mirror a plain daily check-off habit: green, due every day,
/// goal "at least 1.0".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitDraft {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub scheduling: SchedulingType,
    pub frequency: u32,
    pub days_of_week: String,
    pub goal_type: GoalType,
    pub goal_target: f64,
}

impl Default for HabitDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            color: 0xFF4C_AF50,
            scheduling: SchedulingType::Daily,
            frequency: 1,
            days_of_week: String::new(),
            goal_type: GoalType::AtLeast,
            goal_target: 1.0,
        }
    }
}

impl HabitDraft {
    /// Draft for a simple daily check-off habit with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Validate the draft against all business rules
    ///
    /// The store calls this before insert, so invalid definitions never
    /// reach the database.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        validate_schedule(self.scheduling, self.frequency, &self.days_of_week)?;
        validate_goal_target(self.goal_target)?;
        Ok(())
    }
}

impl Habit {
    /// Reassemble a habit from already-persisted fields
    ///
    /// Used by the storage layer when loading rows; assumes the data passed
    /// validation when it was written.
    #[allow(clippy::too_many_arguments)]
    pub fn from_existing(
        id: HabitId,
        title: String,
        description: String,
        color: u32,
        scheduling: SchedulingType,
        frequency: u32,
        days_of_week: String,
        goal_type: GoalType,
        goal_target: f64,
        created_at: i64,
        last_modified: i64,
        is_archived: bool,
    ) -> Self {
        Self {
            id,
            title,
            description,
            color,
            scheduling,
            frequency,
            days_of_week,
            goal_type,
            goal_target,
            created_at,
            last_modified,
            is_archived,
        }
    }

    /// Validate the mutable fields, used before an update is persisted
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        validate_schedule(self.scheduling, self.frequency, &self.days_of_week)?;
        validate_goal_target(self.goal_target)?;
        if self.created_at > self.last_modified {
            return Err(DomainError::Validation {
                message: "last_modified cannot precede created_at".to_string(),
            });
        }
        Ok(())
    }

    /// Whether the schedule makes this habit due on the given calendar day
    ///
    /// `Weekly` habits are due any day; the weekly count is a rate target,
    /// not a day constraint.
    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        match self.scheduling {
            SchedulingType::Daily | SchedulingType::Weekly => true,
            SchedulingType::SpecificDays => {
                let weekday = date.weekday().number_from_monday() as u8;
                parse_days_of_week(&self.days_of_week)
                    .map(|days| days.contains(&weekday))
                    .unwrap_or(false)
            }
        }
    }
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidTitle(
            "Habit title cannot be empty".to_string(),
        ));
    }
    if trimmed.len() > 100 {
        return Err(DomainError::InvalidTitle(
            "Habit title cannot be longer than 100 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), DomainError> {
    if description.len() > 500 {
        return Err(DomainError::Validation {
            message: "Description cannot be longer than 500 characters".to_string(),
        });
    }
    Ok(())
}

fn validate_schedule(
    scheduling: SchedulingType,
    frequency: u32,
    days_of_week: &str,
) -> Result<(), DomainError> {
    match scheduling {
        SchedulingType::Daily => {}
        SchedulingType::Weekly => {
            if frequency == 0 || frequency > 7 {
                return Err(DomainError::InvalidScheduling(format!(
                    "Weekly frequency must be 1-7, got {}",
                    frequency
                )));
            }
        }
        SchedulingType::SpecificDays => {
            let days = parse_days_of_week(days_of_week)?;
            if days.is_empty() {
                return Err(DomainError::InvalidScheduling(
                    "Specific-days schedule must name at least one weekday".to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn validate_goal_target(goal_target: f64) -> Result<(), DomainError> {
    if !goal_target.is_finite() || goal_target <= 0.0 {
        return Err(DomainError::InvalidValue {
            message: "Goal target must be a positive number".to_string(),
        });
    }
    Ok(())
}
