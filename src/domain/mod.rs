/// Domain module containing core business logic and data types
///
/// This module defines the core entities (Habit, HabitRecord) and their
/// validation rules, plus the canonical calendar-day conversions shared by
/// every read and write path.

pub mod day;
pub mod habit;
pub mod record;
pub mod types;

// Re-export public types for easy access
pub use habit::*;
pub use record::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid habit title: {0}")]
    InvalidTitle(String),

    #[error("Invalid scheduling rule: {0}")]
    InvalidScheduling(String),

    #[error("Invalid goal: {0}")]
    InvalidGoal(String),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },
}
