/// Storage layer for persisting habit data
///
/// This module handles all database operations using SQLite. It provides
/// a clean interface for storing and retrieving habits and completion
/// records. The store owns an explicit connection handle - there is no
/// process-wide database singleton.

pub mod migrations;
pub mod sqlite;

// Re-export the main storage types
pub use sqlite::*;

use thiserror::Error;

use crate::domain::{Habit, HabitDraft, HabitId, HabitRecord};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: HabitId },

    #[error("Record references unknown habit: {habit_id}")]
    UnknownHabit { habit_id: HabitId },

    #[error("Domain validation error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Trait defining the storage interface for habits and completion records
///
/// This trait allows swapping SQLite for another embedded database while
/// keeping the same interface. Record timestamps are local start-of-day
/// epoch milliseconds produced by `domain::day`.
pub trait HabitStore {
    /// Persist a new habit; the store assigns the id and stamps
    /// `created_at = last_modified = now`
    fn create_habit(&self, draft: &HabitDraft) -> Result<HabitId, StorageError>;

    /// Point lookup; an unknown id is `Ok(None)`, not an error
    fn get_habit(&self, habit_id: HabitId) -> Result<Option<Habit>, StorageError>;

    /// Persist changed fields of an existing habit, refreshing `last_modified`
    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Flip the soft-delete flag; archived habits keep their records
    fn set_archived(&self, habit_id: HabitId, archived: bool) -> Result<(), StorageError>;

    /// Hard delete; the habit's records are purged with it
    fn delete_habit(&self, habit_id: HabitId) -> Result<(), StorageError>;

    /// All habits in insertion order, optionally including archived ones
    fn list_habits(&self, include_archived: bool) -> Result<Vec<Habit>, StorageError>;

    /// Insert or replace the record for (habit, day)
    ///
    /// Uniqueness on (habit_id, timestamp) is enforced here, not by caller
    /// discipline: a second write for the same day replaces value and note.
    /// Fails with `UnknownHabit` when the habit does not exist.
    fn upsert_record(&self, record: &HabitRecord) -> Result<(), StorageError>;

    /// Delete the record at that exact timestamp; returns whether a row
    /// existed. Deleting a missing record is a no-op, not an error.
    fn delete_record(&self, habit_id: HabitId, timestamp: i64) -> Result<bool, StorageError>;

    /// Records across all habits with timestamps in `[start, end]`
    fn records_in_range(&self, start: i64, end: i64) -> Result<Vec<HabitRecord>, StorageError>;

    /// Per-habit variant of `records_in_range`
    fn records_in_range_for(
        &self,
        habit_id: HabitId,
        start: i64,
        end: i64,
    ) -> Result<Vec<HabitRecord>, StorageError>;

    /// Every record for one habit
    fn records_for_habit(&self, habit_id: HabitId) -> Result<Vec<HabitRecord>, StorageError>;
}
