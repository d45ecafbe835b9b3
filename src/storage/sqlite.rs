/// SQLite implementation of the habit storage interface
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving habit data. It handles all SQL queries and the mapping
/// between rows and domain types.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, Row};

use crate::domain::{GoalType, Habit, HabitDraft, HabitId, HabitRecord, SchedulingType};
use crate::storage::{migrations, HabitStore, StorageError};

/// SQLite-based storage implementation
///
/// Holds an explicit connection handle and implements all the storage
/// operations defined by the `HabitStore` trait. Construct one at process
/// start and hand it to the service facade; nothing here is global.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at the given path and migrate it
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path.as_ref())
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
        let store = Self::from_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {:?}", db_path.as_ref());
        Ok(store)
    }

    /// In-memory database, used by tests and throwaway sessions
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON")
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;
        migrations::initialize_database(&conn)?;
        Ok(Self { conn })
    }

    fn habit_from_row(row: &Row<'_>) -> Result<Habit, rusqlite::Error> {
        let scheduling_str: String = row.get(4)?;
        let scheduling = SchedulingType::parse(&scheduling_str).map_err(|_| {
            rusqlite::Error::InvalidColumnType(4, "Invalid scheduling".to_string(), rusqlite::types::Type::Text)
        })?;

        let goal_type_str: String = row.get(7)?;
        let goal_type = GoalType::parse(&goal_type_str).map_err(|_| {
            rusqlite::Error::InvalidColumnType(7, "Invalid goal type".to_string(), rusqlite::types::Type::Text)
        })?;

        let color: i64 = row.get(3)?;

        Ok(Habit::from_existing(
            HabitId(row.get(0)?),
            row.get(1)?, // title
            row.get(2)?, // description
            color as u32,
            scheduling,
            row.get::<_, i64>(5)? as u32, // frequency
            row.get(6)?,                  // days_of_week
            goal_type,
            row.get(8)?,  // goal_target
            row.get(9)?,  // created_at
            row.get(10)?, // last_modified
            row.get(11)?, // is_archived
        ))
    }

    fn record_from_row(row: &Row<'_>) -> Result<HabitRecord, rusqlite::Error> {
        Ok(HabitRecord::from_existing(
            HabitId(row.get(0)?),
            row.get(1)?, // timestamp
            row.get(2)?, // value
            row.get(3)?, // note
        ))
    }

    fn habit_exists(&self, habit_id: HabitId) -> Result<bool, StorageError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM habits WHERE id = ?1",
                params![habit_id.raw()],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(found.is_some())
    }
}

const HABIT_COLUMNS: &str = "id, title, description, color, scheduling, frequency, days_of_week, \
                             goal_type, goal_target, created_at, last_modified, is_archived";
const RECORD_COLUMNS: &str = "habit_id, timestamp, value, note";

impl HabitStore for SqliteStore {
    fn create_habit(&self, draft: &HabitDraft) -> Result<HabitId, StorageError> {
        draft.validate()?;
        let now = Utc::now().timestamp_millis();

        self.conn.execute(
            "INSERT INTO habits (
                title, description, color, scheduling, frequency, days_of_week,
                goal_type, goal_target, created_at, last_modified, is_archived
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0)",
            params![
                draft.title,
                draft.description,
                draft.color as i64,
                draft.scheduling.as_str(),
                draft.frequency,
                draft.days_of_week,
                draft.goal_type.as_str(),
                draft.goal_target,
                now,
                now,
            ],
        )?;

        let id = HabitId(self.conn.last_insert_rowid());
        tracing::debug!("Created habit: {} ({})", draft.title, id);
        Ok(id)
    }

    fn get_habit(&self, habit_id: HabitId) -> Result<Option<Habit>, StorageError> {
        let sql = format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        match stmt.query_row(params![habit_id.raw()], Self::habit_from_row) {
            Ok(habit) => Ok(Some(habit)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        habit.validate()?;
        let now = Utc::now().timestamp_millis();

        let rows_affected = self.conn.execute(
            "UPDATE habits SET
                title = ?2,
                description = ?3,
                color = ?4,
                scheduling = ?5,
                frequency = ?6,
                days_of_week = ?7,
                goal_type = ?8,
                goal_target = ?9,
                last_modified = ?10,
                is_archived = ?11
             WHERE id = ?1",
            params![
                habit.id.raw(),
                habit.title,
                habit.description,
                habit.color as i64,
                habit.scheduling.as_str(),
                habit.frequency,
                habit.days_of_week,
                habit.goal_type.as_str(),
                habit.goal_target,
                now,
                habit.is_archived,
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound { habit_id: habit.id });
        }

        tracing::debug!("Updated habit: {} ({})", habit.title, habit.id);
        Ok(())
    }

    fn set_archived(&self, habit_id: HabitId, archived: bool) -> Result<(), StorageError> {
        let now = Utc::now().timestamp_millis();
        let rows_affected = self.conn.execute(
            "UPDATE habits SET is_archived = ?2, last_modified = ?3 WHERE id = ?1",
            params![habit_id.raw(), archived, now],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound { habit_id });
        }

        tracing::debug!("Set archived={} for habit {}", archived, habit_id);
        Ok(())
    }

    fn delete_habit(&self, habit_id: HabitId) -> Result<(), StorageError> {
        // Records go with the habit via ON DELETE CASCADE
        let rows_affected = self
            .conn
            .execute("DELETE FROM habits WHERE id = ?1", params![habit_id.raw()])?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound { habit_id });
        }

        tracing::debug!("Deleted habit {} and its records", habit_id);
        Ok(())
    }

    fn list_habits(&self, include_archived: bool) -> Result<Vec<Habit>, StorageError> {
        let mut sql = format!("SELECT {} FROM habits", HABIT_COLUMNS);
        if !include_archived {
            sql.push_str(" WHERE is_archived = 0");
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let habit_iter = stmt.query_map([], Self::habit_from_row)?;

        let mut habits = Vec::new();
        for habit in habit_iter {
            habits.push(habit?);
        }
        Ok(habits)
    }

    fn upsert_record(&self, record: &HabitRecord) -> Result<(), StorageError> {
        // Fail fast on a dangling habit id instead of leaning on the FK error
        if !self.habit_exists(record.habit_id)? {
            return Err(StorageError::UnknownHabit {
                habit_id: record.habit_id,
            });
        }

        self.conn.execute(
            "INSERT INTO habit_records (habit_id, timestamp, value, note)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (habit_id, timestamp)
             DO UPDATE SET value = excluded.value, note = excluded.note",
            params![
                record.habit_id.raw(),
                record.timestamp,
                record.value,
                record.note,
            ],
        )?;

        tracing::debug!(
            "Upserted record for habit {} at {}",
            record.habit_id,
            record.timestamp
        );
        Ok(())
    }

    fn delete_record(&self, habit_id: HabitId, timestamp: i64) -> Result<bool, StorageError> {
        let rows_affected = self.conn.execute(
            "DELETE FROM habit_records WHERE habit_id = ?1 AND timestamp = ?2",
            params![habit_id.raw(), timestamp],
        )?;

        if rows_affected > 0 {
            tracing::debug!("Deleted record for habit {} at {}", habit_id, timestamp);
        }
        Ok(rows_affected > 0)
    }

    fn records_in_range(&self, start: i64, end: i64) -> Result<Vec<HabitRecord>, StorageError> {
        let sql = format!(
            "SELECT {} FROM habit_records WHERE timestamp BETWEEN ?1 AND ?2 ORDER BY timestamp",
            RECORD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let record_iter = stmt.query_map(params![start, end], Self::record_from_row)?;

        let mut records = Vec::new();
        for record in record_iter {
            records.push(record?);
        }
        Ok(records)
    }

    fn records_in_range_for(
        &self,
        habit_id: HabitId,
        start: i64,
        end: i64,
    ) -> Result<Vec<HabitRecord>, StorageError> {
        let sql = format!(
            "SELECT {} FROM habit_records
             WHERE habit_id = ?1 AND timestamp BETWEEN ?2 AND ?3
             ORDER BY timestamp",
            RECORD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let record_iter = stmt.query_map(params![habit_id.raw(), start, end], Self::record_from_row)?;

        let mut records = Vec::new();
        for record in record_iter {
            records.push(record?);
        }
        Ok(records)
    }

    fn records_for_habit(&self, habit_id: HabitId) -> Result<Vec<HabitRecord>, StorageError> {
        let sql = format!(
            "SELECT {} FROM habit_records WHERE habit_id = ?1 ORDER BY timestamp",
            RECORD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let record_iter = stmt.query_map(params![habit_id.raw()], Self::record_from_row)?;

        let mut records = Vec::new();
        for record in record_iter {
            records.push(record?);
        }
        Ok(records)
    }
}
