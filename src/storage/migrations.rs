/// Database migration management
///
/// This module handles creating and updating the SQLite database schema.
/// It ensures the database has all the required tables and indexes.

use rusqlite::Connection;

use crate::storage::StorageError;

/// Current database schema version
///
/// Increment this when you add new migrations
const CURRENT_VERSION: i32 = 1;

/// Initialize the database schema
///
/// This creates all required tables and indexes if they don't exist.
/// It also sets up the version tracking for future migrations.
pub fn initialize_database(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version = get_current_version(conn)?;

    if current_version < CURRENT_VERSION {
        run_migrations(conn, current_version)?;
        set_version(conn, CURRENT_VERSION)?;
    }

    Ok(())
}

/// Get the current database schema version
fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get::<_, i32>(0)
        })
        .unwrap_or(0); // No version record yet means a fresh database

    Ok(version)
}

/// Set the database schema version
fn set_version(conn: &Connection, version: i32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Run database migrations from the current version to the latest
fn run_migrations(conn: &Connection, from_version: i32) -> Result<(), StorageError> {
    if from_version < 1 {
        migration_v1(conn)?;
    }

    // Future migrations would go here:
    // if from_version < 2 {
    //     migration_v2(conn)?;
    // }

    Ok(())
}

/// Migration to version 1: Create initial tables
///
/// Habits are keyed by rowid (the store-assigned HabitId); records cascade
/// on habit delete and carry a uniqueness constraint per (habit, day).
fn migration_v1(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS habits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            color INTEGER NOT NULL DEFAULT 0,
            scheduling TEXT NOT NULL,
            frequency INTEGER NOT NULL DEFAULT 1,
            days_of_week TEXT NOT NULL DEFAULT '',
            goal_type TEXT NOT NULL,
            goal_target REAL NOT NULL DEFAULT 1.0,
            created_at INTEGER NOT NULL,
            last_modified INTEGER NOT NULL,
            is_archived INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS habit_records (
            habit_id INTEGER NOT NULL,
            timestamp INTEGER NOT NULL,
            value REAL NOT NULL DEFAULT 1.0,
            note TEXT,
            FOREIGN KEY (habit_id) REFERENCES habits (id) ON DELETE CASCADE
        )",
        [],
    )?;

    create_indexes_v1(conn)?;

    tracing::info!("Applied migration v1: created initial database schema");
    Ok(())
}

/// Create database indexes for version 1
fn create_indexes_v1(conn: &Connection) -> Result<(), StorageError> {
    // One record per (habit, day); the upsert path relies on this
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_habit_records_unique
         ON habit_records (habit_id, timestamp)",
        [],
    )?;

    // Range reads across all habits
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habit_records_timestamp
         ON habit_records (timestamp)",
        [],
    )?;

    // Active-habit listing
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habits_archived
         ON habits (is_archived)",
        [],
    )?;

    Ok(())
}
