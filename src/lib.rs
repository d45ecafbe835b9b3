/// Public library interface for the Tendensee habit-tracking core
///
/// This crate provides the persistence contract (habit and record stores),
/// the pure statistics engine (streaks, completion rate, strength), and the
/// `HabitService` facade that composes them behind observable reads. UI
/// rendering, notification scheduling, and charting live outside this crate
/// and call into it.

use thiserror::Error;

// Internal modules
mod domain;
mod service;
mod storage;

pub mod stats;

// Re-export public modules and types
pub use domain::*;
pub use service::{Change, HabitService};
pub use storage::{HabitStore, SqliteStore, StorageError};

/// Errors surfaced by the service facade
///
/// Storage failures propagate here rather than being masked; callers decide
/// how to present them.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Domain validation error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
