//! Error types for scheduling, sessions and persistence.

use thiserror::Error;

/// Failures of the rating transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("invalid rating {0}: expected a value from 1 to 4")]
    InvalidRating(u8),
}

/// A scheduling field that was out of range when an item was loaded and
/// has been clamped back into range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorruptSchedulingState {
    #[error("item {id}: interval of {found} days is below 1, clamped to 1")]
    IntervalBelowOne { id: String, found: i64 },

    #[error("item {id}: repetition count {found} is negative, reset to 0")]
    NegativeRepetitions { id: String, found: i64 },

    #[error("item {id}: {field} of {found} is above 4294967295, clamped to it")]
    ValueTooLarge {
        id: String,
        field: &'static str,
        found: i64,
    },

    #[error("item {id}: ease factor {found} is outside [1.3, 3.0], clamped to {clamped}")]
    EaseOutOfRange { id: String, found: f64, clamped: f64 },
}

/// Misuse of a learning session by its driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("the answer has to be revealed before the item can be rated")]
    AnswerNotRevealed,

    #[error("the session has no items left")]
    Completed,

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Item not found: {0}")]
    NotFound(String),
}
