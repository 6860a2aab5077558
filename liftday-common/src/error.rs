//! Common error types for liftday
//!
//! Every failure here is scoped to a single requested operation; nothing
//! in this taxonomy terminates the process.

use thiserror::Error;
use uuid::Uuid;

/// Common result type for liftday operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types shared by the officiating engines and the HTTP surface
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Caller does not hold the role the operation requires
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The draw has already been run for this competition
    #[error("Draw already completed for competition {0}")]
    AlreadyDrawn(Uuid),

    /// Draw invoked before the competition's scheduled date
    #[error("Competition {competition_id} is scheduled for {scheduled}; the draw cannot run earlier")]
    NotDrawDay {
        competition_id: Uuid,
        scheduled: chrono::NaiveDate,
    },

    /// No verified athletes to draw
    #[error("No eligible athletes for competition {0}")]
    NoEligibleAthletes(Uuid),

    /// Another attempt is already open on this competition's platform
    #[error("Competition {0} already has an open attempt")]
    ConflictingOpenAttempt(Uuid),

    /// The attempt is closed (or otherwise not accepting this operation)
    #[error("Attempt {0} is not open")]
    AttemptNotOpen(Uuid),

    /// The same official already voted on this attempt in this role
    #[error("Official {judge_id} already voted on attempt {attempt_id}")]
    DuplicateVote { attempt_id: Uuid, judge_id: Uuid },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
