//! Database error types.

use thiserror::Error;

/// Errors that can occur during database operations.
///
/// [`NotFound`](DatabaseError::NotFound) and
/// [`AlreadyExists`](DatabaseError::AlreadyExists) are expected outcomes the
/// engine recovers from (vanished goals, duplicate registration); the rest
/// abort the current step.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx failure (connection, query, decoding).
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Schema migration failure.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A row that was expected to exist does not.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A uniquely-keyed row already exists.
    #[error("{entity} {id} already exists")]
    AlreadyExists { entity: &'static str, id: String },
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
