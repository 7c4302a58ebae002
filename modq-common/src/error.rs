//! Common error types for modq

use thiserror::Error;

/// Common result type for modq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by store access, configuration and input validation.
///
/// Moderation outcomes (applied, failed vote, ...) are not errors; they are
/// recorded as a [`crate::db::ModificationStatus`] on the modification.
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

    /// Internal error, e.g. a stored row that cannot be decoded
    #[error("Internal error: {0}")]
    Internal(String),
}
