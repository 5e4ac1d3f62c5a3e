//! Error types for lectern.

use thiserror::Error;

/// Errors that can occur while handling an intake request.
#[derive(Error, Debug)]
pub enum LecternError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Could not create event '{id}': {reason}")]
    EventCreation { id: String, reason: String },

    #[error("Relay error: {0}")]
    Relay(String),

    #[error("Announcement error: {0}")]
    Announcement(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for lectern operations.
pub type LecternResult<T> = Result<T, LecternError>;
