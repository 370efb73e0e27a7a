//! Error types for the weightlog_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for weightlog_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected before any mutation took place.
    ///
    /// The message is user-facing and is surfaced verbatim.
    #[error("{0}")]
    Validation(String),

    /// No record exists for the given user id
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Command arguments could not be parsed
    #[error("{0}")]
    Parse(String),

    /// Storage collaborator failure (corrupt document, lock failure, ...)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for the conditions the engine reports as ordinary replies
    /// rather than failures.
    pub fn is_expected(&self) -> bool {
        matches!(self, Error::UserNotFound(_) | Error::Validation(_))
    }
}
