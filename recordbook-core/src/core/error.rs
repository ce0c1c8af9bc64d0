//! Error types for the Recordbook core library.

use thiserror::Error;

/// All errors that can occur within the Recordbook core library.
#[derive(Debug, Error)]
pub enum RecordbookError {
    /// Raw input is missing a required field or carries a malformed value.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A record or tag ID was requested that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A tag was created whose generated ID collides with an existing tag.
    #[error("Duplicate ID: {0}")]
    Duplicate(String),

    /// A system tag was targeted by an update or delete.
    #[error("Immutable entity: {0}")]
    ImmutableEntity(String),

    /// A database file was opened that lacks the Recordbook tables.
    #[error("Invalid database: {0}")]
    InvalidDatabase(String),

    /// A SQLite operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record or settings data could not be (de)serialized as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing a CSV export failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience alias that pins the error type to [`RecordbookError`].
pub type Result<T> = std::result::Result<T, RecordbookError>;

impl RecordbookError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::NotFound(_) => "Record no longer exists".to_string(),
            Self::Duplicate(id) => format!("A tag with id '{id}' already exists"),
            Self::ImmutableEntity(_) => "System tags cannot be changed".to_string(),
            Self::InvalidDatabase(_) => "Not a valid Recordbook database".to_string(),
            Self::Storage(e) => format!("Failed to save: {e}"),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
            Self::Csv(e) => format!("Export error: {e}"),
        }
    }
}
