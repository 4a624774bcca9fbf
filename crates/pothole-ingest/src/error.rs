//! Error types for the ingestion pipeline.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend failure not covered by a more specific variant.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The committer task has stopped; no further readings can be accepted.
    #[error("ingestion pipeline is closed")]
    PipelineClosed,
}

impl Error {
    /// Whether this error means a reading could not be durably recorded.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Sqlite(_) | Self::Io(_) | Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_failures_are_classified() {
        assert!(Error::Storage("disk full".into()).is_storage_failure());
        assert!(Error::Io(std::io::Error::other("boom")).is_storage_failure());
        assert!(!Error::PipelineClosed.is_storage_failure());
    }

    #[test]
    fn display_includes_detail() {
        let err = Error::Storage("backend unavailable".into());
        assert_eq!(err.to_string(), "Storage error: backend unavailable");
        assert_eq!(Error::PipelineClosed.to_string(), "ingestion pipeline is closed");
    }
}
