//! Error types shared by the pothole telemetry crates.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while interpreting telemetry input.
#[derive(Error, Debug)]
pub enum Error {
    /// A telemetry field could not be interpreted as the expected number.
    ///
    /// Never surfaced to submitters: the pipeline replaces the field with
    /// zero and only records the reason.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        /// The name of the invalid field (as submitted, e.g. `roadScore`).
        field: &'static str,
        /// Description of what's wrong.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_field_display() {
        let err = Error::InvalidField {
            field: "severity",
            reason: "not an integer: \"oops\"".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("severity"));
        assert!(msg.contains("oops"));
        assert!(msg.starts_with("invalid field"));
    }
}
