//! Result and error types for the core library

use std::path::Path;

use rust_decimal::Decimal;
use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Wrap an IO error, keeping the offending path in the message
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        Self::Io(format!("{}: {}", path.display(), err))
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// A single entity validation failure
///
/// Invariants are enforced identically for imported and manually entered
/// data; a `Vec<ValidationError>` of length zero means the entity is valid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Transaction must have at least one line item")]
    NoLineItems,

    #[error("Split amounts must add up to transaction amount: {split_total} != {amount}")]
    SplitSumMismatch { split_total: Decimal, amount: Decimal },

    #[error("{entity} name cannot be empty")]
    EmptyName { entity: &'static str },

    #[error("{field} is required for {class}-class entries")]
    MissingClassField {
        field: &'static str,
        class: &'static str,
    },
}

/// Join validation failures into one user-facing message
pub fn join_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sum_message_names_both_values() {
        let err = ValidationError::SplitSumMismatch {
            split_total: Decimal::new(-1001, 2),
            amount: Decimal::new(-2002, 2),
        };
        assert_eq!(
            err.to_string(),
            "Split amounts must add up to transaction amount: -10.01 != -20.02"
        );
    }

    #[test]
    fn test_io_error_includes_path() {
        let err = Error::io(
            Path::new("/tmp/missing.qif"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.to_string().contains("/tmp/missing.qif"));
    }
}
