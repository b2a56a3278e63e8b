//! Error types for model construction and input parsing.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building or parsing timeline models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Malformed timestamp '{input}': {reason}")]
    MalformedTimestamp { input: String, reason: &'static str },

    #[error("Malformed input at {path}: {reason}")]
    MalformedInput { path: String, reason: String },

    #[error("Confidence {0} is outside the accepted range")]
    InvalidConfidence(f64),

    #[error("Invalid interval [{start}, {end})")]
    InvalidInterval { start: f64, end: f64 },

    #[error("Invalid classifier result: {0}")]
    InvalidClassification(String),
}

impl ModelError {
    /// Create a malformed timestamp error.
    pub fn malformed_timestamp(input: impl Into<String>, reason: &'static str) -> Self {
        Self::MalformedTimestamp {
            input: input.into(),
            reason,
        }
    }

    /// Create a malformed input error for a document path.
    pub fn malformed_input(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
