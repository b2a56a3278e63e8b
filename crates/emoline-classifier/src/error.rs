//! Classifier client error types.

use thiserror::Error;

use emoline_media::MediaError;
use emoline_models::ModelError;

pub type ClassifierResult<T> = Result<T, ClassifierError>;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classifier service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Frame could not be encoded: {0}")]
    InvalidFrame(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClassifierError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClassifierError::ServiceUnavailable(_) | ClassifierError::Timeout(_) | ClassifierError::Network(_)
        )
    }
}

impl From<ClassifierError> for MediaError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::InvalidResponse(msg) => {
                MediaError::Model(ModelError::InvalidClassification(msg))
            }
            other => MediaError::classifier_unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ClassifierError::ServiceUnavailable("503".into()).is_retryable());
        assert!(ClassifierError::Timeout(5).is_retryable());
        assert!(!ClassifierError::RequestFailed("400".into()).is_retryable());
        assert!(!ClassifierError::InvalidResponse("bad".into()).is_retryable());
    }

    #[test]
    fn test_media_error_is_frame_recoverable() {
        let invalid: MediaError = ClassifierError::InvalidResponse("no score".into()).into();
        assert!(invalid.is_frame_recoverable());
        let down: MediaError = ClassifierError::ServiceUnavailable("down".into()).into();
        assert!(matches!(down, MediaError::ClassifierUnavailable(_)));
        assert!(down.is_frame_recoverable());
    }
}
