//! Emotion classifier seam.

use async_trait::async_trait;
use emoline_models::{Classification, RasterFrame};

use crate::error::MediaResult;

/// Face emotion classifier.
///
/// Implementations return `Ok(None)` when no face is found in the frame.
/// Transport or service failures are [`MediaError::ClassifierUnavailable`],
/// which the live loop logs and skips.
///
/// [`MediaError::ClassifierUnavailable`]: crate::error::MediaError::ClassifierUnavailable
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Classify the dominant face in `frame`.
    async fn classify(&self, frame: &RasterFrame) -> MediaResult<Option<Classification>>;

    /// Classifier name for logging.
    fn name(&self) -> &'static str;
}
