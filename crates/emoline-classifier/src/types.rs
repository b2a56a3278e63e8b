//! Classifier service request/response types.

use serde::{Deserialize, Serialize};

use emoline_models::Classification;

/// Response from `POST /analyze`.
///
/// An empty `detections` list means no face was found.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub detections: Vec<Classification>,
}

impl AnalyzeResponse {
    /// The detection used for the frame. Extra faces are ignored.
    pub fn primary(self) -> Option<Classification> {
        self.detections.into_iter().next()
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub model: Option<String>,
}
