//! Client for the face emotion classification service.
//!
//! The service accepts one PNG frame per request and answers with zero or
//! more face detections. [`HttpEmotionClassifier`] plugs into the live
//! pipeline through [`emoline_media::EmotionClassifier`].

pub mod client;
pub mod error;
pub mod types;

pub use client::{ClassifierConfig, HttpEmotionClassifier};
pub use error::{ClassifierError, ClassifierResult};
pub use types::{AnalyzeResponse, HealthResponse};
