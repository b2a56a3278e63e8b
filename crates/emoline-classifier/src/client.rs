//! Classifier service HTTP client.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use emoline_media::{EmotionClassifier, MediaResult};
use emoline_models::{Classification, RasterFrame};

use crate::error::{ClassifierError, ClassifierResult};
use crate::types::{AnalyzeResponse, HealthResponse};

/// Configuration for the classifier client.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Base URL of the classifier service
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
    /// First retry delay; doubles on each attempt
    pub retry_base_delay: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl ClassifierConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("CLASSIFIER_URL").unwrap_or(defaults.base_url),
            timeout: std::env::var("CLASSIFIER_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: std::env::var("CLASSIFIER_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            retry_base_delay: defaults.retry_base_delay,
        }
    }
}

/// Emotion classifier backed by the HTTP service.
pub struct HttpEmotionClassifier {
    http: Client,
    config: ClassifierConfig,
}

impl HttpEmotionClassifier {
    /// Create a new client.
    pub fn new(config: ClassifierConfig) -> ClassifierResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClassifierError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClassifierResult<Self> {
        Self::new(ClassifierConfig::from_env())
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Check if the classifier service is healthy.
    pub async fn health_check(&self) -> ClassifierResult<bool> {
        let url = format!("{}/health", self.base_url());

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Classifier health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Classifier health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Classify one frame.
    ///
    /// Returns `None` when the service finds no face. A detection whose
    /// dominant label is not scored is [`ClassifierError::InvalidResponse`].
    pub async fn analyze_frame(&self, frame: &RasterFrame) -> ClassifierResult<Option<Classification>> {
        let url = format!("{}/analyze", self.base_url());
        let body = encode_png(frame)?;

        debug!(frame_idx = frame.index, bytes = body.len(), "Sending frame to {}", url);

        let response = self
            .with_retry(|| async {
                let response = self
                    .http
                    .post(&url)
                    .header(reqwest::header::CONTENT_TYPE, "image/png")
                    .body(body.clone())
                    .send()
                    .await
                    .map_err(|e| {
                        if e.is_timeout() {
                            ClassifierError::Timeout(self.config.timeout.as_secs())
                        } else {
                            ClassifierError::Network(e)
                        }
                    })?;

                if response.status().is_server_error() || response.status() == StatusCode::TOO_MANY_REQUESTS {
                    return Err(ClassifierError::ServiceUnavailable(format!(
                        "classifier returned {}",
                        response.status()
                    )));
                }
                Ok(response)
            })
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::RequestFailed(format!(
                "classifier returned {}: {}",
                status, body
            )));
        }

        let bytes = response.bytes().await?;
        let parsed: AnalyzeResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;

        match parsed.primary() {
            Some(classification) => {
                classification
                    .validate()
                    .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;
                Ok(Some(classification))
            }
            None => Ok(None),
        }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> ClassifierResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ClassifierResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_base_delay * 2u32.pow(attempt);
                    warn!(
                        "Classifier request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(ClassifierError::RequestFailed("Unknown error".to_string())))
    }
}

#[async_trait]
impl EmotionClassifier for HttpEmotionClassifier {
    async fn classify(&self, frame: &RasterFrame) -> MediaResult<Option<Classification>> {
        Ok(self.analyze_frame(frame).await?)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Encode an RGB24 frame as PNG.
fn encode_png(frame: &RasterFrame) -> ClassifierResult<Vec<u8>> {
    let img = RgbImage::from_raw(frame.width, frame.height, frame.data.clone()).ok_or_else(|| {
        ClassifierError::InvalidFrame(format!(
            "{} bytes do not fill a {}x{} RGB frame",
            frame.data.len(),
            frame.width,
            frame.height
        ))
    })?;

    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .map_err(|e| ClassifierError::InvalidFrame(e.to_string()))?;
    Ok(buf)
}
