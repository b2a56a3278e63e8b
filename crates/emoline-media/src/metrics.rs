//! Pipeline metrics.
//!
//! Counters go through the `metrics` facade and are no-ops until the binary
//! installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    // Live analysis
    pub const FRAMES_DECODED_TOTAL: &str = "emoline_frames_decoded_total";
    pub const FRAMES_SAMPLED_TOTAL: &str = "emoline_frames_sampled_total";
    pub const DETECTIONS_TOTAL: &str = "emoline_detections_total";
    pub const EMPTY_DETECTIONS_TOTAL: &str = "emoline_empty_detections_total";
    pub const CLASSIFIER_FAILURES_TOTAL: &str = "emoline_classifier_failures_total";

    // Rendering
    pub const RENDER_DURATION_SECONDS: &str = "emoline_render_duration_seconds";
    pub const OVERLAYS_RENDERED_TOTAL: &str = "emoline_overlays_rendered_total";
}

pub fn record_frame_decoded() {
    counter!(names::FRAMES_DECODED_TOTAL).increment(1);
}

pub fn record_frame_sampled() {
    counter!(names::FRAMES_SAMPLED_TOTAL).increment(1);
}

/// Record one classifier outcome: a detection, or no face found.
pub fn record_detection(found: bool) {
    if found {
        counter!(names::DETECTIONS_TOTAL).increment(1);
    } else {
        counter!(names::EMPTY_DETECTIONS_TOTAL).increment(1);
    }
}

pub fn record_classifier_failure(classifier: &'static str) {
    counter!(names::CLASSIFIER_FAILURES_TOTAL, "classifier" => classifier).increment(1);
}

pub fn record_render(duration_secs: f64, overlays: usize) {
    histogram!(names::RENDER_DURATION_SECONDS).record(duration_secs);
    counter!(names::OVERLAYS_RENDERED_TOTAL).increment(overlays as u64);
}
