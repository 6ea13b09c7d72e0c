//! Extraction outcome metrics.
//!
//! Recorded through the `metrics` facade. When `enable_metrics` is set, the Prometheus recorder
//! installed by `axum-prometheus` exposes them at `/internal/metrics`; otherwise no recorder is
//! installed and recording is a no-op.

use metrics::{counter, histogram};
use std::time::Duration;

pub const EXTRACTIONS_TOTAL: &str = "expense_ocr_extractions_total";
pub const EXTRACTION_DURATION_SECONDS: &str = "expense_ocr_extraction_duration_seconds";

/// Count one finished request, labelled `success` or with [`crate::errors::Error::outcome`].
pub fn record_extraction(outcome: &'static str) {
    counter!(EXTRACTIONS_TOTAL, "outcome" => outcome).increment(1);
}

/// Time spent in the provider calls for one request.
pub fn record_extraction_duration(outcome: &'static str, elapsed: Duration) {
    histogram!(EXTRACTION_DURATION_SECONDS, "outcome" => outcome).record(elapsed.as_secs_f64());
}
