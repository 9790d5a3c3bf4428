//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; they are no-ops until a recorder
//! is installed by the binary.

use metrics::{counter, histogram};
use reelgen_models::{ErrorCode, Stage};

/// Metric names as constants for consistency.
pub mod names {
    pub const PIPELINE_RUNS_TOTAL: &str = "reelgen_pipeline_runs_total";
    pub const PIPELINE_DURATION_SECONDS: &str = "reelgen_pipeline_duration_seconds";
    pub const STAGE_DURATION_SECONDS: &str = "reelgen_stage_duration_seconds";
    pub const SCRIPT_ATTEMPTS_TOTAL: &str = "reelgen_script_attempts_total";
    pub const FOOTAGE_FALLBACK_TOTAL: &str = "reelgen_footage_fallback_total";
    pub const DOWNLOAD_FAILURES_TOTAL: &str = "reelgen_download_failures_total";
    pub const PUBLISH_TOTAL: &str = "reelgen_publish_total";
}

/// Record a finished run, successful when `error_code` is `None`.
pub fn record_run(error_code: Option<ErrorCode>, duration_secs: f64) {
    let outcome = if error_code.is_some() { "failure" } else { "success" };
    let labels = [
        ("outcome", outcome.to_string()),
        (
            "error_code",
            error_code.map(|c| c.as_str()).unwrap_or("none").to_string(),
        ),
    ];

    let outcome_label = [("outcome", outcome.to_string())];

    counter!(names::PIPELINE_RUNS_TOTAL, &labels).increment(1);
    histogram!(names::PIPELINE_DURATION_SECONDS, &outcome_label).record(duration_secs);
}

/// Record the time spent in one stage.
pub fn record_stage_duration(stage: Stage, duration_secs: f64) {
    let labels = [("stage", stage.as_str().to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record script generation attempts used by one run.
pub fn record_script_attempts(attempts: u32) {
    counter!(names::SCRIPT_ATTEMPTS_TOTAL).increment(attempts as u64);
}

/// Record that fallback search terms were needed.
pub fn record_footage_fallback() {
    counter!(names::FOOTAGE_FALLBACK_TOTAL).increment(1);
}

/// Record one failed footage download.
pub fn record_download_failure() {
    counter!(names::DOWNLOAD_FAILURES_TOTAL).increment(1);
}

/// Record a publish attempt.
pub fn record_publish(uploaded: bool) {
    let labels = [(
        "outcome",
        if uploaded { "uploaded" } else { "failed" }.to_string(),
    )];
    counter!(names::PUBLISH_TOTAL, &labels).increment(1);
}
