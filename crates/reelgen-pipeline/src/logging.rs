//! Structured run logging.
//!
//! Every event carries the run id and operation so a single generation can
//! be followed through interleaved request logs.

use reelgen_models::{RunId, Stage};
use tracing::{error, info, warn, Span};

/// Logger bound to one pipeline run.
#[derive(Debug, Clone)]
pub struct JobLogger {
    run_id: String,
    operation: String,
}

impl JobLogger {
    pub fn new(run_id: &RunId, operation: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn from_string(run_id: &str, operation: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run started: {}", message
        );
    }

    /// Log entry into a pipeline stage.
    pub fn log_stage(&self, stage: Stage, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            stage = %stage,
            "Run progress: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run warning: {}", message
        );
    }

    pub fn log_error(&self, stage: Stage, message: &str) {
        error!(
            run_id = %self.run_id,
            operation = %self.operation,
            stage = %stage,
            "Run failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span for instrumenting the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "run",
            run_id = %self.run_id,
            operation = %self.operation
        )
    }
}
