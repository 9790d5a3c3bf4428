//! Shared data models for the reelgen pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Pipeline runs and stages
//! - The single progress record
//! - The success/failure result envelope and error codes
//! - HTTP request and health payloads

pub mod health;
pub mod progress;
pub mod request;
pub mod result;
pub mod run;

// Re-export common types
pub use health::{HealthResponse, ServiceFlags};
pub use progress::{ProgressRecord, STEP_LABELS, TOTAL_STEPS};
pub use request::{GenerateRequest, DEFAULT_VOICE, MAX_SUBJECT_LENGTH};
pub use result::{
    suggestions_for, ErrorCode, PipelineResult, PublishOutcome, VideoMetadata, SENTINEL_DURATION,
    SENTINEL_UNKNOWN,
};
pub use run::{RunId, Stage};
