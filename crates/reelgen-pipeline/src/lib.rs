//! Video generation pipeline.
//!
//! This crate provides:
//! - Collaborator contracts for script, footage, speech, subtitles, assembly and publishing
//! - Retry with an injectable sleeper
//! - The script, footage and download steps
//! - The orchestrator that sequences a run and reports progress
//! - Production adapters (Gemini, Pexels, TikTok TTS, YouTube, FFmpeg)

pub mod collaborators;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod providers;
pub mod retry;
pub mod steps;

pub use collaborators::{
    Collaborators, FootageDownloader, FootageSearch, MediaProbe, PublishReceipt, Publisher,
    ScriptGenerator, SearchTermGenerator, SpeechSynthesizer, SubtitleGenerator, VideoAssembler,
};
pub use config::{PipelineConfig, ProgressBackendKind};
pub use error::{PipelineError, StepResult};
pub use logging::JobLogger;
pub use orchestrator::{PipelineOrchestrator, UNEXPECTED_ERROR_MESSAGE};
pub use providers::build_collaborators;
pub use retry::{retry_async, RecordingSleeper, RetryPolicy, RetryResult, Sleeper, TokioSleeper};
pub use steps::{
    BatchDownloadStep, DownloadObserver, FootageAcquisitionStep, FootagePlan,
    ResilientScriptStep, ScriptOutcome,
};
