//! Contracts for the external services a pipeline run depends on.
//!
//! The orchestrator and steps only see these traits. Concrete adapters live
//! in [`crate::providers`]; tests substitute in-memory fakes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StepResult;

/// Produces a narration script for a topic.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate_script(&self, topic: &str) -> StepResult<String>;
}

/// Expands a topic and its script into stock-footage search terms.
#[async_trait]
pub trait SearchTermGenerator: Send + Sync {
    async fn search_terms(&self, topic: &str, count: usize, script: &str)
        -> StepResult<Vec<String>>;
}

/// Searches a stock-footage library, returning downloadable URLs.
#[async_trait]
pub trait FootageSearch: Send + Sync {
    async fn search(&self, term: &str, per_page: u32, min_duration: u32)
        -> StepResult<Vec<String>>;
}

/// Fetches one footage reference to a local file.
#[async_trait]
pub trait FootageDownloader: Send + Sync {
    async fn download(&self, url: &str) -> StepResult<PathBuf>;
}

/// Text-to-speech.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, script: &str, voice: &str) -> StepResult<PathBuf>;
}

#[async_trait]
pub trait SubtitleGenerator: Send + Sync {
    async fn generate_subtitles(&self, audio: &Path, script: &str) -> StepResult<PathBuf>;
}

/// Muxes footage, narration and subtitles into the final video.
#[async_trait]
pub trait VideoAssembler: Send + Sync {
    async fn assemble(
        &self,
        videos: &[PathBuf],
        audio: &Path,
        subtitles: &Path,
    ) -> StepResult<PathBuf>;
}

/// Receipt returned by a successful publish.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReceipt {
    pub video_id: String,
    pub url: Option<String>,
}

/// Uploads the finished video to a hosting platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, video: &Path, topic: &str, script: &str) -> StepResult<PublishReceipt>;
}

/// Metadata probes for the finished video.
///
/// Each probe is independent so one failure does not hide the others.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn duration(&self, path: &Path) -> StepResult<f64>;
    async fn resolution(&self, path: &Path) -> StepResult<String>;
    async fn file_size(&self, path: &Path) -> StepResult<u64>;
}

/// Full set of collaborators for one orchestrator.
#[derive(Clone)]
pub struct Collaborators {
    pub script: Arc<dyn ScriptGenerator>,
    pub search_terms: Arc<dyn SearchTermGenerator>,
    pub footage: Arc<dyn FootageSearch>,
    pub downloader: Arc<dyn FootageDownloader>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub subtitles: Arc<dyn SubtitleGenerator>,
    pub assembler: Arc<dyn VideoAssembler>,
    /// `None` when no publishing credentials are configured
    pub publisher: Option<Arc<dyn Publisher>>,
    pub probe: Arc<dyn MediaProbe>,
}
