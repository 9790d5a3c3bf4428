//! Pipeline run identity and stages.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a pipeline run.
///
/// Only used for log correlation; the progress record itself is not keyed by run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered stages of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Init,
    ScriptGeneration,
    FootageSearch,
    Downloading,
    AudioSynthesis,
    SubtitleGeneration,
    Assembly,
    Publish,
    Complete,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::ScriptGeneration => "script_generation",
            Stage::FootageSearch => "footage_search",
            Stage::Downloading => "downloading",
            Stage::AudioSynthesis => "audio_synthesis",
            Stage::SubtitleGeneration => "subtitle_generation",
            Stage::Assembly => "assembly",
            Stage::Publish => "publish",
            Stage::Complete => "complete",
        }
    }

    /// Progress step written when the stage is entered.
    ///
    /// Publish and Complete share the final step.
    pub fn step(&self) -> u32 {
        match self {
            Stage::Init => 0,
            Stage::ScriptGeneration => 1,
            Stage::FootageSearch => 2,
            Stage::Downloading => 3,
            Stage::AudioSynthesis => 4,
            Stage::SubtitleGeneration => 5,
            Stage::Assembly => 6,
            // Complete reports TOTAL_STEPS (100%), not the last label index.
            Stage::Publish | Stage::Complete => crate::TOTAL_STEPS,
        }
    }

    /// Message written to the progress record when the stage is entered.
    pub fn progress_message(&self) -> &'static str {
        match self {
            Stage::Init => "Starting...",
            Stage::ScriptGeneration => "Generating engaging script...",
            Stage::FootageSearch => "Finding relevant stock videos...",
            Stage::Downloading => "Downloading videos...",
            Stage::AudioSynthesis => "Creating text-to-speech audio...",
            Stage::SubtitleGeneration => "Generating synchronized subtitles...",
            Stage::Assembly => "Assembling final video...",
            Stage::Publish => "Uploading to YouTube...",
            Stage::Complete => "Video generation complete!",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Complete)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
