//! Inbound generation request.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Voice used when the request does not name one.
pub const DEFAULT_VOICE: &str = "en_us_001";

/// Maximum accepted subject length, in characters.
pub const MAX_SUBJECT_LENGTH: usize = 500;

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Topic the video is about
    pub video_subject: String,

    /// TTS voice identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Publish the finished video
    #[serde(default)]
    pub automate_youtube_upload: bool,
}

impl GenerateRequest {
    pub fn new(video_subject: impl Into<String>) -> Self {
        Self {
            video_subject: video_subject.into(),
            voice: None,
            automate_youtube_upload: false,
        }
    }

    /// Voice to synthesize with, falling back to [`DEFAULT_VOICE`].
    pub fn voice(&self) -> &str {
        self.voice
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_VOICE)
    }

    /// Subject with control characters removed and surrounding whitespace trimmed.
    pub fn subject(&self) -> String {
        self.video_subject
            .chars()
            .filter(|c| !c.is_control())
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        let subject = self.subject();

        if subject.is_empty() {
            return Err("videoSubject must not be empty".to_string());
        }

        if subject.chars().count() > MAX_SUBJECT_LENGTH {
            return Err(format!(
                "videoSubject must be at most {} characters",
                MAX_SUBJECT_LENGTH
            ));
        }

        Ok(())
    }
}
