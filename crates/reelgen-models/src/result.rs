//! Result envelope returned by a generation run.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Duration reported when the assembled video cannot be probed.
pub const SENTINEL_DURATION: f64 = 0.0;

/// Resolution/size reported when the assembled video cannot be probed.
pub const SENTINEL_UNKNOWN: &str = "unknown";

const SUCCESS_MESSAGE: &str = "Video generated successfully!";

/// Failure classification surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Script or footage shortfall; the user can retry with another topic
    GenerationError,
    ScriptError,
    VideoSearchError,
    AudioError,
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::GenerationError => "GENERATION_ERROR",
            ErrorCode::ScriptError => "SCRIPT_ERROR",
            ErrorCode::VideoSearchError => "VIDEO_SEARCH_ERROR",
            ErrorCode::AudioError => "AUDIO_ERROR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// User-facing suggestions for this code.
    pub fn suggestions(&self) -> Vec<String> {
        suggestions_for(self.as_str())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed suggestion table keyed by error code, with a generic fallback.
pub fn suggestions_for(code: &str) -> Vec<String> {
    let entries: &[&str] = match code {
        "GENERATION_ERROR" => &[
            "Try a different topic or make it more specific",
            "Check your internet connection",
            "Ensure all API keys are configured correctly",
        ],
        "SCRIPT_ERROR" => &[
            "Try a simpler topic description",
            "Check if the script generation service is available",
            "Make sure your topic is in English",
        ],
        "VIDEO_SEARCH_ERROR" => &[
            "Try a different topic with more common keywords",
            "Check your Pexels API key",
            "Try again in a few minutes",
        ],
        "AUDIO_ERROR" => &[
            "Check your TikTok session ID",
            "Try a different voice option",
            "Ensure text is not too long",
        ],
        "UNKNOWN_ERROR" => &[
            "Try again in a few minutes",
            "Check your internet connection",
        ],
        _ => &["Try again later", "Contact support if the issue persists"],
    };

    entries.iter().map(|s| s.to_string()).collect()
}

/// Metadata of the assembled video. Each field degrades to a sentinel independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoMetadata {
    /// Duration in seconds
    pub duration: f64,
    /// "WIDTHxHEIGHT"
    pub resolution: String,
    /// Human readable, e.g. "12.3 MB"
    pub file_size: String,
}

impl Default for VideoMetadata {
    fn default() -> Self {
        Self {
            duration: SENTINEL_DURATION,
            resolution: SENTINEL_UNKNOWN.to_string(),
            file_size: SENTINEL_UNKNOWN.to_string(),
        }
    }
}

impl VideoMetadata {
    /// True when no field fell back to its sentinel.
    pub fn is_complete(&self) -> bool {
        self.duration > SENTINEL_DURATION
            && self.resolution != SENTINEL_UNKNOWN
            && self.file_size != SENTINEL_UNKNOWN
    }
}

/// Outcome of the optional publish stage.
///
/// A failed publish is reported alongside a successful result, never instead of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishOutcome {
    Uploaded {
        video_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    Failed {
        message: String,
    },
}

impl PublishOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, PublishOutcome::Uploaded { .. })
    }
}

/// Tagged outcome of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status")]
pub enum PipelineResult {
    #[serde(rename = "success")]
    Success {
        video_path: String,
        message: String,
        metadata: VideoMetadata,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        publish: Option<PublishOutcome>,
    },
    #[serde(rename = "error")]
    Failure {
        error_code: ErrorCode,
        message: String,
        suggestions: Vec<String>,
    },
}

impl PipelineResult {
    pub fn success(video_path: impl Into<String>, metadata: VideoMetadata) -> Self {
        Self::Success {
            video_path: video_path.into(),
            message: SUCCESS_MESSAGE.to_string(),
            metadata,
            publish: None,
        }
    }

    /// Build a failure whose suggestions come from the code's table entry.
    pub fn failure(error_code: ErrorCode, message: impl Into<String>) -> Self {
        let suggestions = error_code.suggestions();
        Self::Failure {
            error_code,
            message: message.into(),
            suggestions,
        }
    }

    /// Attach a publish outcome. No-op on failures.
    pub fn with_publish(mut self, outcome: PublishOutcome) -> Self {
        if let PipelineResult::Success { publish, .. } = &mut self {
            *publish = Some(outcome);
        }
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResult::Success { .. })
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            PipelineResult::Failure { error_code, .. } => Some(*error_code),
            PipelineResult::Success { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_code_has_suggestions() {
        let codes = [
            ErrorCode::GenerationError,
            ErrorCode::ScriptError,
            ErrorCode::VideoSearchError,
            ErrorCode::AudioError,
            ErrorCode::UnknownError,
        ];
        for code in codes {
            assert!(!code.suggestions().is_empty(), "{} has no suggestions", code);
        }
    }

    #[test]
    fn test_unmapped_code_uses_generic_fallback() {
        let suggestions = suggestions_for("QUOTA_ERROR");
        assert_eq!(
            suggestions,
            vec!["Try again later", "Contact support if the issue persists"]
        );
    }

    #[test]
    fn test_error_code_wire_format() {
        let json = serde_json::to_string(&ErrorCode::VideoSearchError).unwrap();
        assert_eq!(json, "\"VIDEO_SEARCH_ERROR\"");

        let parsed: ErrorCode = serde_json::from_str("\"AUDIO_ERROR\"").unwrap();
        assert_eq!(parsed, ErrorCode::AudioError);
    }

    #[test]
    fn test_failure_envelope() {
        let result = PipelineResult::failure(ErrorCode::GenerationError, "Failed to generate script");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["error_code"], "GENERATION_ERROR");
        assert_eq!(json["message"], "Failed to generate script");
        assert_eq!(json["suggestions"].as_array().unwrap().len(), 3);
        assert!(json.get("video_path").is_none());
    }

    #[test]
    fn test_success_envelope() {
        let metadata = VideoMetadata {
            duration: 31.5,
            resolution: "1080x1920".to_string(),
            file_size: "8.2 MB".to_string(),
        };
        let result = PipelineResult::success("temp/output.mp4", metadata);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["video_path"], "temp/output.mp4");
        assert_eq!(json["metadata"]["resolution"], "1080x1920");
        assert!(json.get("publish").is_none());
        assert!(json.get("error_code").is_none());
    }

    #[test]
    fn test_publish_outcome_only_attaches_to_success() {
        let failed = PipelineResult::failure(ErrorCode::AudioError, "tts down")
            .with_publish(PublishOutcome::Failed { message: "x".into() });
        assert!(matches!(failed, PipelineResult::Failure { .. }));

        let ok = PipelineResult::success("out.mp4", VideoMetadata::default())
            .with_publish(PublishOutcome::Failed { message: "quota".into() });
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["publish"]["status"], "failed");
        assert_eq!(json["publish"]["message"], "quota");
    }

    #[test]
    fn test_sentinel_metadata() {
        let metadata = VideoMetadata::default();
        assert_eq!(metadata.duration, SENTINEL_DURATION);
        assert_eq!(metadata.resolution, "unknown");
        assert!(!metadata.is_complete());
    }
}
