//! Pipeline error types.

use reelgen_models::ErrorCode;
use thiserror::Error;

pub type StepResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Script generation failed: {0}")]
    ScriptFailed(String),

    #[error("Search term generation failed: {0}")]
    SearchTermsFailed(String),

    #[error("Footage search failed: {0}")]
    FootageSearchFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Audio synthesis failed: {0}")]
    AudioFailed(String),

    #[error("Subtitle generation failed: {0}")]
    SubtitleFailed(String),

    #[error("Assembly failed: {0}")]
    AssemblyFailed(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Media error: {0}")]
    Media(#[from] reelgen_media::MediaError),

    #[error("Progress error: {0}")]
    Progress(#[from] reelgen_progress::ProgressError),

    /// Stored without its URL; request URLs can carry credentials
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn script_failed(msg: impl Into<String>) -> Self {
        Self::ScriptFailed(msg.into())
    }

    pub fn search_terms_failed(msg: impl Into<String>) -> Self {
        Self::SearchTermsFailed(msg.into())
    }

    pub fn footage_search_failed(msg: impl Into<String>) -> Self {
        Self::FootageSearchFailed(msg.into())
    }

    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    pub fn audio_failed(msg: impl Into<String>) -> Self {
        Self::AudioFailed(msg.into())
    }

    pub fn subtitle_failed(msg: impl Into<String>) -> Self {
        Self::SubtitleFailed(msg.into())
    }

    pub fn assembly_failed(msg: impl Into<String>) -> Self {
        Self::AssemblyFailed(msg.into())
    }

    pub fn publish_failed(msg: impl Into<String>) -> Self {
        Self::PublishFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Attribute an error raised by the speech collaborator to audio synthesis.
    pub fn into_audio(self) -> Self {
        match self {
            Self::AudioFailed(_) => self,
            other => Self::AudioFailed(other.to_string()),
        }
    }

    /// Attribute an error raised by the search-term collaborator to footage search.
    pub fn into_search_terms(self) -> Self {
        match self {
            Self::SearchTermsFailed(_) => self,
            other => Self::SearchTermsFailed(other.to_string()),
        }
    }

    /// Result code reported to the caller when this error ends a run.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            PipelineError::AudioFailed(_) => ErrorCode::AudioError,
            PipelineError::SearchTermsFailed(_) | PipelineError::FootageSearchFailed(_) => {
                ErrorCode::VideoSearchError
            }
            PipelineError::ScriptFailed(_) => ErrorCode::ScriptError,
            _ => ErrorCode::UnknownError,
        }
    }

    /// Whether the error message may be shown to the caller as-is.
    ///
    /// Unclassified faults are replaced with a generic message.
    pub fn is_classified(&self) -> bool {
        self.error_code() != ErrorCode::UnknownError
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}
