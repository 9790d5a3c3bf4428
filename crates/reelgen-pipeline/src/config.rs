//! Pipeline configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reelgen_progress::{
    FileProgressBackend, MemoryProgressBackend, ProgressStore, RedisProgressBackend,
    DEFAULT_PROGRESS_KEY,
};

use crate::error::{PipelineError, StepResult};
use crate::steps::FootagePlan;

/// Where the progress record is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressBackendKind {
    #[default]
    File,
    Redis,
    Memory,
}

impl FromStr for ProgressBackendKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(PipelineError::config_error(format!(
                "Unknown PROGRESS_BACKEND '{}', expected file, redis or memory",
                other
            ))),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory for downloads, narration, subtitles and final videos
    pub work_dir: PathBuf,
    pub script_max_attempts: u32,
    pub script_retry_backoff: Duration,
    /// Scripts must be longer than this after trimming
    pub script_min_chars: usize,
    pub footage: FootagePlan,
    /// Applied to every FFmpeg invocation
    pub ffmpeg_timeout: Duration,
    pub max_clip_seconds: f64,
    pub progress_backend: ProgressBackendKind,
    pub progress_file: PathBuf,
    pub redis_url: String,
    pub progress_redis_key: String,
    pub gemini_api_key: Option<String>,
    pub pexels_api_key: Option<String>,
    pub tiktok_session_id: Option<String>,
    pub youtube_access_token: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let work_dir = PathBuf::from("./temp");
        Self {
            progress_file: work_dir.join("progress.json"),
            work_dir,
            script_max_attempts: 3,
            script_retry_backoff: Duration::from_secs(2),
            script_min_chars: 50,
            footage: FootagePlan::default(),
            ffmpeg_timeout: Duration::from_secs(900),
            max_clip_seconds: 5.0,
            progress_backend: ProgressBackendKind::File,
            redis_url: "redis://localhost:6379".to_string(),
            progress_redis_key: DEFAULT_PROGRESS_KEY.to_string(),
            gemini_api_key: None,
            pexels_api_key: None,
            tiktok_session_id: None,
            youtube_access_token: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StepResult<Self> {
        let defaults = Self::default();

        let work_dir = std::env::var("REELGEN_WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.work_dir);

        let progress_backend = match std::env::var("PROGRESS_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => ProgressBackendKind::File,
        };

        let footage = FootagePlan {
            term_count: std::env::var("SEARCH_TERM_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.footage.term_count),
            ..defaults.footage
        };

        Ok(Self {
            progress_file: std::env::var("PROGRESS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| work_dir.join("progress.json")),
            work_dir,
            script_max_attempts: std::env::var("SCRIPT_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.script_max_attempts),
            script_retry_backoff: Duration::from_secs(
                std::env::var("SCRIPT_RETRY_BACKOFF_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            ),
            script_min_chars: std::env::var("SCRIPT_MIN_CHARS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.script_min_chars),
            footage,
            ffmpeg_timeout: Duration::from_secs(
                std::env::var("FFMPEG_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
            max_clip_seconds: std::env::var("MAX_CLIP_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|s: &f64| *s > 0.0)
                .unwrap_or(defaults.max_clip_seconds),
            progress_backend,
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            progress_redis_key: std::env::var("PROGRESS_REDIS_KEY")
                .unwrap_or(defaults.progress_redis_key),
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            pexels_api_key: non_empty_var("PEXELS_API_KEY"),
            tiktok_session_id: non_empty_var("TIKTOK_SESSION_ID"),
            youtube_access_token: non_empty_var("YOUTUBE_ACCESS_TOKEN"),
        })
    }

    /// Build the progress store selected by `progress_backend`.
    pub fn progress_store(&self) -> StepResult<ProgressStore> {
        let store = match self.progress_backend {
            ProgressBackendKind::File => {
                ProgressStore::new(Arc::new(FileProgressBackend::new(&self.progress_file)))
            }
            ProgressBackendKind::Redis => ProgressStore::new(Arc::new(RedisProgressBackend::new(
                &self.redis_url,
                self.progress_redis_key.clone(),
            )?)),
            ProgressBackendKind::Memory => ProgressStore::new(Arc::new(MemoryProgressBackend::new())),
        };
        Ok(store)
    }
}

/// Environment variable, treating empty values as unset.
pub fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.script_max_attempts, 3);
        assert_eq!(config.script_retry_backoff, Duration::from_secs(2));
        assert_eq!(config.footage.term_count, 5);
        assert_eq!(config.progress_file, PathBuf::from("./temp/progress.json"));
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("Redis".parse::<ProgressBackendKind>().unwrap(), ProgressBackendKind::Redis);
        assert_eq!(" memory ".parse::<ProgressBackendKind>().unwrap(), ProgressBackendKind::Memory);
        assert!("sqlite".parse::<ProgressBackendKind>().is_err());
    }

    #[tokio::test]
    async fn test_memory_progress_store() {
        let config = PipelineConfig {
            progress_backend: ProgressBackendKind::Memory,
            ..Default::default()
        };
        let store = config.progress_store().unwrap();
        store.update(2, None).await;
        assert_eq!(store.get().await.step, 2);
    }

    #[tokio::test]
    async fn test_file_progress_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            progress_file: dir.path().join("progress.json"),
            ..Default::default()
        };
        let store = config.progress_store().unwrap();
        store.update(1, Some("Generating engaging script...")).await;

        assert!(dir.path().join("progress.json").exists());
    }
}
