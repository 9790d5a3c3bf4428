//! Concrete collaborator adapters.

pub mod gemini;
pub mod local;
pub mod pexels;
pub mod tiktok;
pub mod youtube;

use std::sync::Arc;

use reelgen_media::AssemblyOptions;
use tracing::warn;

pub use gemini::GeminiClient;
pub use local::{FfmpegAssembler, FfprobeMediaProbe, HttpFootageDownloader, SrtSubtitleGenerator};
pub use pexels::PexelsClient;
pub use tiktok::TikTokTts;
pub use youtube::YouTubePublisher;

use crate::collaborators::{Collaborators, Publisher};
use crate::config::PipelineConfig;

/// Wire the production collaborators from `config`.
///
/// Missing credentials are logged here and surface as classified failures
/// when a run reaches the collaborator that needs them.
pub fn build_collaborators(config: &PipelineConfig) -> Collaborators {
    for (name, value) in [
        ("GEMINI_API_KEY", &config.gemini_api_key),
        ("PEXELS_API_KEY", &config.pexels_api_key),
        ("TIKTOK_SESSION_ID", &config.tiktok_session_id),
    ] {
        if value.is_none() {
            warn!("{} is not set; generation requests will fail", name);
        }
    }

    let gemini = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone().unwrap_or_default(),
    ));

    let options = AssemblyOptions {
        max_clip_seconds: config.max_clip_seconds,
        timeout: Some(config.ffmpeg_timeout),
        ..Default::default()
    };

    let publisher = config
        .youtube_access_token
        .as_ref()
        .map(|token| Arc::new(YouTubePublisher::new(token.clone())) as Arc<dyn Publisher>);

    Collaborators {
        script: gemini.clone(),
        search_terms: gemini,
        footage: Arc::new(PexelsClient::new(
            config.pexels_api_key.clone().unwrap_or_default(),
        )),
        downloader: Arc::new(HttpFootageDownloader::new(&config.work_dir)),
        speech: Arc::new(
            TikTokTts::new(
                config.tiktok_session_id.clone().unwrap_or_default(),
                &config.work_dir,
            )
            .with_ffmpeg_timeout(config.ffmpeg_timeout),
        ),
        subtitles: Arc::new(SrtSubtitleGenerator),
        assembler: Arc::new(FfmpegAssembler::new(&config.work_dir, options)),
        publisher,
        probe: Arc::new(FfprobeMediaProbe),
    }
}
