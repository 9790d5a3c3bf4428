//! Pexels stock video search.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::collaborators::FootageSearch;
use crate::error::{PipelineError, StepResult};

const API_BASE: &str = "https://api.pexels.com";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    #[serde(default)]
    duration: u32,
    #[serde(default)]
    video_files: Vec<VideoFile>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    link: String,
    width: Option<u32>,
    height: Option<u32>,
}

impl VideoFile {
    fn pixels(&self) -> u64 {
        self.width.unwrap_or(0) as u64 * self.height.unwrap_or(0) as u64
    }
}

#[derive(Clone)]
pub struct PexelsClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl PexelsClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            base_url: API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl FootageSearch for PexelsClient {
    async fn search(&self, term: &str, per_page: u32, min_duration: u32) -> StepResult<Vec<String>> {
        if self.api_key.is_empty() {
            return Err(PipelineError::footage_search_failed("PEXELS_API_KEY is not set"));
        }

        let url = format!(
            "{}/videos/search?query={}&per_page={}",
            self.base_url,
            urlencoding::encode(term),
            per_page
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::footage_search_failed(format!(
                "Pexels returned {} for '{}'",
                response.status(),
                term
            )));
        }

        let body: SearchResponse = response.json().await?;
        let urls = select_renditions(body, min_duration);
        debug!("Pexels returned {} usable videos for '{}'", urls.len(), term);

        Ok(urls)
    }
}

/// Largest rendition of every video lasting at least `min_duration` seconds.
fn select_renditions(response: SearchResponse, min_duration: u32) -> Vec<String> {
    response
        .videos
        .into_iter()
        .filter(|v| v.duration >= min_duration)
        .filter_map(|v| {
            v.video_files
                .into_iter()
                .max_by_key(VideoFile::pixels)
                .map(|f| f.link)
        })
        .collect()
}
