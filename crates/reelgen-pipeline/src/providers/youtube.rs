//! YouTube Data API upload.
//!
//! Uses the resumable protocol: a metadata request opens an upload session
//! whose `Location` receives the file in a single PUT.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Body, Client};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::collaborators::{PublishReceipt, Publisher};
use crate::error::{PipelineError, StepResult};

const UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";

const MAX_TITLE_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 5000;

/// "People & Blogs"
const DEFAULT_CATEGORY: &str = "22";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

#[derive(Clone)]
pub struct YouTubePublisher {
    access_token: String,
    client: Client,
    privacy_status: String,
}

impl YouTubePublisher {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            client: Client::new(),
            privacy_status: "private".to_string(),
        }
    }

    pub fn with_privacy_status(mut self, status: impl Into<String>) -> Self {
        self.privacy_status = status.into();
        self
    }

    fn metadata(&self, topic: &str, script: &str) -> serde_json::Value {
        json!({
            "snippet": {
                "title": truncate_chars(topic, MAX_TITLE_CHARS),
                "description": truncate_chars(script, MAX_DESCRIPTION_CHARS),
                "categoryId": DEFAULT_CATEGORY,
                "tags": tags_for(topic),
            },
            "status": {
                "privacyStatus": self.privacy_status,
                "selfDeclaredMadeForKids": false,
            }
        })
    }

    async fn open_session(&self, topic: &str, script: &str, size: u64) -> StepResult<String> {
        let response = self
            .client
            .post(UPLOAD_URL)
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", size)
            .json(&self.metadata(topic, script))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::publish_failed(format!(
                "Upload session rejected ({}): {}",
                status, body
            )));
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| PipelineError::publish_failed("Upload session has no location"))
    }
}

#[async_trait]
impl Publisher for YouTubePublisher {
    async fn publish(&self, video: &Path, topic: &str, script: &str) -> StepResult<PublishReceipt> {
        if self.access_token.is_empty() {
            return Err(PipelineError::publish_failed("YOUTUBE_ACCESS_TOKEN is not set"));
        }

        let size = tokio::fs::metadata(video).await?.len();
        let session = self.open_session(topic, script, size).await?;

        let file = tokio::fs::File::open(video).await?;
        let response = self
            .client
            .put(&session)
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header(CONTENT_TYPE, "video/mp4")
            .header(CONTENT_LENGTH, size)
            .body(Body::from(file))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::publish_failed(format!(
                "Upload failed ({}): {}",
                status, body
            )));
        }

        let uploaded: UploadResponse = response.json().await?;
        info!("Uploaded {} as YouTube video {}", video.display(), uploaded.id);

        Ok(PublishReceipt {
            url: Some(format!("https://www.youtube.com/watch?v={}", uploaded.id)),
            video_id: uploaded.id,
        })
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.trim().chars().take(max).collect()
}

fn tags_for(topic: &str) -> Vec<String> {
    let mut tags: Vec<String> = topic
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| w.len() > 2)
        .collect();
    let mut seen = HashSet::new();
    tags.retain(|t| seen.insert(t.clone()));
    tags.push("shorts".to_string());
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_limits() {
        let publisher = YouTubePublisher::new("token");
        let topic = "x".repeat(150);
        let meta = publisher.metadata(&topic, "A short script.");

        assert_eq!(meta["snippet"]["title"].as_str().unwrap().len(), 100);
        assert_eq!(meta["snippet"]["description"], "A short script.");
        assert_eq!(meta["status"]["privacyStatus"], "private");
    }

    #[test]
    fn test_tags() {
        assert_eq!(
            tags_for("Ocean conservation, ocean!"),
            vec!["ocean", "conservation", "shorts"]
        );
        assert_eq!(tags_for("AI is fun"), vec!["fun", "shorts"]);
    }

    #[tokio::test]
    async fn test_missing_token() {
        let err = YouTubePublisher::new("")
            .publish(Path::new("/nope.mp4"), "topic", "script")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::PublishFailed(_)));
    }
}
