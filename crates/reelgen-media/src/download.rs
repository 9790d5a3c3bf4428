//! Streamed HTTP download of stock footage.
//!
//! Files land in a working directory under a random name so that concurrent
//! downloads of the same URL never collide.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};

/// Extension used when the URL path does not carry one.
const DEFAULT_EXTENSION: &str = "mp4";

/// Per-request timeout for footage downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Downloads remote files into a fixed directory.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    dir: PathBuf,
}

impl Downloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, dir)
    }

    pub fn with_client(client: Client, dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Download `url` and return the local path.
    pub async fn download(&self, url: &str) -> MediaResult<PathBuf> {
        download_file(&self.client, url, &self.dir).await
    }
}

/// Download `url` into `dir` and return the local path.
pub async fn download_file(client: &Client, url: &str, dir: &Path) -> MediaResult<PathBuf> {
    let parsed = parse_download_url(url)?;
    let target = dir.join(format!("{}.{}", Uuid::new_v4(), extension_for(&parsed)));
    let partial = target.with_extension("part");

    fs::create_dir_all(dir).await?;

    debug!("Downloading {} to {}", url, target.display());

    let result = stream_to_file(client, parsed, &partial).await;
    if let Err(e) = result {
        let _ = fs::remove_file(&partial).await;
        return Err(e);
    }

    fs::rename(&partial, &target).await?;
    info!("Downloaded {}", target.display());

    Ok(target)
}

async fn stream_to_file(client: &Client, url: Url, path: &Path) -> MediaResult<u64> {
    let response = client.get(url.clone()).send().await?;

    if !response.status().is_success() {
        return Err(MediaError::download_failed(format!(
            "{} returned {}",
            url,
            response.status()
        )));
    }

    let mut file = fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if written == 0 {
        return Err(MediaError::download_failed(format!("{} returned an empty body", url)));
    }

    Ok(written)
}

fn parse_download_url(url: &str) -> MediaResult<Url> {
    let parsed = Url::parse(url)
        .map_err(|e| MediaError::invalid_input(format!("Invalid URL {}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(MediaError::invalid_input(format!(
            "Unsupported URL scheme: {}",
            scheme
        ))),
    }
}

fn extension_for(url: &Url) -> String {
    Path::new(url.path())
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
