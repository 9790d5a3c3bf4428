//! Sequential batch download tolerating individual failures.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reelgen_models::Stage;
use reelgen_progress::ProgressStore;
use tracing::{info, warn};

use crate::collaborators::FootageDownloader;
use crate::metrics;

/// Notified before each item of a batch is downloaded.
#[async_trait]
pub trait DownloadObserver: Send + Sync {
    /// `position` is 1-based.
    async fn on_item(&self, position: usize, total: usize, message: &str);
}

#[async_trait]
impl DownloadObserver for ProgressStore {
    async fn on_item(&self, _position: usize, _total: usize, message: &str) {
        self.update(Stage::Downloading.step(), Some(message)).await;
    }
}

/// Observer that ignores every notification.
#[async_trait]
impl DownloadObserver for () {
    async fn on_item(&self, _position: usize, _total: usize, _message: &str) {}
}

#[derive(Clone)]
pub struct BatchDownloadStep {
    downloader: Arc<dyn FootageDownloader>,
}

impl BatchDownloadStep {
    pub fn new(downloader: Arc<dyn FootageDownloader>) -> Self {
        Self { downloader }
    }

    /// Download every reference in order, returning the paths that succeeded.
    pub async fn download_all(
        &self,
        references: &[String],
        observer: &dyn DownloadObserver,
    ) -> Vec<PathBuf> {
        let total = references.len();
        let mut paths = Vec::with_capacity(total);

        for (i, url) in references.iter().enumerate() {
            let position = i + 1;
            let message = format!("Downloading video {}/{}...", position, total);
            observer.on_item(position, total, &message).await;

            match self.downloader.download(url).await {
                Ok(path) => paths.push(path),
                Err(e) => {
                    warn!("Failed to download video {}/{} ({}): {}", position, total, url, e);
                    metrics::record_download_failure();
                }
            }
        }

        info!("Downloaded {}/{} videos", paths.len(), total);
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, StepResult};
    use std::sync::Mutex;

    struct FlakyDownloader {
        failing: Vec<String>,
    }

    #[async_trait]
    impl FootageDownloader for FlakyDownloader {
        async fn download(&self, url: &str) -> StepResult<PathBuf> {
            if self.failing.iter().any(|f| f == url) {
                Err(PipelineError::download_failed("connection reset"))
            } else {
                Ok(PathBuf::from(format!("/work/{}.mp4", url)))
            }
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<(usize, usize, String)>>,
    }

    #[async_trait]
    impl DownloadObserver for RecordingObserver {
        async fn on_item(&self, position: usize, total: usize, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push((position, total, message.to_string()));
        }
    }

    fn refs(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("v{}", i)).collect()
    }

    #[tokio::test]
    async fn test_failed_item_is_skipped() {
        let step = BatchDownloadStep::new(Arc::new(FlakyDownloader {
            failing: vec!["v3".to_string()],
        }));
        let observer = RecordingObserver::default();

        let paths = step.download_all(&refs(5), &observer).await;

        assert_eq!(paths.len(), 4);
        assert!(!paths.contains(&PathBuf::from("/work/v3.mp4")));

        let events = observer.events.lock().unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], (1, 5, "Downloading video 1/5...".to_string()));
        assert_eq!(events[4].2, "Downloading video 5/5...");
    }

    #[tokio::test]
    async fn test_all_failures_return_empty() {
        let step = BatchDownloadStep::new(Arc::new(FlakyDownloader { failing: refs(2) }));

        let paths = step.download_all(&refs(2), &()).await;
        assert!(paths.is_empty());
    }

    #[tokio::test]
    async fn test_progress_store_receives_item_messages() {
        let store = ProgressStore::in_memory();
        let step = BatchDownloadStep::new(Arc::new(FlakyDownloader { failing: vec![] }));

        step.download_all(&refs(3), &store).await;

        let record = store.get().await;
        assert_eq!(record.step, 3);
        assert_eq!(record.message, "Downloading video 3/3...");
    }
}
