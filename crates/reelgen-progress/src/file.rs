//! JSON file progress backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reelgen_models::ProgressRecord;
use tokio::fs;

use crate::backend::ProgressBackend;
use crate::error::{ProgressError, ProgressResult};

/// Stores the record as a JSON document at a fixed path.
///
/// Writes go to a sibling temp file and are renamed into place, so readers
/// never observe a half-written document.
#[derive(Debug, Clone)]
pub struct FileProgressBackend {
    path: PathBuf,
}

impl FileProgressBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ProgressBackend for FileProgressBackend {
    async fn write(&self, record: &ProgressRecord) -> ProgressResult<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| ProgressError::InvalidPath(self.path.clone()))?;
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }

        let payload = serde_json::to_vec(record)?;
        let temp = self.temp_path();
        fs::write(&temp, payload).await?;
        fs::rename(&temp, &self.path).await?;

        Ok(())
    }

    async fn read(&self) -> ProgressResult<Option<ProgressRecord>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileProgressBackend::new(dir.path().join("progress.json"));

        assert!(backend.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_creates_parent_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("progress.json");
        let backend = FileProgressBackend::new(&path);

        let record = ProgressRecord::new(4, Some("Creating text-to-speech audio..."), Utc::now());
        backend.write(&record).await.unwrap();

        assert!(path.exists());
        assert!(!backend.temp_path().exists());
        assert_eq!(backend.read().await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, b"{not json").unwrap();

        let backend = FileProgressBackend::new(&path);
        assert!(matches!(backend.read().await, Err(ProgressError::Json(_))));
    }
}
