//! Collaborators backed by local tools: HTTP download, SRT writing, FFmpeg and FFprobe.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reelgen_media::{
    assemble_video, build_cues, file_size, get_duration, get_resolution, split_sentences,
    write_srt, AssemblyOptions, Downloader,
};
use tracing::info;
use uuid::Uuid;

use crate::collaborators::{
    FootageDownloader, MediaProbe, SubtitleGenerator, VideoAssembler,
};
use crate::error::{PipelineError, StepResult};

/// Streams footage into the work directory.
#[derive(Debug, Clone)]
pub struct HttpFootageDownloader {
    downloader: Downloader,
}

impl HttpFootageDownloader {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            downloader: Downloader::new(work_dir),
        }
    }
}

#[async_trait]
impl FootageDownloader for HttpFootageDownloader {
    async fn download(&self, url: &str) -> StepResult<PathBuf> {
        self.downloader
            .download(url)
            .await
            .map_err(|e| PipelineError::download_failed(e.to_string()))
    }
}

/// Writes SRT subtitles next to the narration, timed by sentence length.
#[derive(Debug, Clone, Default)]
pub struct SrtSubtitleGenerator;

#[async_trait]
impl SubtitleGenerator for SrtSubtitleGenerator {
    async fn generate_subtitles(&self, audio: &Path, script: &str) -> StepResult<PathBuf> {
        let duration = get_duration(audio)
            .await
            .map_err(|e| PipelineError::subtitle_failed(format!("Unreadable narration: {}", e)))?;

        let cues = build_cues(&split_sentences(script), duration)
            .map_err(|e| PipelineError::subtitle_failed(e.to_string()))?;

        let path = audio.with_extension("srt");
        write_srt(&path, &cues).await?;
        info!("Wrote {} subtitle cues to {}", cues.len(), path.display());

        Ok(path)
    }
}

/// Renders the final video with FFmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegAssembler {
    output_dir: PathBuf,
    options: AssemblyOptions,
}

impl FfmpegAssembler {
    pub fn new(output_dir: impl Into<PathBuf>, options: AssemblyOptions) -> Self {
        Self {
            output_dir: output_dir.into(),
            options,
        }
    }
}

#[async_trait]
impl VideoAssembler for FfmpegAssembler {
    async fn assemble(
        &self,
        videos: &[PathBuf],
        audio: &Path,
        subtitles: &Path,
    ) -> StepResult<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let output = self.output_dir.join(format!("{}.mp4", Uuid::new_v4()));

        assemble_video(videos, audio, subtitles, &output, &self.options)
            .await
            .map_err(|e| PipelineError::assembly_failed(e.to_string()))?;

        Ok(output)
    }
}

/// FFprobe for stream information, file metadata for size.
#[derive(Debug, Clone, Default)]
pub struct FfprobeMediaProbe;

#[async_trait]
impl MediaProbe for FfprobeMediaProbe {
    async fn duration(&self, path: &Path) -> StepResult<f64> {
        Ok(get_duration(path).await?)
    }

    async fn resolution(&self, path: &Path) -> StepResult<String> {
        Ok(get_resolution(path).await?)
    }

    async fn file_size(&self, path: &Path) -> StepResult<u64> {
        Ok(file_size(path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_download_error_is_download_failure() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = HttpFootageDownloader::new(dir.path());

        let err = downloader.download("ftp://example.com/a.mp4").await.unwrap_err();
        assert!(matches!(err, PipelineError::DownloadFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_narration_is_subtitle_failure() {
        let err = SrtSubtitleGenerator
            .generate_subtitles(Path::new("/missing/voice.mp3"), "Hello there.")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SubtitleFailed(_)));
    }

    #[tokio::test]
    async fn test_probe_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("final.mp4");
        std::fs::write(&path, vec![0u8; 4096]).unwrap();

        assert_eq!(FfprobeMediaProbe.file_size(&path).await.unwrap(), 4096);
        assert!(FfprobeMediaProbe.duration(&dir.path().join("nope.mp4")).await.is_err());
    }
}
