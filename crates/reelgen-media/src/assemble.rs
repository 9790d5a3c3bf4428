//! Final video assembly.
//!
//! Stock clips are normalized to a common vertical format, concatenated,
//! looped to the narration length, and muxed with narration and burned-in
//! subtitles.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::get_duration;

/// Output format for assembled videos.
#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Longest stretch taken from any single clip
    pub max_clip_seconds: f64,
    pub crf: u8,
    pub preset: String,
    /// libass `force_style` for burned subtitles
    pub subtitle_style: String,
    /// Applied to every FFmpeg invocation
    pub timeout: Option<Duration>,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            max_clip_seconds: 5.0,
            crf: 23,
            preset: "veryfast".to_string(),
            subtitle_style: "Fontsize=18,PrimaryColour=&H00FFFF&,OutlineColour=&H000000&,BorderStyle=1,Outline=2,Alignment=2,MarginV=60"
                .to_string(),
            timeout: Some(Duration::from_secs(900)),
        }
    }
}

impl AssemblyOptions {
    fn runner(&self) -> FfmpegRunner {
        match self.timeout {
            Some(timeout) => FfmpegRunner::new().with_timeout(timeout),
            None => FfmpegRunner::new(),
        }
    }

    fn normalize_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},fps={fps},setsar=1",
            w = self.width,
            h = self.height,
            fps = self.fps
        )
    }
}

/// Assemble `clips`, `audio` and `subtitles` into `output`.
///
/// Clips that fail to normalize are skipped; at least one must survive.
pub async fn assemble_video(
    clips: &[PathBuf],
    audio: &Path,
    subtitles: &Path,
    output: &Path,
    options: &AssemblyOptions,
) -> MediaResult<()> {
    if clips.is_empty() {
        return Err(MediaError::invalid_input("No clips to assemble"));
    }

    let narration = get_duration(audio).await?;
    let work_dir = output.parent().unwrap_or_else(|| Path::new("."));
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string();

    let mut parts = Vec::with_capacity(clips.len());
    for (i, clip) in clips.iter().enumerate() {
        let part = work_dir.join(format!("{}_part{}.mp4", stem, i));
        let cmd = FfmpegCommand::new(&part)
            .input(clip)
            .duration(options.max_clip_seconds)
            .video_filter(options.normalize_filter())
            .no_audio()
            .video_codec("libx264")
            .preset(options.preset.clone())
            .crf(options.crf);

        match options.runner().run(&cmd).await {
            Ok(()) => parts.push(part),
            Err(e) => warn!("Skipping clip {}: {}", clip.display(), e),
        }
    }

    if parts.is_empty() {
        return Err(MediaError::InvalidVideo(
            "None of the clips could be normalized".to_string(),
        ));
    }

    let list_path = work_dir.join(format!("{}.concat.txt", stem));
    tokio::fs::write(&list_path, concat_list(&parts)).await?;

    let cmd = FfmpegCommand::new(output)
        .input_with(["-stream_loop", "-1", "-f", "concat", "-safe", "0"], &list_path)
        .input(audio)
        .map("0:v")
        .map("1:a")
        .video_filter(subtitle_filter(subtitles, &options.subtitle_style))
        .video_codec("libx264")
        .preset(options.preset.clone())
        .crf(options.crf)
        .audio_codec("aac")
        .audio_bitrate("192k")
        .duration(narration)
        .output_args(["-movflags", "+faststart"]);

    let result = options.runner().run(&cmd).await;

    let _ = tokio::fs::remove_file(&list_path).await;
    for part in &parts {
        let _ = tokio::fs::remove_file(part).await;
    }

    result?;
    info!(
        "Assembled {} ({} clips, {:.1}s narration)",
        output.display(),
        parts.len(),
        narration
    );

    Ok(())
}

/// Concatenate audio files without re-encoding.
pub async fn concat_audio(parts: &[PathBuf], output: &Path, timeout: Option<Duration>) -> MediaResult<()> {
    match parts {
        [] => Err(MediaError::invalid_input("No audio parts to concatenate")),
        [single] => {
            tokio::fs::copy(single, output).await?;
            Ok(())
        }
        _ => {
            let list_path = output.with_extension("concat.txt");
            tokio::fs::write(&list_path, concat_list(parts)).await?;

            let cmd = FfmpegCommand::new(output)
                .input_with(["-f", "concat", "-safe", "0"], &list_path)
                .output_args(["-c", "copy"]);

            let runner = match timeout {
                Some(timeout) => FfmpegRunner::new().with_timeout(timeout),
                None => FfmpegRunner::new(),
            };
            let result = runner.run(&cmd).await;
            let _ = tokio::fs::remove_file(&list_path).await;
            result
        }
    }
}

/// Body of an FFmpeg concat demuxer list.
fn concat_list(paths: &[PathBuf]) -> String {
    let mut body = String::new();
    for path in paths {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.clone());
        body.push_str("file '");
        body.push_str(&absolute.to_string_lossy().replace('\'', "'\\''"));
        body.push_str("'\n");
    }
    body
}

/// `subtitles=` filter with the path escaped for the filtergraph parser.
fn subtitle_filter(path: &Path, style: &str) -> String {
    let escaped = path
        .to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'");
    format!("subtitles='{}':force_style='{}'", escaped, style)
}
