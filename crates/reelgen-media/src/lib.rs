//! FFmpeg CLI wrapper and media helpers for the reelgen pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with timeout-aware execution
//! - FFprobe metadata (duration, resolution) and human-readable file sizes
//! - Streamed HTTP download of stock footage
//! - SRT subtitle timing from a narration script
//! - Final vertical-video assembly and narration concatenation

pub mod assemble;
pub mod command;
pub mod download;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod subtitles;

pub use assemble::{assemble_video, concat_audio, AssemblyOptions};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use download::{download_file, Downloader};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{file_size, format_file_size};
pub use probe::{get_duration, get_resolution, probe_video, VideoInfo};
pub use subtitles::{build_cues, split_sentences, write_srt, SubtitleCue};
