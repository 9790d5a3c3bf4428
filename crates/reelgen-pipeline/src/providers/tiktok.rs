//! TikTok text-to-speech.
//!
//! The endpoint accepts at most a few hundred characters per call, so the
//! script is split into chunks whose MP3 parts are joined with FFmpeg.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reelgen_media::concat_audio;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::collaborators::SpeechSynthesizer;
use crate::error::{PipelineError, StepResult};

const API_BASE: &str = "https://api16-normal-v6.tiktokv.com/media/api/text/speech/invoke/";
const USER_AGENT: &str =
    "com.zhiliaoapp.musically/2022600030 (Linux; U; Android 7.1.2; es_ES; SM-G988N; Build/NRD90M;tt-ok/3.12.13.1)";

/// Longest text sent in one request.
pub const MAX_CHUNK_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
struct TtsResponse {
    status_code: i64,
    #[serde(default)]
    status_msg: String,
    data: Option<TtsData>,
}

#[derive(Debug, Deserialize)]
struct TtsData {
    #[serde(default)]
    v_str: String,
}

#[derive(Clone)]
pub struct TikTokTts {
    session_id: String,
    client: Client,
    work_dir: PathBuf,
    ffmpeg_timeout: Option<Duration>,
}

impl TikTokTts {
    pub fn new(session_id: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_id: session_id.into(),
            client: Client::new(),
            work_dir: work_dir.into(),
            ffmpeg_timeout: None,
        }
    }

    pub fn with_ffmpeg_timeout(mut self, timeout: Duration) -> Self {
        self.ffmpeg_timeout = Some(timeout);
        self
    }

    async fn synthesize_chunk(&self, text: &str, voice: &str) -> StepResult<Vec<u8>> {
        let url = format!(
            "{}?text_speaker={}&req_text={}&speaker_map_type=0&aid=1233",
            API_BASE,
            urlencoding::encode(voice),
            urlencoding::encode(&prepare_text(text))
        );

        let response = self
            .client
            .post(&url)
            .header("User-Agent", USER_AGENT)
            .header("Cookie", format!("sessionid={}", self.session_id))
            .send()
            .await
            .map_err(|e| PipelineError::audio_failed(format!("TTS request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            return Err(PipelineError::audio_failed(format!(
                "TTS endpoint returned {}",
                response.status()
            )));
        }

        let body: TtsResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::audio_failed(format!("Unreadable TTS response: {}", e.without_url())))?;

        decode_response(body)
    }
}

#[async_trait]
impl SpeechSynthesizer for TikTokTts {
    async fn synthesize(&self, script: &str, voice: &str) -> StepResult<PathBuf> {
        if self.session_id.is_empty() {
            return Err(PipelineError::audio_failed("TIKTOK_SESSION_ID is not set"));
        }

        let chunks = chunk_text(script, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(PipelineError::audio_failed("Script is empty"));
        }

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let id = Uuid::new_v4();
        let mut parts = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            debug!("Synthesizing chunk {}/{} ({} chars)", i + 1, chunks.len(), chunk.len());
            let audio = self.synthesize_chunk(chunk, voice).await?;
            let part = self.work_dir.join(format!("{}_part{}.mp3", id, i));
            tokio::fs::write(&part, audio).await?;
            parts.push(part);
        }

        let output = self.work_dir.join(format!("{}.mp3", id));
        let joined = concat_audio(&parts, &output, self.ffmpeg_timeout).await;

        for part in &parts {
            let _ = tokio::fs::remove_file(part).await;
        }
        joined.map_err(|e| PipelineError::audio_failed(format!("Could not join audio: {}", e)))?;

        info!("Narration written to {}", output.display());
        Ok(output)
    }
}

fn decode_response(body: TtsResponse) -> StepResult<Vec<u8>> {
    if body.status_code != 0 {
        return Err(PipelineError::audio_failed(format!(
            "TTS rejected the request ({}): {}",
            body.status_code, body.status_msg
        )));
    }

    let encoded = body
        .data
        .map(|d| d.v_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PipelineError::audio_failed("TTS response carried no audio"))?;

    STANDARD
        .decode(encoded)
        .map_err(|e| PipelineError::audio_failed(format!("Invalid audio payload: {}", e)))
}

/// Rewrite characters the endpoint mangles.
fn prepare_text(text: &str) -> String {
    text.replace('+', "plus").replace('&', "and")
}

/// Split `text` on whitespace into chunks of at most `max_chars` characters.
///
/// Words longer than `max_chars` are split mid-word.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            chunks.push(word.into_iter().collect());
            word = rest;
        }

        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
