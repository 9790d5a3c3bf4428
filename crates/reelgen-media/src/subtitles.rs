//! SRT subtitles timed against a narration track.
//!
//! Sentences are laid end to end across the narration, each taking a share
//! of the total duration proportional to its character count.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::{MediaError, MediaResult};

/// One subtitle entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    /// 1-based index
    pub index: usize,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    pub text: String,
}

/// Split a script into sentences on `.`, `!` and `?`, keeping the punctuation.
pub fn split_sentences(script: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = script.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().map_or(true, |next| next.is_whitespace());
        if at_boundary {
            push_sentence(&mut sentences, &current);
            current.clear();
        }
    }
    push_sentence(&mut sentences, &current);

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().any(|c| c.is_alphanumeric()) {
        sentences.push(normalized);
    }
}

/// Distribute `total_duration` seconds across sentences by length.
pub fn build_cues(sentences: &[String], total_duration: f64) -> MediaResult<Vec<SubtitleCue>> {
    if sentences.is_empty() {
        return Err(MediaError::invalid_input("Script has no sentences"));
    }
    if !(total_duration > 0.0) {
        return Err(MediaError::invalid_input(format!(
            "Narration duration must be positive, got {}",
            total_duration
        )));
    }

    let total_chars: usize = sentences.iter().map(|s| s.chars().count()).sum();
    let mut cues = Vec::with_capacity(sentences.len());
    let mut cursor = 0.0;

    for (i, sentence) in sentences.iter().enumerate() {
        let share = sentence.chars().count() as f64 / total_chars as f64;
        let end = if i + 1 == sentences.len() {
            total_duration
        } else {
            cursor + total_duration * share
        };

        cues.push(SubtitleCue {
            index: i + 1,
            start: cursor,
            end,
            text: sentence.clone(),
        });
        cursor = end;
    }

    Ok(cues)
}

/// Format seconds as `HH:MM:SS,mmm`.
pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Render cues as an SRT document.
pub fn render_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for cue in cues {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            format_srt_time(cue.start),
            format_srt_time(cue.end),
            cue.text
        );
    }
    out
}

/// Write cues to `path` as SRT.
pub async fn write_srt(path: impl AsRef<Path>, cues: &[SubtitleCue]) -> MediaResult<()> {
    tokio::fs::write(path, render_srt(cues)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences(
            "Oceans cover 71% of Earth.  They absorb carbon!\nWhat can we do? Act now",
        );
        assert_eq!(
            sentences,
            vec![
                "Oceans cover 71% of Earth.",
                "They absorb carbon!",
                "What can we do?",
                "Act now",
            ]
        );
    }

    #[test]
    fn test_decimal_points_do_not_split() {
        let sentences = split_sentences("Sea level rose 3.4 mm per year. Really.");
        assert_eq!(sentences, vec!["Sea level rose 3.4 mm per year.", "Really."]);
    }

    #[test]
    fn test_punctuation_only_fragments_dropped() {
        assert!(split_sentences(" ... !! ").is_empty());
    }

    #[test]
    fn test_cues_cover_full_duration() {
        let sentences = vec!["Short.".to_string(), "A much longer sentence here.".to_string()];
        let cues = build_cues(&sentences, 10.0).unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start, 0.0);
        assert_eq!(cues[0].end, cues[1].start);
        assert_eq!(cues[1].end, 10.0);
        assert!(cues[1].end - cues[1].start > cues[0].end - cues[0].start);
    }

    #[test]
    fn test_cues_reject_bad_input() {
        assert!(build_cues(&[], 10.0).is_err());
        assert!(build_cues(&["Hi.".to_string()], 0.0).is_err());
        assert!(build_cues(&["Hi.".to_string()], f64::NAN).is_err());
    }

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(61.5), "00:01:01,500");
        assert_eq!(format_srt_time(3725.042), "01:02:05,042");
    }

    #[tokio::test]
    async fn test_write_srt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.srt");
        let cues = build_cues(&["Hello there.".to_string()], 2.0).unwrap();

        write_srt(&path, &cues).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "1\n00:00:00,000 --> 00:00:02,000\nHello there.\n\n");
    }
}
