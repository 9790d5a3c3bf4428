//! The single progress record reported while a run is in flight.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default per-step labels, indexed by step.
pub const STEP_LABELS: [&str; 7] = [
    "Generating script...",
    "Searching for videos...",
    "Downloading videos...",
    "Creating audio...",
    "Generating subtitles...",
    "Assembling final video...",
    "Complete!",
];

/// Number of steps a run reports against.
pub const TOTAL_STEPS: u32 = STEP_LABELS.len() as u32;

const INITIAL_MESSAGE: &str = "Starting...";

/// Current progress of the active run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProgressRecord {
    pub step: u32,
    pub total_steps: u32,
    /// floor(step / total_steps * 100)
    pub percentage: u8,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ProgressRecord {
    /// Build a record for `step`, falling back to the label table when no message is given.
    pub fn new(step: u32, message: Option<&str>, timestamp: DateTime<Utc>) -> Self {
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| Self::default_label(step).to_string());

        Self {
            step,
            total_steps: TOTAL_STEPS,
            percentage: Self::percentage_for(step),
            message,
            timestamp,
        }
    }

    /// Record returned when nothing has been persisted yet.
    pub fn initial(timestamp: DateTime<Utc>) -> Self {
        Self {
            step: 0,
            total_steps: TOTAL_STEPS,
            percentage: 0,
            message: INITIAL_MESSAGE.to_string(),
            timestamp,
        }
    }

    /// Integer percentage for a step, clamped to [0, 100].
    pub fn percentage_for(step: u32) -> u8 {
        let step = step.min(TOTAL_STEPS);
        (step * 100 / TOTAL_STEPS) as u8
    }

    fn default_label(step: u32) -> &'static str {
        let index = step.min(TOTAL_STEPS - 1) as usize;
        STEP_LABELS[index]
    }

    pub fn is_complete(&self) -> bool {
        self.step >= self.total_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_matches_floor_for_every_step() {
        for step in 0..=TOTAL_STEPS {
            let expected = ((step as f64 / TOTAL_STEPS as f64) * 100.0).floor() as u8;
            let record = ProgressRecord::new(step, None, Utc::now());
            assert_eq!(record.percentage, expected, "step {}", step);
            assert!(record.percentage <= 100);
        }
    }

    #[test]
    fn test_percentage_clamped_past_last_step() {
        assert_eq!(ProgressRecord::percentage_for(TOTAL_STEPS + 5), 100);
    }

    #[test]
    fn test_default_label_lookup() {
        let record = ProgressRecord::new(2, None, Utc::now());
        assert_eq!(record.message, "Downloading videos...");

        let past_end = ProgressRecord::new(42, None, Utc::now());
        assert_eq!(past_end.message, "Complete!");
    }

    #[test]
    fn test_explicit_message_wins() {
        let record = ProgressRecord::new(3, Some("Downloading video 1/4..."), Utc::now());
        assert_eq!(record.message, "Downloading video 1/4...");
        assert_eq!(record.step, 3);
        assert_eq!(record.total_steps, TOTAL_STEPS);
    }

    #[test]
    fn test_initial_record() {
        let record = ProgressRecord::initial(Utc::now());
        assert_eq!(record.step, 0);
        assert_eq!(record.percentage, 0);
        assert_eq!(record.message, "Starting...");
        assert!(!record.is_complete());
    }

    #[test]
    fn test_serializes_wire_shape() {
        let record = ProgressRecord::new(1, Some("Generating engaging script..."), Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        for key in ["step", "total_steps", "percentage", "message", "timestamp"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["percentage"], 14);
    }
}
