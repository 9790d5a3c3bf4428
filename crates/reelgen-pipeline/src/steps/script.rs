//! Script generation with retry and a minimum-length check.

use std::sync::Arc;

use tracing::info;

use crate::collaborators::ScriptGenerator;
use crate::error::PipelineError;
use crate::metrics;
use crate::retry::{retry_async, RetryPolicy, RetryResult, Sleeper};

/// Scripts must be longer than this many characters after trimming.
pub const DEFAULT_MIN_SCRIPT_CHARS: usize = 50;

/// Outcome of the script step. Exhaustion is a value, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptOutcome {
    Ready { script: String, attempts: u32 },
    NotAvailable { attempts: u32 },
}

impl ScriptOutcome {
    pub fn script(&self) -> Option<&str> {
        match self {
            ScriptOutcome::Ready { script, .. } => Some(script),
            ScriptOutcome::NotAvailable { .. } => None,
        }
    }
}

/// Wraps a [`ScriptGenerator`] with bounded retry.
#[derive(Clone)]
pub struct ResilientScriptStep {
    generator: Arc<dyn ScriptGenerator>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    min_chars: usize,
}

impl ResilientScriptStep {
    pub fn new(generator: Arc<dyn ScriptGenerator>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            generator,
            sleeper,
            policy: RetryPolicy::new("Script generation"),
            min_chars: DEFAULT_MIN_SCRIPT_CHARS,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate a script for `topic`, trimmed.
    ///
    /// Collaborator errors and too-short scripts both count as failed attempts.
    pub async fn generate(&self, topic: &str) -> ScriptOutcome {
        let result = retry_async(&self.policy, self.sleeper.as_ref(), |attempt| async move {
            info!("Generating script for '{}' (attempt {})", topic, attempt);
            let script = self.generator.generate_script(topic).await?;
            self.accept(&script)
        })
        .await;

        metrics::record_script_attempts(result.attempts());

        match result {
            RetryResult::Success { value, attempts } => ScriptOutcome::Ready {
                script: value,
                attempts,
            },
            RetryResult::Failed { attempts, .. } => ScriptOutcome::NotAvailable { attempts },
        }
    }

    fn accept(&self, script: &str) -> Result<String, PipelineError> {
        let trimmed = script.trim();
        let length = trimmed.chars().count();
        if length <= self.min_chars {
            return Err(PipelineError::script_failed(format!(
                "script too short ({} characters, need more than {})",
                length, self.min_chars
            )));
        }
        Ok(trimmed.to_string())
    }
}
