//! Pipeline orchestration.
//!
//! Runs the stages in order, writes a progress record on entry to each stage
//! and converts every failure into a [`PipelineResult::Failure`]. A run never
//! returns an error to its caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use reelgen_media::format_file_size;
use reelgen_models::{
    ErrorCode, GenerateRequest, PipelineResult, PublishOutcome, RunId, Stage, VideoMetadata,
    SENTINEL_DURATION, SENTINEL_UNKNOWN,
};
use reelgen_progress::ProgressStore;
use tracing::Instrument;

use crate::collaborators::Collaborators;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::logging::JobLogger;
use crate::metrics;
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::steps::{
    BatchDownloadStep, FootageAcquisitionStep, FootagePlan, ResilientScriptStep, ScriptOutcome,
};

/// Message for faults that carry no user-facing classification.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Why a run stopped early.
#[derive(Debug)]
enum RunFailure {
    /// Shortfall detected by the orchestrator itself
    Expected { code: ErrorCode, message: String },
    /// Error raised by a collaborator
    Fault(PipelineError),
}

impl RunFailure {
    fn expected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Expected {
            code,
            message: message.into(),
        }
    }
}

impl From<PipelineError> for RunFailure {
    fn from(e: PipelineError) -> Self {
        Self::Fault(e)
    }
}

/// Tracks the current stage, its timing and the progress record.
struct StageTracker<'a> {
    progress: &'a ProgressStore,
    logger: &'a JobLogger,
    stage: Stage,
    entered_at: Instant,
}

impl<'a> StageTracker<'a> {
    fn new(progress: &'a ProgressStore, logger: &'a JobLogger) -> Self {
        Self {
            progress,
            logger,
            stage: Stage::Init,
            entered_at: Instant::now(),
        }
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    /// Close the current stage and enter `stage`.
    async fn enter(&mut self, stage: Stage, message: Option<&str>) {
        self.finish_stage();
        self.stage = stage;
        self.entered_at = Instant::now();

        let message = message.unwrap_or_else(|| stage.progress_message());
        self.logger.log_stage(stage, message);
        self.progress.update(stage.step(), Some(message)).await;
    }

    fn finish_stage(&self) {
        if self.stage != Stage::Init {
            metrics::record_stage_duration(self.stage, self.entered_at.elapsed().as_secs_f64());
        }
    }
}

/// Delete downloaded clips, narration and subtitles left by a run.
///
/// Files already gone are skipped; other failures are only logged.
async fn remove_intermediates(paths: &[PathBuf]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed intermediate file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove intermediate file")
            }
        }
    }
}

/// Sequences the steps and collaborators of one generation run.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    collaborators: Collaborators,
    progress: ProgressStore,
    script_step: ResilientScriptStep,
    footage_step: FootageAcquisitionStep,
    download_step: BatchDownloadStep,
}

impl PipelineOrchestrator {
    /// Create an orchestrator with default step limits.
    pub fn new(
        collaborators: Collaborators,
        progress: ProgressStore,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let script_step = ResilientScriptStep::new(collaborators.script.clone(), sleeper);
        let footage_step = FootageAcquisitionStep::new(
            collaborators.search_terms.clone(),
            collaborators.footage.clone(),
        );
        let download_step = BatchDownloadStep::new(collaborators.downloader.clone());

        Self {
            collaborators,
            progress,
            script_step,
            footage_step,
            download_step,
        }
    }

    /// Create an orchestrator using the limits in `config` and real sleeps.
    pub fn from_config(
        collaborators: Collaborators,
        progress: ProgressStore,
        config: &PipelineConfig,
    ) -> Self {
        Self::new(collaborators, progress, Arc::new(TokioSleeper))
            .with_script_policy(
                RetryPolicy::new("Script generation")
                    .with_max_attempts(config.script_max_attempts)
                    .with_backoff(config.script_retry_backoff),
            )
            .with_min_script_chars(config.script_min_chars)
            .with_footage_plan(config.footage.clone())
    }

    pub fn with_script_policy(mut self, policy: RetryPolicy) -> Self {
        self.script_step = self.script_step.with_policy(policy);
        self
    }

    pub fn with_min_script_chars(mut self, min_chars: usize) -> Self {
        self.script_step = self.script_step.with_min_chars(min_chars);
        self
    }

    pub fn with_footage_plan(mut self, plan: FootagePlan) -> Self {
        self.footage_step = self.footage_step.with_plan(plan);
        self
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    /// Run the whole pipeline for `request`.
    pub async fn run(&self, request: &GenerateRequest) -> PipelineResult {
        let run_id = RunId::new();
        let logger = JobLogger::new(&run_id, "video_generation");
        let span = logger.create_span();

        async {
            let topic = request.subject();
            let started = Instant::now();
            logger.log_start(&format!("'{}' (voice {})", topic, request.voice()));

            let mut tracker = StageTracker::new(&self.progress, &logger);
            let mut intermediates = Vec::new();
            let outcome = self
                .execute(&topic, request, &mut tracker, &mut intermediates)
                .await;
            remove_intermediates(&intermediates).await;
            let result = match outcome {
                Ok(result) => {
                    logger.log_completion("Video generated successfully");
                    result
                }
                Err(failure) => self.fail(failure, &tracker).await,
            };
            tracker.finish_stage();

            metrics::record_run(result.error_code(), started.elapsed().as_secs_f64());
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        topic: &str,
        request: &GenerateRequest,
        tracker: &mut StageTracker<'_>,
        intermediates: &mut Vec<PathBuf>,
    ) -> Result<PipelineResult, RunFailure> {
        tracker.enter(Stage::ScriptGeneration, None).await;
        let script = match self.script_step.generate(topic).await {
            ScriptOutcome::Ready { script, .. } => script,
            ScriptOutcome::NotAvailable { attempts } => {
                tracker
                    .logger
                    .log_warning(&format!("No usable script after {} attempts", attempts));
                return Err(RunFailure::expected(
                    ErrorCode::GenerationError,
                    "Failed to generate script",
                ));
            }
        };

        tracker.enter(Stage::FootageSearch, None).await;
        let references = self.footage_step.acquire(topic, &script).await?;
        if references.len() < self.footage_step.plan().min_references {
            return Err(RunFailure::expected(
                ErrorCode::GenerationError,
                "Not enough videos found. Try a different topic.",
            ));
        }

        let message = format!("Downloading {} videos...", references.len());
        tracker.enter(Stage::Downloading, Some(&message)).await;
        let videos = self
            .download_step
            .download_all(&references, &self.progress)
            .await;
        intermediates.extend(videos.iter().cloned());
        if videos.is_empty() {
            return Err(RunFailure::expected(
                ErrorCode::VideoSearchError,
                "None of the stock videos could be downloaded",
            ));
        }

        tracker.enter(Stage::AudioSynthesis, None).await;
        let audio = self
            .collaborators
            .speech
            .synthesize(&script, request.voice())
            .await
            .map_err(PipelineError::into_audio)?;
        intermediates.push(audio.clone());

        tracker.enter(Stage::SubtitleGeneration, None).await;
        let subtitles = self
            .collaborators
            .subtitles
            .generate_subtitles(&audio, &script)
            .await?;
        intermediates.push(subtitles.clone());

        tracker.enter(Stage::Assembly, None).await;
        let video = self
            .collaborators
            .assembler
            .assemble(&videos, &audio, &subtitles)
            .await?;
        intermediates.retain(|path| path != &video);

        let mut result =
            PipelineResult::success(video.to_string_lossy(), self.probe_metadata(&video).await);

        if request.automate_youtube_upload {
            tracker.enter(Stage::Publish, None).await;
            let outcome = self.publish(&video, topic, &script, tracker.logger).await;
            result = result.with_publish(outcome);
        }

        tracker.enter(Stage::Complete, None).await;
        Ok(result)
    }

    async fn fail(&self, failure: RunFailure, tracker: &StageTracker<'_>) -> PipelineResult {
        let stage = tracker.stage();
        let (code, message) = match failure {
            RunFailure::Expected { code, message } => {
                tracker.logger.log_error(stage, &message);
                (code, message)
            }
            RunFailure::Fault(e) => {
                tracker.logger.log_error(stage, &e.to_string());
                let message = if e.is_classified() {
                    e.to_string()
                } else {
                    UNEXPECTED_ERROR_MESSAGE.to_string()
                };
                (e.error_code(), message)
            }
        };

        self.progress
            .update(stage.step(), Some(&format!("Error: {}", message)))
            .await;

        PipelineResult::failure(code, message)
    }

    async fn publish(
        &self,
        video: &Path,
        topic: &str,
        script: &str,
        logger: &JobLogger,
    ) -> PublishOutcome {
        let Some(publisher) = &self.collaborators.publisher else {
            logger.log_warning("Upload requested but no publisher is configured");
            metrics::record_publish(false);
            return PublishOutcome::Failed {
                message: "Publishing is not configured".to_string(),
            };
        };

        match publisher.publish(video, topic, script).await {
            Ok(receipt) => {
                logger.log_progress(&format!("Uploaded as {}", receipt.video_id));
                metrics::record_publish(true);
                PublishOutcome::Uploaded {
                    video_id: receipt.video_id,
                    url: receipt.url,
                }
            }
            Err(e) => {
                logger.log_warning(&format!("Upload failed: {}", e));
                metrics::record_publish(false);
                PublishOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Probe the finished video; each field falls back to its sentinel on its own.
    async fn probe_metadata(&self, video: &Path) -> VideoMetadata {
        let probe = &self.collaborators.probe;

        let duration = match probe.duration(video).await {
            Ok(d) if d > 0.0 => d,
            Ok(_) => SENTINEL_DURATION,
            Err(e) => {
                tracing::warn!("Could not read duration of {}: {}", video.display(), e);
                SENTINEL_DURATION
            }
        };

        let resolution = probe.resolution(video).await.unwrap_or_else(|e| {
            tracing::warn!("Could not read resolution of {}: {}", video.display(), e);
            SENTINEL_UNKNOWN.to_string()
        });

        let file_size = match probe.file_size(video).await {
            Ok(bytes) => format_file_size(bytes),
            Err(e) => {
                tracing::warn!("Could not read size of {}: {}", video.display(), e);
                SENTINEL_UNKNOWN.to_string()
            }
        };

        VideoMetadata {
            duration,
            resolution,
            file_size,
        }
    }
}
