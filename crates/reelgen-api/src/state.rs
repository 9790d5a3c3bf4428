//! Application state.

use std::path::PathBuf;
use std::sync::Arc;

use reelgen_models::ServiceFlags;
use reelgen_pipeline::{build_collaborators, PipelineConfig, PipelineOrchestrator, StepResult};
use reelgen_progress::ProgressStore;

use crate::config::ApiConfig;
use crate::governor::SlidingWindowGovernor;
use crate::middleware::RateLimiterCache;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub progress: ProgressStore,
    pub governor: SlidingWindowGovernor,
    pub burst_limiter: Arc<RateLimiterCache>,
    pub orchestrator: PipelineOrchestrator,
    /// Files served by `GET /api/video/{id}` live here
    pub work_dir: PathBuf,
    pub services: ServiceFlags,
}

impl AppState {
    /// Create state with the production collaborators.
    pub async fn new(config: ApiConfig, pipeline: PipelineConfig) -> StepResult<Self> {
        tokio::fs::create_dir_all(&pipeline.work_dir).await?;

        let progress = pipeline.progress_store()?;
        let orchestrator = PipelineOrchestrator::from_config(
            build_collaborators(&pipeline),
            progress.clone(),
            &pipeline,
        );
        let services = service_flags(&config, &pipeline);

        Ok(Self::from_parts(
            config,
            orchestrator,
            SlidingWindowGovernor::new(),
            pipeline.work_dir,
            services,
        ))
    }

    /// Assemble state from prepared parts. The progress store is taken from the orchestrator.
    pub fn from_parts(
        config: ApiConfig,
        orchestrator: PipelineOrchestrator,
        governor: SlidingWindowGovernor,
        work_dir: PathBuf,
        services: ServiceFlags,
    ) -> Self {
        Self {
            burst_limiter: Arc::new(
                RateLimiterCache::new(config.rate_limit_rps)
                    .with_trust_proxy_headers(config.trust_proxy_headers),
            ),
            progress: orchestrator.progress().clone(),
            config,
            governor,
            orchestrator,
            work_dir,
            services,
        }
    }
}

/// Which secrets are configured.
pub fn service_flags(config: &ApiConfig, pipeline: &PipelineConfig) -> ServiceFlags {
    ServiceFlags {
        pexels_api: pipeline.pexels_api_key.is_some(),
        tiktok_session: pipeline.tiktok_session_id.is_some(),
        imagemagick: config.imagemagick_binary.is_some(),
        assembly_ai: config.assembly_ai_api_key.is_some(),
    }
}
