//! Video generation handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use reelgen_models::{GenerateRequest, PipelineResult};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::middleware::ClientIdentity;
use crate::state::AppState;

/// Run the pipeline for one topic.
///
/// Admission against the sliding-window quota happens before the body is
/// looked at, so malformed requests still count toward it. Pipeline
/// failures are reported in the result body with status 200.
pub async fn generate(
    State(state): State<AppState>,
    identity: ClientIdentity,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<PipelineResult>> {
    let max_requests = state.config.generate_max_requests;
    let window = state.config.generate_window;

    if !state.governor.admit(identity.as_str(), max_requests, window).await {
        warn!(client = %identity.as_str(), "Generation quota exceeded");
        metrics::record_rate_limit_hit("window", "/api/generate");
        metrics::record_generate_request("rejected");
        return Err(ApiError::rate_limited(
            max_requests,
            state.config.generate_window_minutes(),
        ));
    }

    let Json(request) = payload.map_err(|e| {
        metrics::record_generate_request("invalid");
        ApiError::bad_request(e.body_text())
    })?;

    if let Err(message) = request.validate() {
        metrics::record_generate_request("invalid");
        return Err(ApiError::bad_request(message));
    }

    let request = GenerateRequest {
        video_subject: request.subject(),
        ..request
    };

    info!(
        client = %identity.as_str(),
        subject = %request.video_subject,
        voice = %request.voice(),
        publish = request.automate_youtube_upload,
        "Generation request admitted"
    );

    let result = state.orchestrator.run(&request).await;
    metrics::record_generate_request(if result.is_success() { "success" } else { "error" });

    Ok(Json(result))
}
