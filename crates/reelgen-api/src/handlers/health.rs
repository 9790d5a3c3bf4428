//! Health check handler.

use axum::extract::State;
use axum::Json;
use reelgen_models::HealthResponse;

use crate::state::AppState;

/// Liveness plus which service credentials are configured.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.services))
}
