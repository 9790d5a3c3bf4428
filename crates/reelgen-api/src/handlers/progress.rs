//! Progress handler.

use axum::extract::State;
use axum::Json;
use reelgen_models::ProgressRecord;

use crate::state::AppState;

/// Current progress record. Never fails; an empty store yields the initial record.
pub async fn get_progress(State(state): State<AppState>) -> Json<ProgressRecord> {
    Json(state.progress.get().await)
}
