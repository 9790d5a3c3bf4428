//! Generated video download.

use std::io::ErrorKind;
use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use tokio_util::io::ReaderStream;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const NOT_FOUND: &str = "Video not found";

/// Stream a file from the work directory as an attachment.
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Response> {
    if !is_plain_file_name(&video_id) {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    let path = state.work_dir.join(&video_id);

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(ApiError::not_found(NOT_FOUND)),
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(ApiError::not_found(NOT_FOUND)),
        Err(e) => {
            warn!(video_id = %video_id, "Failed to stat video: {}", e);
            return Err(ApiError::internal(e.to_string()));
        }
    };

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        warn!(video_id = %video_id, "Failed to open video: {}", e);
        ApiError::internal(e.to_string())
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type(&video_id))
        .header(header::CONTENT_LENGTH, metadata.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", video_id),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

/// A single path component with no separators or traversal.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && FsPath::new(name).file_name().is_some_and(|f| f == name)
}

fn content_type(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".mp4") {
        "video/mp4"
    } else if lower.ends_with(".mp3") {
        "audio/mpeg"
    } else if lower.ends_with(".srt") {
        "application/x-subrip"
    } else {
        "application/octet-stream"
    }
}
