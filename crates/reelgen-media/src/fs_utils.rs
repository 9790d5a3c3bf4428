//! Filesystem helpers.

use std::path::Path;

use crate::error::MediaResult;

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Size of a file in bytes.
pub async fn file_size(path: impl AsRef<Path>) -> MediaResult<u64> {
    Ok(tokio::fs::metadata(path).await?.len())
}

/// Format a byte count with one decimal, e.g. `8.2 MB`.
///
/// Steps through B/KB/MB/GB by 1024 and spills into TB.
pub fn format_file_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in SIZE_UNITS {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} TB", size)
}
