//! Persistence medium for the progress record.

use async_trait::async_trait;
use reelgen_models::ProgressRecord;

use crate::error::ProgressResult;

/// Storage for exactly one progress record.
#[async_trait]
pub trait ProgressBackend: Send + Sync {
    /// Overwrite the stored record.
    async fn write(&self, record: &ProgressRecord) -> ProgressResult<()>;

    /// Read the stored record, `None` if nothing was written yet.
    async fn read(&self) -> ProgressResult<Option<ProgressRecord>>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
