//! In-process progress backend.

use async_trait::async_trait;
use reelgen_models::ProgressRecord;
use tokio::sync::RwLock;

use crate::backend::ProgressBackend;
use crate::error::ProgressResult;

/// Keeps the record in memory. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryProgressBackend {
    record: RwLock<Option<ProgressRecord>>,
}

impl MemoryProgressBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressBackend for MemoryProgressBackend {
    async fn write(&self, record: &ProgressRecord) -> ProgressResult<()> {
        *self.record.write().await = Some(record.clone());
        Ok(())
    }

    async fn read(&self) -> ProgressResult<Option<ProgressRecord>> {
        Ok(self.record.read().await.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
