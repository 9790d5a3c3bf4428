//! Infallible progress facade.

use std::sync::Arc;

use chrono::Utc;
use reelgen_models::ProgressRecord;
use tracing::{debug, warn};

use crate::backend::ProgressBackend;
use crate::memory::MemoryProgressBackend;

/// Progress store used by the pipeline and the progress endpoint.
///
/// Neither operation can fail: write errors are logged and dropped, read
/// errors yield the initial record. Progress reporting never aborts a run.
#[derive(Clone)]
pub struct ProgressStore {
    backend: Arc<dyn ProgressBackend>,
}

impl ProgressStore {
    pub fn new(backend: Arc<dyn ProgressBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryProgressBackend::new()))
    }

    /// Overwrite the current record for `step`.
    ///
    /// `message` falls back to the step's default label.
    pub async fn update(&self, step: u32, message: Option<&str>) {
        let record = ProgressRecord::new(step, message, Utc::now());

        match self.backend.write(&record).await {
            Ok(()) => debug!(
                step = record.step,
                percentage = record.percentage,
                backend = self.backend.name(),
                "Progress updated: {}",
                record.message
            ),
            Err(e) => warn!(
                step = record.step,
                backend = self.backend.name(),
                "Could not save progress: {}",
                e
            ),
        }
    }

    /// Last stored record, or the initial record if none exists or the store is unreadable.
    pub async fn get(&self) -> ProgressRecord {
        match self.backend.read().await {
            Ok(Some(record)) => record,
            Ok(None) => ProgressRecord::initial(Utc::now()),
            Err(e) => {
                debug!(backend = self.backend.name(), "Could not read progress: {}", e);
                ProgressRecord::initial(Utc::now())
            }
        }
    }
}
