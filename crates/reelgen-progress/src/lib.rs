//! Progress reporting for the generation pipeline.
//!
//! This crate provides:
//! - [`ProgressStore`], the infallible `update`/`get` facade used by the pipeline
//! - [`ProgressBackend`] implementations: JSON file, Redis key, in-memory
//!
//! Exactly one record is kept per store. Concurrent runs sharing a store
//! overwrite each other's progress.

pub mod backend;
pub mod error;
pub mod file;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use backend::ProgressBackend;
pub use error::{ProgressError, ProgressResult};
pub use file::FileProgressBackend;
pub use memory::MemoryProgressBackend;
pub use redis_store::{RedisProgressBackend, DEFAULT_PROGRESS_KEY};
pub use store::ProgressStore;
