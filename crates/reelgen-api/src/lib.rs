//! Axum HTTP API server.
//!
//! This crate provides:
//! - Generation, progress, health and video download endpoints
//! - A sliding-window generation quota per client plus a per-second burst throttle
//! - Security headers, request ids and request logging
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod governor;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use governor::{Clock, ManualClock, SlidingWindowGovernor, SystemClock};
pub use middleware::ClientIdentity;
pub use routes::create_router;
pub use state::AppState;
