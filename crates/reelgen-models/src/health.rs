//! Health check payload.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which external services have credentials configured.
///
/// Reflects configuration only, not live connectivity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ServiceFlags {
    pub pexels_api: bool,
    pub tiktok_session: bool,
    pub imagemagick: bool,
    pub assembly_ai: bool,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub services: ServiceFlags,
}

impl HealthResponse {
    pub fn healthy(services: ServiceFlags) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            services,
        }
    }
}
