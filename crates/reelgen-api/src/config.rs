//! API configuration.

use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Per-IP burst throttle, requests per second
    pub rate_limit_rps: u32,
    /// Key clients by `X-Forwarded-For`/`X-Real-IP`; only safe behind a proxy that sets them
    pub trust_proxy_headers: bool,
    /// Generation quota per client within `generate_window`
    pub generate_max_requests: usize,
    /// Sliding window for the generation quota
    pub generate_window: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    /// Reported by the health endpoint only
    pub imagemagick_binary: Option<String>,
    /// Reported by the health endpoint only
    pub assembly_ai_api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            trust_proxy_headers: false,
            generate_max_requests: 3,
            generate_window: Duration::from_secs(15 * 60),
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            metrics_enabled: true,
            imagemagick_binary: None,
            assembly_ai_api_key: None,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_rps),
            trust_proxy_headers: std::env::var("TRUST_PROXY_HEADERS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            generate_max_requests: std::env::var("GENERATE_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.generate_max_requests),
            generate_window: std::env::var("GENERATE_WINDOW_MINUTES")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(|m| Duration::from_secs(m * 60))
                .unwrap_or(defaults.generate_window),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            imagemagick_binary: std::env::var("IMAGEMAGICK_BINARY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            assembly_ai_api_key: std::env::var("ASSEMBLY_AI_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Window length in whole minutes, as reported to rejected clients.
    pub fn generate_window_minutes(&self) -> u64 {
        self.generate_window.as_secs() / 60
    }
}
