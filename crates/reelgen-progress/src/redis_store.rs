//! Redis progress backend.

use async_trait::async_trait;
use redis::AsyncCommands;
use reelgen_models::ProgressRecord;
use tracing::debug;

use crate::backend::ProgressBackend;
use crate::error::ProgressResult;

/// Default key holding the record.
pub const DEFAULT_PROGRESS_KEY: &str = "reelgen:progress";

/// Stores the record as a JSON string under a single key.
pub struct RedisProgressBackend {
    client: redis::Client,
    key: String,
}

impl RedisProgressBackend {
    /// Create a new backend. Does not connect until first use.
    pub fn new(redis_url: &str, key: impl Into<String>) -> ProgressResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            key: key.into(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl ProgressBackend for RedisProgressBackend {
    async fn write(&self, record: &ProgressRecord) -> ProgressResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(record)?;

        debug!("Writing progress to {}", self.key);
        conn.set::<_, _, ()>(&self.key, payload).await?;

        Ok(())
    }

    async fn read(&self) -> ProgressResult<Option<ProgressRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = conn.get(&self.key).await?;

        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
