//! Redis-backed rate limiter shared by every server instance.
//!
//! Each attempt runs one MULTI block: `SET key 0 NX EX window` opens the
//! window if needed, then `INCR` counts the attempt and `TTL` reports how
//! long the window has left. A counter never exists without an expiry.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use crate::domain::foundation::Timestamp;
use crate::ports::{RateLimitDecision, RateLimitError, RateLimitKey, RateLimiter};

use super::config::RateLimitConfig;

pub const DEFAULT_KEY_PREFIX: &str = "ratelimit";

#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    config: RateLimitConfig,
    key_prefix: String,
}

impl RedisRateLimiter {
    pub fn new(conn: MultiplexedConnection, config: RateLimitConfig) -> Self {
        Self {
            conn,
            config,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Namespaces counters when the Redis instance is shared.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn hit(&self, key: &RateLimitKey) -> Result<RateLimitDecision, RateLimitError> {
        let window = self.config.window_for(key.operation);
        let redis_key = key.storage_key(&self.key_prefix);
        let mut conn = self.conn.clone();

        let (hits, ttl): (i64, i64) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&redis_key)
            .arg(0)
            .arg("NX")
            .arg("EX")
            .arg(window.window_secs)
            .ignore()
            .incr(&redis_key, 1_i64)
            .ttl(&redis_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::Unavailable(e.to_string()))?;

        // TTL is -1/-2 only if the key was evicted mid-block; treat as a new window
        let secs_left = u64::try_from(ttl).unwrap_or(0);
        let hits = u64::try_from(hits).unwrap_or(0);

        Ok(window.decide(hits, secs_left, Timestamp::now()))
    }
}

impl std::fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimiter")
            .field("config", &self.config)
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}
