//! Process-local rate limiter for tests and single-instance runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::foundation::Timestamp;
use crate::ports::{RateLimitDecision, RateLimitError, RateLimitKey, RateLimiter};

use super::config::RateLimitConfig;

#[derive(Debug, Clone)]
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    counters: Arc<Mutex<HashMap<RateLimitKey, Counter>>>,
}

#[derive(Debug, Clone, Copy)]
struct Counter {
    hits: u64,
    /// Unix seconds at which the window closes.
    closes_at: i64,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            counters: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RateLimitConfig::default())
    }

    async fn hit_at(&self, key: &RateLimitKey, now: Timestamp) -> RateLimitDecision {
        let window = self.config.window_for(key.operation);
        let now_secs = now.as_unix_secs();

        let mut counters = self.counters.lock().await;
        let counter = counters.entry(key.clone()).or_insert(Counter {
            hits: 0,
            closes_at: now_secs + i64::from(window.window_secs),
        });
        if now_secs >= counter.closes_at {
            *counter = Counter {
                hits: 0,
                closes_at: now_secs + i64::from(window.window_secs),
            };
        }
        counter.hits += 1;

        let secs_left = u64::try_from(counter.closes_at - now_secs).unwrap_or(0);
        window.decide(counter.hits, secs_left, now)
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn hit(&self, key: &RateLimitKey) -> Result<RateLimitDecision, RateLimitError> {
        Ok(self.hit_at(key, Timestamp::now()).await)
    }
}
