//! Rate limiting port.
//!
//! The checkout routes are throttled with fixed windows. A counter belongs to
//! one caller (the signed-in user, or the client address when anonymous) and
//! one operation, and lives in a shared store so every instance sees it.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::domain::foundation::{Timestamp, UserId};

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Records one attempt against `key` and says whether it fits the window.
    ///
    /// Denied attempts still count, so hammering a closed window does not
    /// reopen it early.
    async fn hit(&self, key: &RateLimitKey) -> Result<RateLimitDecision, RateLimitError>;
}

/// Who is being counted.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum Caller {
    User(UserId),
    Ip(String),
}

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    pub caller: Caller,
    /// Throttled operation, e.g. `create_order`.
    pub operation: &'static str,
}

impl RateLimitKey {
    pub fn user(user_id: &UserId, operation: &'static str) -> Self {
        Self {
            caller: Caller::User(user_id.clone()),
            operation,
        }
    }

    pub fn ip(addr: impl Into<String>, operation: &'static str) -> Self {
        Self {
            caller: Caller::Ip(addr.into()),
            operation,
        }
    }

    /// `{prefix}:user:{id}:{operation}` or `{prefix}:ip:{addr}:{operation}`.
    pub fn storage_key(&self, prefix: &str) -> String {
        format!("{}:{}", prefix, self)
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.caller {
            Caller::User(id) => write!(f, "user:{}:{}", id, self.operation),
            Caller::Ip(addr) => write!(f, "ip:{}:{}", addr, self.operation),
        }
    }
}

/// Remaining room in an open window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub remaining: u32,
    pub resets_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed(Quota),
    Denied { limit: u32, retry_after_secs: u32 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed(_))
    }
}

#[derive(Debug, Clone, Error)]
pub enum RateLimitError {
    #[error("rate limit store unavailable: {0}")]
    Unavailable(String),
}
