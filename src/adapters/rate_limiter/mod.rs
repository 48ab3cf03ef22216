//! Rate limiter adapters.
//!
//! - `InMemoryRateLimiter` - process-local counters for tests and single instances
//! - `RedisRateLimiter` - shared counters for multi-instance deployments

mod config;
mod in_memory;
mod redis;

pub use config::{RateLimitConfig, RateWindow, RESOURCE_CAPTURE_ORDER, RESOURCE_CREATE_ORDER};
pub use in_memory::InMemoryRateLimiter;
pub use redis::{RedisRateLimiter, DEFAULT_KEY_PREFIX};
