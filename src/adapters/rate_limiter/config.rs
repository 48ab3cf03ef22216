//! Window sizes for the throttled checkout operations.

use std::collections::HashMap;

use crate::domain::foundation::Timestamp;
use crate::ports::{Quota, RateLimitDecision};

pub const RESOURCE_CREATE_ORDER: &str = "create_order";
pub const RESOURCE_CAPTURE_ORDER: &str = "capture_order";

/// At most `max_requests` per `window_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub max_requests: u32,
    pub window_secs: u32,
}

impl RateWindow {
    pub const fn new(max_requests: u32, window_secs: u32) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }

    /// Verdict for the `count`-th attempt in a window closing in `secs_left`.
    ///
    /// A window with no expiry yet (`secs_left == 0`) is treated as freshly opened.
    pub fn decide(&self, count: u64, secs_left: u64, now: Timestamp) -> RateLimitDecision {
        let secs_left = match secs_left {
            0 => u64::from(self.window_secs),
            n => n,
        };
        let limit = self.max_requests;

        match u32::try_from(count) {
            Ok(count) if count <= limit => RateLimitDecision::Allowed(Quota {
                limit,
                remaining: limit - count,
                resets_at: now.plus_secs(secs_left),
            }),
            _ => RateLimitDecision::Denied {
                limit,
                retry_after_secs: u32::try_from(secs_left)
                    .unwrap_or(self.window_secs)
                    .max(1),
            },
        }
    }
}

/// Window per operation; anything unlisted falls back to `fallback`.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    fallback: RateWindow,
    operations: HashMap<&'static str, RateWindow>,
}

impl RateLimitConfig {
    /// Create and capture limits sharing one window length.
    pub fn checkout(create_limit: u32, capture_limit: u32, window_secs: u32) -> Self {
        Self {
            fallback: RateWindow::new(100, 60),
            operations: HashMap::new(),
        }
        .with_operation(
            RESOURCE_CREATE_ORDER,
            RateWindow::new(create_limit, window_secs),
        )
        .with_operation(
            RESOURCE_CAPTURE_ORDER,
            RateWindow::new(capture_limit, window_secs),
        )
    }

    pub fn with_operation(mut self, operation: &'static str, window: RateWindow) -> Self {
        self.operations.insert(operation, window);
        self
    }

    pub fn window_for(&self, operation: &str) -> RateWindow {
        self.operations
            .get(operation)
            .copied()
            .unwrap_or(self.fallback)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::checkout(20, 30, 15 * 60)
    }
}
