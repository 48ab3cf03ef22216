//! Checkout rate limit configuration

use serde::Deserialize;

use crate::adapters::rate_limiter::RateLimitConfig;

use super::error::ValidationError;

/// Fixed-window limits for the checkout routes.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_create_order_limit")]
    pub create_order_limit: u32,

    #[serde(default = "default_capture_order_limit")]
    pub capture_order_limit: u32,

    /// Window length in seconds, shared by both routes
    #[serde(default = "default_window")]
    pub window_secs: u32,
}

impl RateLimitSettings {
    /// Limiter configuration with these settings applied.
    pub fn limiter_config(&self) -> RateLimitConfig {
        RateLimitConfig::checkout(
            self.create_order_limit,
            self.capture_order_limit,
            self.window_secs,
        )
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.create_order_limit == 0 {
            return Err(ValidationError::InvalidRateLimit("create_order_limit"));
        }
        if self.capture_order_limit == 0 {
            return Err(ValidationError::InvalidRateLimit("capture_order_limit"));
        }
        if self.window_secs == 0 {
            return Err(ValidationError::InvalidRateLimit("window_secs"));
        }
        Ok(())
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            create_order_limit: default_create_order_limit(),
            capture_order_limit: default_capture_order_limit(),
            window_secs: default_window(),
        }
    }
}

fn default_create_order_limit() -> u32 {
    20
}

fn default_capture_order_limit() -> u32 {
    30
}

fn default_window() -> u32 {
    15 * 60
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::rate_limiter::{RateWindow, RESOURCE_CAPTURE_ORDER, RESOURCE_CREATE_ORDER};

    #[test]
    fn test_limiter_config_carries_overrides() {
        let settings = RateLimitSettings {
            create_order_limit: 5,
            ..Default::default()
        };
        let config = settings.limiter_config();

        assert_eq!(config.window_for(RESOURCE_CREATE_ORDER), RateWindow::new(5, 900));
        assert_eq!(config.window_for(RESOURCE_CAPTURE_ORDER), RateWindow::new(30, 900));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let settings = RateLimitSettings {
            capture_order_limit: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
