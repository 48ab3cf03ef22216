//! Service configuration from `QUIZ__<SECTION>__<KEY>` environment variables.
//!
//! ```no_run
//! use quiz_entitlements::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod error;
mod payment;
mod rate_limit;
mod redis;
mod server;
mod webhooks;

pub use auth::{AuthConfig, MIN_JWT_SECRET_LEN};
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::{PaymentConfig, PaymentMode};
pub use rate_limit::RateLimitSettings;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};
pub use webhooks::WebhooksConfig;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, client URL)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Redis configuration (rate limit counters)
    pub redis: RedisConfig,

    /// Session token configuration
    pub auth: AuthConfig,

    /// Payment gateway configuration (PayPal, APS, HyperPay)
    pub payment: PaymentConfig,

    /// Webhook retention and maintenance schedule
    #[serde(default)]
    pub webhooks: WebhooksConfig,

    /// Checkout rate limits
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

impl AppConfig {
    /// Reads `.env` if present, then `QUIZ__*` variables.
    ///
    /// `QUIZ__PAYMENT__PAYPAL_WEBHOOK_ID` lands in `payment.paypal_webhook_id`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("QUIZ")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Every section's rules. Production additionally requires live PayPal mode, a PayPal webhook
    /// id and an HTTPS client URL.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.redis.validate()?;
        self.auth.validate()?;
        self.payment.validate(self.is_production())?;
        self.webhooks.validate()?;
        self.rate_limit.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
