//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// A loaded value broke a section's rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingRequired(&'static str),

    #[error("port must be non-zero")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidSocketAddress(String),

    #[error("request timeout must be 1-300 seconds")]
    InvalidTimeout,

    #[error("Invalid client URL")]
    InvalidClientUrl,

    #[error("Client URL must use HTTPS in production")]
    ClientUrlMustBeHttps,

    #[error("database URL must use postgres:// or postgresql://")]
    InvalidDatabaseUrl,

    #[error("redis URL must use redis:// or rediss://")]
    InvalidRedisUrl,

    #[error("database min_connections is above max_connections")]
    InvalidPoolSize,

    #[error("database max_connections is above 100")]
    PoolSizeTooLarge,

    #[error("JWT secret must be at least {0} characters")]
    JwtSecretTooShort(usize),

    #[error("PayPal must run in live mode in production")]
    PayPalSandboxInProduction,

    #[error("Invalid gateway timeout")]
    InvalidGatewayTimeout,

    #[error("Webhook retention must be at least one day")]
    InvalidRetention,

    #[error("Invalid maintenance interval")]
    InvalidMaintenanceInterval,

    #[error("Invalid rate limit for {0}")]
    InvalidRateLimit(&'static str),
}
