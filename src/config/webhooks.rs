//! Webhook retention and maintenance scheduling

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhooksConfig {
    /// Days a webhook record is kept before purge
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Seconds between maintenance runs (expiry sweep and purge)
    #[serde(default = "default_maintenance_interval")]
    pub maintenance_interval_secs: u64,
}

impl WebhooksConfig {
    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.retention_days == 0 {
            return Err(ValidationError::InvalidRetention);
        }
        if self.maintenance_interval_secs < 60 {
            return Err(ValidationError::InvalidMaintenanceInterval);
        }
        Ok(())
    }
}

impl Default for WebhooksConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            maintenance_interval_secs: default_maintenance_interval(),
        }
    }
}

fn default_retention_days() -> u32 {
    90
}

fn default_maintenance_interval() -> u64 {
    3600
}
