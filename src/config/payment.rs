//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Which PayPal environment to talk to.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    #[default]
    Sandbox,
    Live,
}

/// Gateway credentials and webhook secrets
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    #[serde(default)]
    pub paypal_mode: PaymentMode,

    pub paypal_client_id: String,

    pub paypal_client_secret: SecretString,

    /// Webhook id registered with PayPal; verification fails without it
    pub paypal_webhook_id: Option<String>,

    /// Shared secret for APS webhook signatures
    pub aps_webhook_secret: Option<SecretString>,

    /// Shared secret for HyperPay webhook signatures
    pub hyperpay_webhook_secret: Option<SecretString>,

    /// Timeout for outbound gateway calls in seconds
    #[serde(default = "default_gateway_timeout")]
    pub gateway_timeout_secs: u64,
}

impl PaymentConfig {
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    pub fn is_live(&self) -> bool {
        self.paypal_mode == PaymentMode::Live
    }

    /// Webhook id, treating an empty value as unset.
    pub fn paypal_webhook_id(&self) -> Option<String> {
        self.paypal_webhook_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    /// Validate payment configuration
    ///
    /// Production requires live mode and a webhook id.
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.paypal_client_id.is_empty() {
            return Err(ValidationError::MissingRequired("QUIZ__PAYMENT__PAYPAL_CLIENT_ID"));
        }
        if self.paypal_client_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired(
                "QUIZ__PAYMENT__PAYPAL_CLIENT_SECRET",
            ));
        }
        if self.gateway_timeout_secs == 0 || self.gateway_timeout_secs > 120 {
            return Err(ValidationError::InvalidGatewayTimeout);
        }
        if production {
            if !self.is_live() {
                return Err(ValidationError::PayPalSandboxInProduction);
            }
            if self.paypal_webhook_id().is_none() {
                return Err(ValidationError::MissingRequired("QUIZ__PAYMENT__PAYPAL_WEBHOOK_ID"));
            }
        }
        Ok(())
    }
}

fn default_gateway_timeout() -> u64 {
    15
}
