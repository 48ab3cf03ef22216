//! PayPal webhook verification through PayPal's own verification API.
//!
//! PayPal rotates its signing certificates, so the delivery headers and the
//! event are posted back to `verify-webhook-signature` together with the
//! pre-shared webhook id rather than checked against a local secret.

use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;

use crate::ports::{VerificationOutcome, WebhookVerifier};

use super::api_types::VerifySignatureRequest;
use super::client::PayPalClient;

pub const HEADER_AUTH_ALGO: &str = "paypal-auth-algo";
pub const HEADER_CERT_URL: &str = "paypal-cert-url";
pub const HEADER_TRANSMISSION_ID: &str = "paypal-transmission-id";
pub const HEADER_TRANSMISSION_SIG: &str = "paypal-transmission-sig";
pub const HEADER_TRANSMISSION_TIME: &str = "paypal-transmission-time";

pub(super) const MISSING_WEBHOOK_ID: &str =
    "PayPal webhook id not configured - cannot verify webhook signature";
pub(super) const MISSING_HEADERS: &str = "Missing required PayPal webhook headers";

/// Transmission metadata PayPal attaches to every delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayPalTransmission {
    pub auth_algo: String,
    pub cert_url: String,
    pub transmission_id: String,
    pub transmission_sig: String,
    pub transmission_time: String,
}

impl PayPalTransmission {
    /// Reads all five headers. `None` when any is missing or empty.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            auth_algo: get(HEADER_AUTH_ALGO)?,
            cert_url: get(HEADER_CERT_URL)?,
            transmission_id: get(HEADER_TRANSMISSION_ID)?,
            transmission_sig: get(HEADER_TRANSMISSION_SIG)?,
            transmission_time: get(HEADER_TRANSMISSION_TIME)?,
        })
    }
}

/// `WebhookVerifier` backed by PayPal's verification endpoint.
pub struct PayPalWebhookVerifier {
    client: Arc<PayPalClient>,
    webhook_id: Option<String>,
}

impl PayPalWebhookVerifier {
    pub fn new(client: Arc<PayPalClient>, webhook_id: Option<String>) -> Self {
        Self {
            client,
            webhook_id: webhook_id.filter(|id| !id.trim().is_empty()),
        }
    }
}

#[async_trait]
impl WebhookVerifier for PayPalWebhookVerifier {
    async fn verify(
        &self,
        event: &serde_json::Value,
        _raw_body: &[u8],
        headers: &HeaderMap,
    ) -> VerificationOutcome {
        let Some(webhook_id) = self.webhook_id.as_deref() else {
            tracing::error!("PayPal webhook id missing, rejecting delivery");
            return VerificationOutcome::invalid(MISSING_WEBHOOK_ID);
        };

        let Some(transmission) = PayPalTransmission::from_headers(headers) else {
            return VerificationOutcome::invalid(MISSING_HEADERS);
        };

        let request = VerifySignatureRequest {
            auth_algo: &transmission.auth_algo,
            cert_url: &transmission.cert_url,
            transmission_id: &transmission.transmission_id,
            transmission_sig: &transmission.transmission_sig,
            transmission_time: &transmission.transmission_time,
            webhook_id,
            webhook_event: event,
        };

        match self.client.verify_webhook_signature(&request).await {
            Ok(status) if status == "SUCCESS" => VerificationOutcome::valid(),
            Ok(status) => VerificationOutcome::invalid(format!(
                "Webhook verification failed: status {}",
                status
            )),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    transmission_id = %transmission.transmission_id,
                    "PayPal verification call failed"
                );
                VerificationOutcome::invalid(format!("Webhook verification failed: {}", e.message))
            }
        }
    }
}
