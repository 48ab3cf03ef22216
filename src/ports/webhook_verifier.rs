//! Webhook authenticity port.
//!
//! Verification is a pure gate: a caller must not touch purchase, subscription
//! or event-store state until `verify` reports valid.

use async_trait::async_trait;
use http::HeaderMap;

/// Result of an authenticity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub valid: bool,
    /// Why the delivery was rejected.
    pub reason: Option<String>,
}

impl VerificationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Checks that a callback came from the gateway.
///
/// Implementations never return "unverifiable" as valid: missing headers or
/// missing configuration are rejections.
#[async_trait]
pub trait WebhookVerifier: Send + Sync {
    async fn verify(
        &self,
        event: &serde_json::Value,
        raw_body: &[u8],
        headers: &HeaderMap,
    ) -> VerificationOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_reason() {
        assert!(VerificationOutcome::valid().valid);
        assert!(VerificationOutcome::valid().reason.is_none());

        let rejected = VerificationOutcome::invalid("Missing required PayPal webhook headers");
        assert!(!rejected.valid);
        assert_eq!(
            rejected.reason.as_deref(),
            Some("Missing required PayPal webhook headers")
        );
    }
}
