//! Shared-secret webhook verification for gateways on the HMAC scheme.
//!
//! APS and HyperPay sign the raw body with a secret configured on both
//! sides. This is weaker than PayPal's verification API because a leaked
//! or stale secret cannot be rotated by the issuer alone.

use async_trait::async_trait;
use http::HeaderMap;

use crate::domain::webhook::{HmacSignatureVerifier, SIGNATURE_HEADER};
use crate::ports::{VerificationOutcome, WebhookVerifier};

/// `WebhookVerifier` reading `x-signature: sha256=<hex>`.
#[derive(Debug, Clone)]
pub struct HmacWebhookVerifier {
    inner: HmacSignatureVerifier,
}

impl HmacWebhookVerifier {
    /// An empty or absent secret rejects every delivery.
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            inner: HmacSignatureVerifier::new(secret),
        }
    }
}

#[async_trait]
impl WebhookVerifier for HmacWebhookVerifier {
    async fn verify(
        &self,
        _event: &serde_json::Value,
        raw_body: &[u8],
        headers: &HeaderMap,
    ) -> VerificationOutcome {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        match self.inner.verify(raw_body, header) {
            Ok(()) => VerificationOutcome::valid(),
            Err(e) => VerificationOutcome::invalid(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::webhook::sign_for_test;
    use http::HeaderValue;

    const BODY: &[u8] = br#"{"id":"aps-1","event_type":"payment.success"}"#;

    fn headers_with(signature: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(signature).unwrap());
        headers
    }

    #[tokio::test]
    async fn valid_signature_is_accepted() {
        let verifier = HmacWebhookVerifier::new(Some("aps-secret"));
        let signature = sign_for_test("aps-secret", BODY);
        let outcome = verifier
            .verify(&serde_json::json!({}), BODY, &headers_with(&signature))
            .await;
        assert!(outcome.valid);
    }

    #[tokio::test]
    async fn tampered_body_is_rejected() {
        let verifier = HmacWebhookVerifier::new(Some("aps-secret"));
        let signature = sign_for_test("aps-secret", BODY);
        let outcome = verifier
            .verify(&serde_json::json!({}), b"{\"id\":\"other\"}", &headers_with(&signature))
            .await;
        assert!(!outcome.valid);
    }

    #[tokio::test]
    async fn missing_secret_rejects_even_a_signed_body() {
        let verifier = HmacWebhookVerifier::new(None);
        let signature = sign_for_test("aps-secret", BODY);
        let outcome = verifier
            .verify(&serde_json::json!({}), BODY, &headers_with(&signature))
            .await;
        assert!(!outcome.valid);
        assert!(outcome.reason.unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let verifier = HmacWebhookVerifier::new(Some("aps-secret"));
        let outcome = verifier
            .verify(&serde_json::json!({}), BODY, &HeaderMap::new())
            .await;
        assert!(!outcome.valid);
    }
}
