//! Shared-secret webhook signatures for APS and HyperPay.
//!
//! Header format: `x-signature: sha256=<hex>` where the digest is
//! HMAC-SHA256 over the raw request body.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verifier bound to one gateway secret.
///
/// A verifier with no secret rejects everything.
#[derive(Clone)]
pub struct HmacSignatureVerifier {
    secret: Option<Vec<u8>>,
}

impl std::fmt::Debug for HmacSignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSignatureVerifier")
            .field("configured", &self.secret.is_some())
            .finish()
    }
}

impl HmacSignatureVerifier {
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret: secret
                .filter(|s| !s.is_empty())
                .map(|s| s.as_bytes().to_vec()),
        }
    }

    /// Checks `header` against the signature of `payload`.
    pub fn verify(&self, payload: &[u8], header: Option<&str>) -> Result<(), WebhookError> {
        let secret = self.secret.as_deref().ok_or_else(|| {
            WebhookError::InvalidSignature("webhook secret not configured".to_string())
        })?;

        let header = header.ok_or_else(|| {
            WebhookError::InvalidSignature(format!("missing {} header", SIGNATURE_HEADER))
        })?;

        let provided_hex = header.strip_prefix(SIGNATURE_PREFIX).unwrap_or(header);
        let provided = hex::decode(provided_hex.trim()).map_err(|_| {
            WebhookError::InvalidSignature("signature is not valid hex".to_string())
        })?;

        let expected = compute_signature(secret, payload)?;
        if !constant_time_compare(&expected, &provided) {
            return Err(WebhookError::InvalidSignature(
                "signature mismatch".to_string(),
            ));
        }
        Ok(())
    }
}

fn compute_signature(secret: &[u8], payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| WebhookError::InvalidSignature(e.to_string()))?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Header value a sender would produce for `payload`. Test fixtures only.
#[cfg(test)]
pub fn sign_for_test(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload);
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}
