//! Request identifiers for outbound gateway calls.
//!
//! Order creation and capture carry a deterministic id so that a client retry
//! replays the same gateway request instead of creating a second order. One-off
//! operations get a fresh random id.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::foundation::ValidationError;

/// Longest request id the gateway accepts.
pub const MAX_REQUEST_ID_LEN: usize = 36;

/// Stable id for a `(cart_id, user_id)` pair.
///
/// Lowercase hex SHA-256 of `"{cart_id}:{user_id}"`, truncated to 36 chars.
/// Empty inputs are rejected rather than hashed.
pub fn build_deterministic_request_id(
    cart_id: &str,
    user_id: &str,
) -> Result<String, ValidationError> {
    if cart_id.trim().is_empty() {
        return Err(ValidationError::empty_field("cart_id"));
    }
    if user_id.trim().is_empty() {
        return Err(ValidationError::empty_field("user_id"));
    }

    let digest = Sha256::digest(format!("{}:{}", cart_id, user_id).as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(MAX_REQUEST_ID_LEN);
    Ok(id)
}

/// Fresh random id for operations that must never be deduplicated.
pub fn generate_unique_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Format check: 1..=36 chars of `[A-Za-z0-9-]`.
pub fn is_valid_request_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}
