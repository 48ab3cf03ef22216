//! Webhook error types.
//!
//! Status mapping drives gateway retry behaviour: 4xx stops retries, 5xx
//! asks the gateway to deliver again.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur during webhook verification and processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Authenticity check failed or could not be performed.
    #[error("Webhook verification failed: {0}")]
    InvalidSignature(String),

    /// Payload is not a parseable gateway event.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from the payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The purchase the event refers to does not exist (yet).
    #[error("Purchase not found: {0}")]
    PurchaseNotFound(String),

    /// Stored state does not allow the requested change.
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    /// Storage operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Downstream processing failed for another reason.
    #[error("Processing failed: {0}")]
    Processing(String),
}

impl WebhookError {
    /// True if redelivery may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Database(_)
                | WebhookError::PurchaseNotFound(_)
                | WebhookError::Processing(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature(_)
            | WebhookError::ParseError(_)
            | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,

            WebhookError::PurchaseNotFound(_)
            | WebhookError::InvalidTransition(_)
            | WebhookError::Database(_)
            | WebhookError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for failures detected before any state was touched.
    pub fn is_rejection(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Error code and fixed message for a response body. Never carries the
    /// underlying detail, which can include gateway API errors.
    pub fn public_message(&self) -> (&'static str, &'static str) {
        match self {
            WebhookError::InvalidSignature(_) => {
                ("INVALID_WEBHOOK_SIGNATURE", "Invalid webhook signature")
            }
            WebhookError::ParseError(_) | WebhookError::MissingField(_) => {
                ("INVALID_WEBHOOK_PAYLOAD", "Invalid webhook payload")
            }
            WebhookError::PurchaseNotFound(_)
            | WebhookError::InvalidTransition(_)
            | WebhookError::Database(_)
            | WebhookError::Processing(_) => {
                ("WEBHOOK_PROCESSING_FAILED", "Webhook processing failed")
            }
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        if err.is_not_found() {
            WebhookError::PurchaseNotFound(err.message)
        } else {
            WebhookError::Database(err.to_string())
        }
    }
}
