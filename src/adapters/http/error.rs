//! API error type shared by the route handlers.
//!
//! Every non-guard error is rendered as `{success:false, error, code}`.
//! 5xx bodies carry a generic message; the detail goes to the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::application::handlers::{CaptureOrderError, CreateOrderError, RetryWebhookError};
use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.into(),
        }
    }
}

/// HTTP-facing error.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    /// Logs `detail` and returns a body-safe 500.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Request failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            INTERNAL_MESSAGE,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.code, self.message))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => Self::bad_request(err.message),
            ErrorCode::Conflict => Self::conflict("CONFLICT", err.message),
            _ if err.is_not_found() => Self::not_found("NOT_FOUND", err.message),
            _ => Self::internal(err),
        }
    }
}

impl From<CreateOrderError> for ApiError {
    fn from(err: CreateOrderError) -> Self {
        match err {
            CreateOrderError::Validation(e) => e.into(),
            CreateOrderError::Gateway(e) => Self::internal(e),
            err @ CreateOrderError::CartSettled { .. } => {
                Self::conflict("CART_ALREADY_SETTLED", err.to_string())
            }
            CreateOrderError::Domain(e) if e.code == ErrorCode::ValidationFailed => e.into(),
            CreateOrderError::Domain(e) => Self::internal(e),
        }
    }
}

impl From<CaptureOrderError> for ApiError {
    fn from(err: CaptureOrderError) -> Self {
        match err {
            CaptureOrderError::OrderNotFound(order_id) => {
                Self::not_found("ORDER_NOT_FOUND", format!("Order not found: {}", order_id))
            }
            CaptureOrderError::NotCapturable { order_id, status } => Self::conflict(
                "ORDER_NOT_CAPTURABLE",
                format!("Order {} cannot be captured ({})", order_id, status),
            ),
            CaptureOrderError::CaptureFailed(e) => {
                tracing::warn!(error = %e, "Payment capture declined");
                Self::new(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "PAYMENT_FAILED",
                    "Payment capture failed",
                )
            }
            CaptureOrderError::Validation(e) => e.into(),
            CaptureOrderError::GatewayUnavailable(e) => Self::internal(e),
            CaptureOrderError::Materialize(e) => Self::internal(e),
            CaptureOrderError::Domain(e) => Self::internal(e),
        }
    }
}

impl From<RetryWebhookError> for ApiError {
    fn from(err: RetryWebhookError) -> Self {
        match err {
            RetryWebhookError::NotFound(id) => Self::not_found(
                "WEBHOOK_EVENT_NOT_FOUND",
                format!("Webhook event not found: {}", id),
            ),
            e @ RetryWebhookError::NotRetryable { .. } => {
                Self::conflict("WEBHOOK_EVENT_NOT_RETRYABLE", e.to_string())
            }
            RetryWebhookError::Domain(e) => Self::internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PurchaseStatus;
    use crate::ports::GatewayError;

    async fn body(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn body_shape_is_success_error_code() {
        let (status, json) = body(ApiError::bad_request("bad currency")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "bad currency");
        assert_eq!(json["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn internal_errors_hide_detail() {
        let err: ApiError = DomainError::database("password=hunter2 connection refused").into();
        let (status, json) = body(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], INTERNAL_MESSAGE);
        assert!(!json.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn gateway_timeout_on_create_is_generic_500() {
        let err: ApiError = CreateOrderError::Gateway(GatewayError::timeout()).into();
        let (status, json) = body(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!json["error"].as_str().unwrap().contains("timed out"));
    }

    #[test]
    fn capture_errors_map_to_status() {
        let not_found: ApiError = CaptureOrderError::OrderNotFound("O-1".into()).into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);

        let failed: ApiError = CaptureOrderError::NotCapturable {
            order_id: "O-1".into(),
            status: PurchaseStatus::Failed,
        }
        .into();
        assert_eq!(failed.status, StatusCode::CONFLICT);

        let declined: ApiError =
            CaptureOrderError::CaptureFailed(GatewayError::declined("INSTRUMENT_DECLINED")).into();
        assert_eq!(declined.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(declined.code, "PAYMENT_FAILED");

        let transient: ApiError =
            CaptureOrderError::GatewayUnavailable(GatewayError::timeout()).into();
        assert_eq!(transient.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn settled_cart_is_409() {
        let err: ApiError = CreateOrderError::CartSettled {
            order_id: "O-1".into(),
            status: PurchaseStatus::Completed,
        }
        .into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "CART_ALREADY_SETTLED");
    }

    #[test]
    fn validation_errors_are_400() {
        let err: ApiError = ValidationError::unsupported("currency", "EUR").into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
