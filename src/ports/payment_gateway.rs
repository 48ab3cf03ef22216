//! Payment gateway port for order creation and capture.
//!
//! Both calls carry a caller-supplied request id that the gateway uses as
//! an idempotency key, so retrying either call never charges twice.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::{BillingCycle, Money, PlanType};

/// Port for a checkout gateway (PayPal Orders API or equivalent).
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a gateway order for the given amount.
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, GatewayError>;

    /// Captures funds for an approved order.
    ///
    /// Returns `GatewayErrorCode::OrderAlreadyCaptured` when the order was
    /// captured by an earlier call.
    async fn capture_order(
        &self,
        request: CaptureOrderRequest,
    ) -> Result<CaptureResult, GatewayError>;
}

/// Order to open at the gateway.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub amount: Money,
    pub plan_type: PlanType,
    pub billing_cycle: BillingCycle,
    /// Internal reference echoed back by the gateway.
    pub reference_id: String,
    pub description: String,
    /// Idempotency key.
    pub request_id: String,
    pub return_url: String,
    pub cancel_url: String,
}

/// Order as created by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub order_id: String,
    pub status: String,
    pub approve_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CaptureOrderRequest {
    pub order_id: String,
    /// Idempotency key.
    pub request_id: String,
}

/// Capture status as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStatus {
    Completed,
    Pending,
    Declined,
    Other(String),
}

impl CaptureStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "COMPLETED" => CaptureStatus::Completed,
            "PENDING" => CaptureStatus::Pending,
            "DECLINED" | "FAILED" => CaptureStatus::Declined,
            other => CaptureStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CaptureStatus::Completed => "COMPLETED",
            CaptureStatus::Pending => "PENDING",
            CaptureStatus::Declined => "DECLINED",
            CaptureStatus::Other(s) => s,
        }
    }
}

/// Result of a capture call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResult {
    pub order_id: String,
    pub capture_id: String,
    pub status: CaptureStatus,
    pub payer_email: Option<String>,
}

/// Gateway error with categorization and retry info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
    /// Gateway's own error name, e.g. `ORDER_ALREADY_CAPTURED`.
    pub provider_code: Option<String>,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    pub fn timeout() -> Self {
        Self::new(GatewayErrorCode::Timeout, "gateway request timed out")
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::AuthenticationError, message)
    }

    pub fn declined(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Declined, message)
    }

    pub fn already_captured() -> Self {
        Self::new(GatewayErrorCode::OrderAlreadyCaptured, "order already captured")
            .with_provider_code("ORDER_ALREADY_CAPTURED")
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        DomainError::new(ErrorCode::GatewayError, err.message)
            .with_detail("gateway_code", err.code.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayErrorCode {
    /// Connection failure.
    NetworkError,
    /// Call exceeded the configured timeout.
    Timeout,
    /// Gateway answered 5xx.
    ProviderUnavailable,
    /// Credentials rejected.
    AuthenticationError,
    /// Payment declined or order not payable.
    Declined,
    /// Order was captured by an earlier call.
    OrderAlreadyCaptured,
    /// Order unknown to the gateway.
    NotFound,
    /// Gateway rejected the request shape.
    InvalidRequest,
}

impl GatewayErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError
                | GatewayErrorCode::Timeout
                | GatewayErrorCode::ProviderUnavailable
        )
    }
}

impl fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::Timeout => "timeout",
            GatewayErrorCode::ProviderUnavailable => "provider_unavailable",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::Declined => "declined",
            GatewayErrorCode::OrderAlreadyCaptured => "order_already_captured",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::InvalidRequest => "invalid_request",
        };
        write!(f, "{}", s)
    }
}
