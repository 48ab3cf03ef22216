//! Domain error types.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A value failed construction or parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("Field '{field}' has unsupported value '{value}'")]
    UnsupportedValue { field: String, value: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        Self::EmptyField { field: field.into() }
    }

    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        Self::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Value outside a closed set, e.g. an unknown plan name.
    pub fn unsupported(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::EmptyField { field }
            | Self::OutOfRange { field, .. }
            | Self::InvalidFormat { field, .. }
            | Self::UnsupportedValue { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,
    PurchaseNotFound,
    SubscriptionNotFound,
    /// A conditional write lost to a concurrent one, or the row is in the wrong state
    Conflict,
    GatewayError,
    DatabaseError,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::PurchaseNotFound => "PURCHASE_NOT_FOUND",
            ErrorCode::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::GatewayError => "GATEWAY_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by storage ports and domain services.
///
/// `message` may contain internal detail and is logged, never sent to clients
/// for infrastructure codes.
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: BTreeMap<String, String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::PurchaseNotFound | ErrorCode::SubscriptionNotFound
        )
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::validation(err.field().to_string(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_field() {
        assert_eq!(
            ValidationError::empty_field("order_id").to_string(),
            "Field 'order_id' cannot be empty"
        );
        assert_eq!(
            ValidationError::out_of_range("amount_cents", 1, 1_000_000, 0).to_string(),
            "Field 'amount_cents' must be between 1 and 1000000, got 0"
        );
        assert_eq!(
            ValidationError::unsupported("currency", "EUR").to_string(),
            "Field 'currency' has unsupported value 'EUR'"
        );
    }

    #[test]
    fn domain_error_display_leads_with_code() {
        let err = DomainError::new(ErrorCode::PurchaseNotFound, "no purchase for ORDER-1");
        assert_eq!(err.to_string(), "[PURCHASE_NOT_FOUND] no purchase for ORDER-1");
        assert!(err.is_not_found());
        assert!(!DomainError::database("timeout").is_not_found());
    }

    #[test]
    fn validation_error_keeps_its_field_as_detail() {
        let err: DomainError = ValidationError::unsupported("plan_type", "PLATINUM").into();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.details.get("field").map(String::as_str), Some("plan_type"));
        assert!(err.message.contains("PLATINUM"));
    }
}
