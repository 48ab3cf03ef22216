//! Wire types for the PayPal REST API.
//!
//! Only the fields this service reads are modeled; everything else in the
//! responses is ignored by serde.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::ports::{
    CaptureResult, CaptureStatus, CreateOrderRequest, GatewayError, GatewayErrorCode,
};

/// `POST /v1/oauth2/token` response.
#[derive(Debug, Deserialize)]
pub(super) struct AccessTokenResponse {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub(super) struct Link {
    pub href: String,
    pub rel: String,
}

/// `POST /v2/checkout/orders` response.
#[derive(Debug, Deserialize)]
pub(super) struct OrderResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl OrderResponse {
    /// The buyer approval link, present for orders awaiting approval.
    pub fn approve_url(&self) -> Option<String> {
        self.links
            .iter()
            .find(|l| l.rel == "approve" || l.rel == "payer-action")
            .map(|l| l.href.clone())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CaptureResponse {
    pub id: String,
    #[serde(default)]
    pub purchase_units: Vec<CapturedUnit>,
    pub payer: Option<Payer>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CapturedUnit {
    pub payments: Option<UnitPayments>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UnitPayments {
    #[serde(default)]
    pub captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Capture {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct Payer {
    pub email_address: Option<String>,
}

impl CaptureResponse {
    /// Reads the first capture of the first purchase unit.
    pub fn into_capture_result(self) -> Result<CaptureResult, GatewayError> {
        let capture = self
            .purchase_units
            .into_iter()
            .next()
            .and_then(|unit| unit.payments)
            .and_then(|payments| payments.captures.into_iter().next())
            .ok_or_else(|| {
                GatewayError::new(
                    GatewayErrorCode::InvalidRequest,
                    "PayPal capture response carried no capture",
                )
            })?;

        Ok(CaptureResult {
            order_id: self.id,
            capture_id: capture.id,
            status: CaptureStatus::parse(&capture.status),
            payer_email: self.payer.and_then(|p| p.email_address),
        })
    }
}

/// Error body returned on 4xx.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorDetail {
    pub issue: String,
    pub description: Option<String>,
}

impl ErrorBody {
    /// Most specific error name: the first detail issue, else the top-level name.
    pub fn issue(&self) -> Option<&str> {
        self.details
            .first()
            .map(|d| d.issue.as_str())
            .or(if self.name.is_empty() {
                None
            } else {
                Some(self.name.as_str())
            })
    }
}

/// Maps a non-success response to a categorized gateway error.
pub(super) fn error_from_response(status: u16, body: &str) -> GatewayError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let issue = parsed.issue().map(str::to_string);
    let message = if parsed.message.is_empty() {
        format!("PayPal API error (HTTP {})", status)
    } else {
        parsed.message.clone()
    };

    if issue.as_deref() == Some("ORDER_ALREADY_CAPTURED") {
        return GatewayError::already_captured();
    }

    let code = match status {
        401 | 403 => GatewayErrorCode::AuthenticationError,
        404 => GatewayErrorCode::NotFound,
        422 => GatewayErrorCode::Declined,
        429 | 500..=599 => GatewayErrorCode::ProviderUnavailable,
        _ => GatewayErrorCode::InvalidRequest,
    };

    let error = GatewayError::new(code, message);
    match issue {
        Some(issue) => error.with_provider_code(issue),
        None => error,
    }
}

/// Body for `POST /v2/checkout/orders`.
pub(super) fn order_body(request: &CreateOrderRequest) -> Value {
    let currency = request.amount.currency().as_str();
    let value = request.amount.to_decimal_string();

    json!({
        "intent": "CAPTURE",
        "purchase_units": [{
            "reference_id": request.reference_id,
            "description": request.description,
            "custom_id": request.reference_id,
            "amount": {
                "currency_code": currency,
                "value": value,
                "breakdown": {
                    "item_total": { "currency_code": currency, "value": value }
                }
            },
            "items": [{
                "name": format!("{} Plan - {}", request.plan_type, request.billing_cycle),
                "quantity": "1",
                "category": "DIGITAL_GOODS",
                "unit_amount": { "currency_code": currency, "value": value }
            }]
        }],
        "application_context": {
            "return_url": request.return_url,
            "cancel_url": request.cancel_url,
            "shipping_preference": "NO_SHIPPING",
            "user_action": "PAY_NOW"
        }
    })
}

/// Body for `POST /v1/notifications/verify-webhook-signature`.
#[derive(Debug, Serialize)]
pub(super) struct VerifySignatureRequest<'a> {
    pub auth_algo: &'a str,
    pub cert_url: &'a str,
    pub transmission_id: &'a str,
    pub transmission_sig: &'a str,
    pub transmission_time: &'a str,
    pub webhook_id: &'a str,
    pub webhook_event: &'a Value,
}

#[derive(Debug, Deserialize)]
pub(super) struct VerifySignatureResponse {
    pub verification_status: String,
}
