//! Request and response bodies for the payment endpoints.
//!
//! Field names follow the checkout client: camelCase, with the gateway's
//! `orderID` / `captureID` spelling kept as-is.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{CaptureOrderResult, CreateOrderCommand};
use crate::domain::foundation::{UserId, ValidationError};
use crate::domain::payment::{BillingCycle, Currency, PlanType};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /create-order`.
///
/// Values arrive as strings and are parsed here so an unknown plan or
/// currency becomes a 400 with our error body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub plan_type: Option<String>,
    pub currency: Option<String>,
    pub billing_cycle: Option<String>,
    pub cart_id: Option<String>,
}

impl CreateOrderRequest {
    pub fn into_command(self, user_id: UserId) -> Result<CreateOrderCommand, ValidationError> {
        let plan_type: PlanType = self
            .plan_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ValidationError::empty_field("planType"))?
            .parse()?;
        let currency = match self.currency.as_deref() {
            Some(raw) => raw.parse()?,
            None => Currency::Usd,
        };
        let billing_cycle = match self.billing_cycle.as_deref() {
            Some(raw) => raw.parse()?,
            None => BillingCycle::Monthly,
        };

        Ok(CreateOrderCommand {
            user_id,
            plan_type,
            currency,
            billing_cycle,
            cart_id: self.cart_id.filter(|c| !c.trim().is_empty()),
        })
    }
}

/// Body of `POST /capture-order`.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureOrderRequest {
    #[serde(rename = "orderID")]
    pub order_id: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    #[serde(rename = "orderID")]
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaptureOrderResponse {
    pub success: bool,
    pub status: &'static str,
    #[serde(rename = "captureID")]
    pub capture_id: Option<String>,
    #[serde(rename = "payerEmail", skip_serializing_if = "Option::is_none")]
    pub payer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<CaptureOrderResult> for CaptureOrderResponse {
    fn from(result: CaptureOrderResult) -> Self {
        if result.already_captured {
            return Self {
                success: true,
                status: result.outcome.as_str(),
                capture_id: result.capture_id,
                payer_email: None,
                message: Some("Payment already captured".to_string()),
            };
        }
        Self {
            success: true,
            status: result.outcome.as_str(),
            capture_id: result.capture_id,
            payer_email: result.payer_email,
            message: None,
        }
    }
}

/// Acknowledgement sent back to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[test]
    fn defaults_currency_and_cycle() {
        let request: CreateOrderRequest =
            serde_json::from_str(r#"{"planType":"SENIOR"}"#).unwrap();
        let cmd = request.into_command(user()).unwrap();
        assert_eq!(cmd.plan_type, PlanType::Senior);
        assert_eq!(cmd.currency, Currency::Usd);
        assert_eq!(cmd.billing_cycle, BillingCycle::Monthly);
        assert!(cmd.cart_id.is_none());
    }

    #[test]
    fn parses_all_fields() {
        let request: CreateOrderRequest = serde_json::from_str(
            r#"{"planType":"BUNDLE","currency":"SAR","billingCycle":"yearly","cartId":"cart-9"}"#,
        )
        .unwrap();
        let cmd = request.into_command(user()).unwrap();
        assert_eq!(cmd.plan_type, PlanType::Bundle);
        assert_eq!(cmd.currency, Currency::Sar);
        assert_eq!(cmd.billing_cycle, BillingCycle::Yearly);
        assert_eq!(cmd.cart_id.as_deref(), Some("cart-9"));
    }

    #[test]
    fn missing_plan_type_is_rejected() {
        let request = CreateOrderRequest::default();
        assert!(request.into_command(user()).is_err());
    }

    #[test]
    fn unknown_currency_is_rejected() {
        let request: CreateOrderRequest =
            serde_json::from_str(r#"{"planType":"SENIOR","currency":"EUR"}"#).unwrap();
        assert!(request.into_command(user()).is_err());
    }

    #[test]
    fn capture_request_uses_gateway_spelling() {
        let request: CaptureOrderRequest = serde_json::from_str(r#"{"orderID":"5O190127"}"#).unwrap();
        assert_eq!(request.order_id, "5O190127");
    }

    #[test]
    fn capture_response_omits_absent_fields() {
        let response = CaptureOrderResponse {
            success: true,
            status: "COMPLETED",
            capture_id: Some("CAP-1".to_string()),
            payer_email: None,
            message: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["captureID"], "CAP-1");
        assert!(json.get("payerEmail").is_none());
        assert!(json.get("message").is_none());
    }
}
