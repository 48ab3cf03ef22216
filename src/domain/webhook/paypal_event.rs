//! Gateway webhook payloads.
//!
//! Only fields relevant to reconciliation are captured. Everything else
//! stays in the raw JSON stored with the event record.

use serde::{Deserialize, Serialize};

use super::errors::WebhookError;
use super::event::InboundWebhook;
use crate::domain::payment::Gateway;

/// PayPal webhook event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PayPalWebhookEvent {
    /// Unique event id (`WH-...`).
    pub id: String,

    /// Event type such as `PAYMENT.CAPTURE.COMPLETED`.
    pub event_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// The capture, refund or order the event is about.
    #[serde(default)]
    pub resource: serde_json::Value,
}

/// PayPal event types we act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayPalEventType {
    CaptureCompleted,
    CaptureDenied,
    CaptureRefunded,
    Unknown,
}

impl PayPalEventType {
    pub fn parse(s: &str) -> Self {
        match s {
            "PAYMENT.CAPTURE.COMPLETED" => Self::CaptureCompleted,
            "PAYMENT.CAPTURE.DENIED" => Self::CaptureDenied,
            "PAYMENT.CAPTURE.REFUNDED" => Self::CaptureRefunded,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CaptureCompleted => "PAYMENT.CAPTURE.COMPLETED",
            Self::CaptureDenied => "PAYMENT.CAPTURE.DENIED",
            Self::CaptureRefunded => "PAYMENT.CAPTURE.REFUNDED",
            Self::Unknown => "unknown",
        }
    }
}

impl PayPalWebhookEvent {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, WebhookError> {
        let event: Self = serde_json::from_value(value.clone())
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;
        if event.id.trim().is_empty() {
            return Err(WebhookError::MissingField("id"));
        }
        if event.event_type.trim().is_empty() {
            return Err(WebhookError::MissingField("event_type"));
        }
        Ok(event)
    }

    pub fn parsed_type(&self) -> PayPalEventType {
        PayPalEventType::parse(&self.event_type)
    }

    /// `resource.id`: the capture id on capture events.
    pub fn resource_id(&self) -> Option<&str> {
        self.resource.get("id").and_then(|v| v.as_str())
    }

    /// `resource.supplementary_data.related_ids.order_id`.
    pub fn related_order_id(&self) -> Option<&str> {
        self.resource
            .pointer("/supplementary_data/related_ids/order_id")
            .and_then(|v| v.as_str())
    }

    /// Capture a refund points back to: last path segment of the `rel="up"` link.
    pub fn refunded_capture_id(&self) -> Option<&str> {
        self.resource
            .get("links")
            .and_then(|v| v.as_array())?
            .iter()
            .find(|link| link.get("rel").and_then(|r| r.as_str()) == Some("up"))
            .and_then(|link| link.get("href"))
            .and_then(|h| h.as_str())
            .and_then(|href| href.trim_end_matches('/').rsplit('/').next())
            .filter(|id| !id.is_empty())
    }
}

/// Minimal envelope shared by APS and HyperPay callbacks.
#[derive(Debug, Clone, Deserialize)]
pub struct GenericWebhookEnvelope {
    pub id: String,
    #[serde(alias = "eventType")]
    pub event_type: String,
}

/// Reduces a raw body to the record-keeping shape for `gateway`.
pub fn parse_inbound(gateway: Gateway, body: &[u8]) -> Result<InboundWebhook, WebhookError> {
    let payload: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| WebhookError::ParseError(e.to_string()))?;

    let (event_id, event_type) = match gateway {
        Gateway::Paypal => {
            let event = PayPalWebhookEvent::from_value(&payload)?;
            (event.id, event.event_type)
        }
        Gateway::Aps | Gateway::Hyperpay => {
            let env: GenericWebhookEnvelope = serde_json::from_value(payload.clone())
                .map_err(|e| WebhookError::ParseError(e.to_string()))?;
            if env.id.trim().is_empty() {
                return Err(WebhookError::MissingField("id"));
            }
            (env.id, env.event_type)
        }
    };

    Ok(InboundWebhook {
        event_id,
        event_type,
        gateway,
        payload,
    })
}

/// Builder for PayPal test payloads.
#[cfg(test)]
pub struct PayPalEventBuilder {
    id: String,
    event_type: String,
    resource: serde_json::Value,
}

#[cfg(test)]
impl PayPalEventBuilder {
    pub fn new(event_type: PayPalEventType) -> Self {
        Self {
            id: "WH-TEST-1".to_string(),
            event_type: event_type.as_str().to_string(),
            resource: serde_json::json!({}),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn capture(mut self, capture_id: &str, order_id: &str) -> Self {
        self.resource = serde_json::json!({
            "id": capture_id,
            "status": "COMPLETED",
            "supplementary_data": { "related_ids": { "order_id": order_id } }
        });
        self
    }

    pub fn refund_of(mut self, capture_id: &str) -> Self {
        self.resource = serde_json::json!({
            "id": "REFUND-1",
            "links": [
                { "rel": "self", "href": "https://api.paypal.com/v2/payments/refunds/REFUND-1" },
                { "rel": "up", "href": format!("https://api.paypal.com/v2/payments/captures/{}", capture_id) }
            ]
        });
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "event_type": self.event_type,
            "resource_type": "capture",
            "resource": self.resource,
        })
    }
}
