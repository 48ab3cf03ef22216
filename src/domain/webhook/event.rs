//! Recorded webhook deliveries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, Timestamp, ValidationError, WebhookRecordId};
use crate::domain::payment::Gateway;

/// Days a delivery record is kept before it becomes eligible for purge.
pub const DEFAULT_RETENTION_DAYS: u32 = 90;

/// Processing state of a delivery.
///
/// `failed` can be re-opened to `pending` by an operator retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookEventStatus {
    Pending,
    Processed,
    Failed,
}

impl WebhookEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEventStatus::Pending => "pending",
            WebhookEventStatus::Processed => "processed",
            WebhookEventStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for WebhookEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WebhookEventStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WebhookEventStatus::Pending),
            "processed" => Ok(WebhookEventStatus::Processed),
            "failed" => Ok(WebhookEventStatus::Failed),
            _ => Err(ValidationError::unsupported("webhook_status", s)),
        }
    }
}

impl StateMachine for WebhookEventStatus {
    fn successors(&self) -> &'static [Self] {
        use WebhookEventStatus::*;
        match self {
            Pending => &[Processed, Failed],
            // operator retry
            Failed => &[Pending],
            Processed => &[],
        }
    }
}

/// A gateway callback reduced to what the event store needs.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundWebhook {
    /// Gateway-assigned id. The deduplication key.
    pub event_id: String,
    pub event_type: String,
    pub gateway: Gateway,
    pub payload: serde_json::Value,
}

/// One stored delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: WebhookRecordId,
    pub event_id: String,
    pub event_type: String,
    pub gateway: Gateway,
    pub payload: serde_json::Value,
    pub received_at: Timestamp,
    pub processed_at: Option<Timestamp>,
    pub status: WebhookEventStatus,
    pub error: Option<String>,
    pub retry_count: u32,
}

impl WebhookEvent {
    /// Fresh record for a first receipt.
    pub fn received(inbound: InboundWebhook, now: Timestamp) -> Self {
        Self {
            id: WebhookRecordId::new(),
            event_id: inbound.event_id,
            event_type: inbound.event_type,
            gateway: inbound.gateway,
            payload: inbound.payload,
            received_at: now,
            processed_at: None,
            status: WebhookEventStatus::Pending,
            error: None,
            retry_count: 0,
        }
    }

    pub fn mark_processed(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(WebhookEventStatus::Processed)?;
        self.processed_at = Some(now);
        self.error = None;
        Ok(())
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(WebhookEventStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }

    /// Re-opens a failed delivery for another attempt.
    pub fn begin_retry(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(WebhookEventStatus::Pending)?;
        self.retry_count += 1;
        Ok(())
    }

    pub fn as_inbound(&self) -> InboundWebhook {
        InboundWebhook {
            event_id: self.event_id.clone(),
            event_type: self.event_type.clone(),
            gateway: self.gateway,
            payload: self.payload.clone(),
        }
    }
}

/// Records received before the returned instant are eligible for purge.
pub fn retention_cutoff(now: Timestamp, retention_days: u32) -> Timestamp {
    now.minus_days(i64::from(retention_days))
}
