//! WebhookEventStore port - durable, deduplicated record of gateway callbacks.
//!
//! Gateways redeliver on timeouts and 5xx responses, and load balancers can
//! duplicate a delivery. The uniqueness constraint on `event_id` is what
//! decides which delivery gets to run the business effect. Implementations
//! must never emulate it with check-then-insert.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp, WebhookRecordId};
use crate::domain::webhook::{InboundWebhook, WebhookEvent};

/// Outcome of `record_if_new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// True for exactly one caller per `event_id`.
    pub is_new: bool,
    /// Id of the stored record (the existing one for duplicates).
    pub record_id: WebhookRecordId,
}

#[async_trait]
pub trait WebhookEventStore: Send + Sync {
    /// Atomically inserts a `pending` record unless `event_id` is known.
    async fn record_if_new(
        &self,
        inbound: &InboundWebhook,
        now: Timestamp,
    ) -> Result<RecordOutcome, DomainError>;

    /// pending → processed. Returns false if the record was not pending.
    async fn mark_processed(&self, event_id: &str, now: Timestamp) -> Result<bool, DomainError>;

    /// pending → failed with the error recorded. Returns false if the record was not pending.
    async fn mark_failed(&self, event_id: &str, error: &str) -> Result<bool, DomainError>;

    /// failed → pending, incrementing `retry_count`.
    ///
    /// Returns the re-opened record, or `None` if it is missing or not failed.
    async fn begin_retry(&self, event_id: &str) -> Result<Option<WebhookEvent>, DomainError>;

    async fn find(&self, event_id: &str) -> Result<Option<WebhookEvent>, DomainError>;

    /// Deletes records received before `cutoff`. Returns the number removed.
    async fn purge_before(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}
