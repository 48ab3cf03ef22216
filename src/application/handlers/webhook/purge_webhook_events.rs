//! PurgeWebhookEventsHandler - drops records older than the retention window.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::webhook::retention_cutoff;
use crate::ports::WebhookEventStore;

#[derive(Debug, Clone, Copy)]
pub struct PurgeWebhookEventsCommand {
    pub now: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeWebhookEventsResult {
    pub deleted: u64,
    pub cutoff: Timestamp,
}

/// A delivery redelivered after its record was purged is treated as new.
pub struct PurgeWebhookEventsHandler {
    events: Arc<dyn WebhookEventStore>,
    retention_days: u32,
}

impl PurgeWebhookEventsHandler {
    pub fn new(events: Arc<dyn WebhookEventStore>, retention_days: u32) -> Self {
        Self {
            events,
            retention_days,
        }
    }

    pub async fn handle(
        &self,
        cmd: PurgeWebhookEventsCommand,
    ) -> Result<PurgeWebhookEventsResult, DomainError> {
        let cutoff = retention_cutoff(cmd.now, self.retention_days);
        let deleted = self.events.purge_before(cutoff).await?;
        if deleted > 0 {
            tracing::info!(
                deleted,
                cutoff = %cutoff,
                retention_days = self.retention_days,
                "Purged webhook events"
            );
        }
        Ok(PurgeWebhookEventsResult { deleted, cutoff })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::payment::Gateway;
    use crate::domain::webhook::{InboundWebhook, DEFAULT_RETENTION_DAYS};

    fn inbound(id: &str) -> InboundWebhook {
        InboundWebhook {
            event_id: id.to_string(),
            event_type: "PAYMENT.CAPTURE.COMPLETED".to_string(),
            gateway: Gateway::Paypal,
            payload: serde_json::json!({ "id": id }),
        }
    }

    #[tokio::test]
    async fn purges_only_records_past_retention() {
        let store = InMemoryStore::new();
        let now = Timestamp::now();
        store
            .record_if_new(&inbound("WH-OLD"), now.minus_days(91))
            .await
            .unwrap();
        store
            .record_if_new(&inbound("WH-NEW"), now.minus_days(10))
            .await
            .unwrap();

        let handler = PurgeWebhookEventsHandler::new(Arc::new(store.clone()), DEFAULT_RETENTION_DAYS);
        let result = handler.handle(PurgeWebhookEventsCommand { now }).await.unwrap();

        assert_eq!(result.deleted, 1);
        assert_eq!(store.webhook_event_count().await, 1);
        assert!(store.find("WH-NEW").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn purged_event_is_new_again() {
        let store = InMemoryStore::new();
        let now = Timestamp::now();
        store
            .record_if_new(&inbound("WH-1"), now.minus_days(200))
            .await
            .unwrap();

        PurgeWebhookEventsHandler::new(Arc::new(store.clone()), 90)
            .handle(PurgeWebhookEventsCommand { now })
            .await
            .unwrap();

        let outcome = store.record_if_new(&inbound("WH-1"), now).await.unwrap();
        assert!(outcome.is_new);
    }
}
