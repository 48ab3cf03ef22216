use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::webhook::{InboundWebhook, WebhookEvent, WebhookEventStatus};
use crate::ports::{RecordOutcome, WebhookEventStore};

use super::InMemoryStore;

#[async_trait]
impl WebhookEventStore for InMemoryStore {
    async fn record_if_new(
        &self,
        inbound: &InboundWebhook,
        now: Timestamp,
    ) -> Result<RecordOutcome, DomainError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.webhook_events.get(&inbound.event_id) {
            return Ok(RecordOutcome {
                is_new: false,
                record_id: existing.id,
            });
        }
        let event = WebhookEvent::received(inbound.clone(), now);
        let record_id = event.id;
        state.webhook_events.insert(inbound.event_id.clone(), event);
        Ok(RecordOutcome {
            is_new: true,
            record_id,
        })
    }

    async fn mark_processed(&self, event_id: &str, now: Timestamp) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        match state.webhook_events.get_mut(event_id) {
            Some(ev) if ev.status == WebhookEventStatus::Pending => {
                ev.mark_processed(now)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_failed(&self, event_id: &str, error: &str) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        match state.webhook_events.get_mut(event_id) {
            Some(ev) if ev.status == WebhookEventStatus::Pending => {
                ev.mark_failed(error)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn begin_retry(&self, event_id: &str) -> Result<Option<WebhookEvent>, DomainError> {
        let mut state = self.state.write().await;
        match state.webhook_events.get_mut(event_id) {
            Some(ev) if ev.status == WebhookEventStatus::Failed => {
                ev.begin_retry()?;
                Ok(Some(ev.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn find(&self, event_id: &str) -> Result<Option<WebhookEvent>, DomainError> {
        Ok(self.state.read().await.webhook_events.get(event_id).cloned())
    }

    async fn purge_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut state = self.state.write().await;
        let before = state.webhook_events.len();
        state
            .webhook_events
            .retain(|_, ev| !ev.received_at.is_before(&cutoff));
        Ok((before - state.webhook_events.len()) as u64)
    }
}
