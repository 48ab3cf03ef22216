//! PostgreSQL implementation of WebhookEventStore.
//!
//! Deduplication rests on the `webhook_events.event_id` unique constraint:
//! `INSERT ... ON CONFLICT (event_id) DO NOTHING` reports a new row to
//! exactly one of any number of concurrent deliveries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, Timestamp, WebhookRecordId};
use crate::domain::webhook::{InboundWebhook, WebhookEvent, WebhookEventStatus};
use crate::ports::{RecordOutcome, WebhookEventStore};

use super::{corrupt, db_error};

pub struct PostgresWebhookEventStore {
    pool: PgPool,
}

impl PostgresWebhookEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    id: Uuid,
    event_id: String,
    event_type: String,
    gateway: String,
    payload: serde_json::Value,
    received_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    status: String,
    error: Option<String>,
    retry_count: i32,
}

impl TryFrom<WebhookEventRow> for WebhookEvent {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        Ok(WebhookEvent {
            id: WebhookRecordId::from_uuid(row.id),
            event_id: row.event_id,
            event_type: row.event_type,
            gateway: row.gateway.parse().map_err(|e| corrupt("gateway", e))?,
            payload: row.payload,
            received_at: Timestamp::from_datetime(row.received_at),
            processed_at: row.processed_at.map(Timestamp::from_datetime),
            status: row
                .status
                .parse::<WebhookEventStatus>()
                .map_err(|e| corrupt("status", e))?,
            error: row.error,
            retry_count: u32::try_from(row.retry_count).unwrap_or(0),
        })
    }
}

#[async_trait]
impl WebhookEventStore for PostgresWebhookEventStore {
    async fn record_if_new(
        &self,
        inbound: &InboundWebhook,
        now: Timestamp,
    ) -> Result<RecordOutcome, DomainError> {
        let record_id = WebhookRecordId::new();
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO webhook_events (id, event_id, event_type, gateway, payload, received_at, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            ON CONFLICT (event_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(record_id.as_uuid())
        .bind(&inbound.event_id)
        .bind(&inbound.event_type)
        .bind(inbound.gateway.as_str())
        .bind(&inbound.payload)
        .bind(now.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("record webhook event", e))?;

        if let Some((id,)) = inserted {
            return Ok(RecordOutcome {
                is_new: true,
                record_id: WebhookRecordId::from_uuid(id),
            });
        }

        let (existing,): (Uuid,) =
            sqlx::query_as("SELECT id FROM webhook_events WHERE event_id = $1")
                .bind(&inbound.event_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_error("load duplicate webhook event", e))?;

        Ok(RecordOutcome {
            is_new: false,
            record_id: WebhookRecordId::from_uuid(existing),
        })
    }

    async fn mark_processed(&self, event_id: &str, now: Timestamp) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_events
            SET status = 'processed', processed_at = $2, error = NULL
            WHERE event_id = $1 AND status = 'pending'
            "#,
        )
        .bind(event_id)
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("mark webhook processed", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_failed(&self, event_id: &str, error: &str) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_events
            SET status = 'failed', error = $2
            WHERE event_id = $1 AND status = 'pending'
            "#,
        )
        .bind(event_id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("mark webhook failed", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn begin_retry(&self, event_id: &str) -> Result<Option<WebhookEvent>, DomainError> {
        let row: Option<WebhookEventRow> = sqlx::query_as(
            r#"
            UPDATE webhook_events
            SET status = 'pending', retry_count = retry_count + 1
            WHERE event_id = $1 AND status = 'failed'
            RETURNING id, event_id, event_type, gateway, payload, received_at, processed_at,
                      status, error, retry_count
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("reopen webhook event", e))?;
        row.map(WebhookEvent::try_from).transpose()
    }

    async fn find(&self, event_id: &str) -> Result<Option<WebhookEvent>, DomainError> {
        let row: Option<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT id, event_id, event_type, gateway, payload, received_at, processed_at,
                   status, error, retry_count
            FROM webhook_events
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find webhook event", e))?;
        row.map(WebhookEvent::try_from).transpose()
    }

    async fn purge_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM webhook_events WHERE received_at < $1")
            .bind(cutoff.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("purge webhook events", e))?;
        Ok(result.rows_affected())
    }
}
