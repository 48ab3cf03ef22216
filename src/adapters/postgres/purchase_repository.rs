//! PostgreSQL implementation of PurchaseRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, PurchaseId, Timestamp, UserId,
};
use crate::domain::payment::{Money, Purchase};
use crate::ports::PurchaseRepository;

use super::{corrupt, db_error};

const SELECT_COLUMNS: &str = r#"
    SELECT id, order_ref, gateway, gateway_order_id, capture_id, user_id, currency,
           amount_minor, plan_type, billing_cycle, status, request_id, payer_email,
           failure_reason, created_at, updated_at
    FROM purchases
"#;

pub struct PostgresPurchaseRepository {
    pool: PgPool,
}

impl PostgresPurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<Purchase>, DomainError> {
        let sql = format!("{} WHERE {} = $1", SELECT_COLUMNS, clause);
        let row: Option<PurchaseRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find purchase", e))?;
        row.map(Purchase::try_from).transpose()
    }

    /// Runs a status transition guarded by the expected current status.
    async fn transition(
        &self,
        sql: &str,
        id: &PurchaseId,
        binds: &[Option<&str>],
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut query = sqlx::query(sql).bind(id.as_uuid()).bind(now.as_datetime());
        for value in binds {
            query = query.bind(*value);
        }
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("update purchase", e))?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    order_ref: String,
    gateway: String,
    gateway_order_id: String,
    capture_id: Option<String>,
    user_id: String,
    currency: String,
    amount_minor: i64,
    plan_type: String,
    billing_cycle: String,
    status: String,
    request_id: String,
    payer_email: Option<String>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let currency = row.currency.parse().map_err(|e| corrupt("currency", e))?;
        Ok(Purchase {
            id: PurchaseId::from_uuid(row.id),
            order_ref: row.order_ref,
            gateway: row.gateway.parse().map_err(|e| corrupt("gateway", e))?,
            gateway_order_id: row.gateway_order_id,
            capture_id: row.capture_id,
            user_id: UserId::new(row.user_id).map_err(|e| corrupt("user_id", e))?,
            amount: Money::new(currency, row.amount_minor).map_err(|e| corrupt("amount", e))?,
            plan_type: row.plan_type.parse().map_err(|e| corrupt("plan_type", e))?,
            billing_cycle: row
                .billing_cycle
                .parse()
                .map_err(|e| corrupt("billing_cycle", e))?,
            status: row.status.parse().map_err(|e| corrupt("status", e))?,
            request_id: row.request_id,
            payer_email: row.payer_email,
            failure_reason: row.failure_reason,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepository {
    async fn insert(&self, purchase: &Purchase) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, order_ref, gateway, gateway_order_id, capture_id, user_id, currency,
                amount_minor, plan_type, billing_cycle, status, request_id, payer_email,
                failure_reason, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(purchase.id.as_uuid())
        .bind(&purchase.order_ref)
        .bind(purchase.gateway.as_str())
        .bind(&purchase.gateway_order_id)
        .bind(&purchase.capture_id)
        .bind(purchase.user_id.as_str())
        .bind(purchase.amount.currency().as_str())
        .bind(purchase.amount.minor_units())
        .bind(purchase.plan_type.as_str())
        .bind(purchase.billing_cycle.as_str())
        .bind(purchase.status.as_str())
        .bind(&purchase.request_id)
        .bind(&purchase.payer_email)
        .bind(&purchase.failure_reason)
        .bind(purchase.created_at.as_datetime())
        .bind(purchase.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return DomainError::new(
                        ErrorCode::Conflict,
                        format!(
                            "purchase for order {} already exists",
                            purchase.gateway_order_id
                        ),
                    );
                }
            }
            db_error("insert purchase", e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, DomainError> {
        let sql = format!("{} WHERE id = $1", SELECT_COLUMNS);
        let row: Option<PurchaseRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find purchase", e))?;
        row.map(Purchase::try_from).transpose()
    }

    async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Purchase>, DomainError> {
        self.fetch_one_where("gateway_order_id", gateway_order_id).await
    }

    async fn find_by_capture_id(&self, capture_id: &str) -> Result<Option<Purchase>, DomainError> {
        self.fetch_one_where("capture_id", capture_id).await
    }

    async fn complete_if_pending(
        &self,
        id: &PurchaseId,
        capture_id: &str,
        payer_email: Option<&str>,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        self.transition(
            r#"
            UPDATE purchases
            SET status = 'completed', updated_at = $2, capture_id = $3,
                payer_email = COALESCE($4, payer_email)
            WHERE id = $1 AND status = 'pending'
            "#,
            id,
            &[Some(capture_id), payer_email],
            now,
        )
        .await
    }

    async fn record_capture_if_pending(
        &self,
        id: &PurchaseId,
        capture_id: &str,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        self.transition(
            r#"
            UPDATE purchases
            SET capture_id = $3, updated_at = $2
            WHERE id = $1 AND status = 'pending'
            "#,
            id,
            &[Some(capture_id)],
            now,
        )
        .await
    }

    async fn fail_if_pending(
        &self,
        id: &PurchaseId,
        reason: &str,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        self.transition(
            r#"
            UPDATE purchases
            SET status = 'failed', failure_reason = $3, updated_at = $2
            WHERE id = $1 AND status = 'pending'
            "#,
            id,
            &[Some(reason)],
            now,
        )
        .await
    }

    async fn refund_if_completed(
        &self,
        id: &PurchaseId,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        self.transition(
            r#"
            UPDATE purchases
            SET status = 'refunded', updated_at = $2
            WHERE id = $1 AND status = 'completed'
            "#,
            id,
            &[],
            now,
        )
        .await
    }
}
