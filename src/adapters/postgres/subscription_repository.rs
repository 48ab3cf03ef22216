//! PostgreSQL implementation of SubscriptionRepository.
//!
//! The subscription row and the owner's `user_accounts.entitlements` are
//! written in one transaction, so a crash leaves either both or neither.
//! Each grant first locks the owner's account row (`FOR UPDATE`) and
//! recomputes entitlements from the subscriptions it can then see, so
//! concurrent grants for one user apply one after the other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::access::EntitlementSet;
use crate::domain::foundation::{
    DomainError, ErrorCode, PurchaseId, SubscriptionId, Timestamp, UserId,
};
use crate::domain::subscription::{resolve_entitlements, Subscription};
use crate::ports::{InsertOutcome, SubscriptionRepository};

use super::{corrupt, db_error, entitlements_from_column, entitlements_to_column};

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, purchase_id, plan_type, billing_cycle, status,
           current_period_start, current_period_end, entitlements, cancel_reason,
           canceled_at, created_at
    FROM subscriptions
"#;

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    purchase_id: Uuid,
    plan_type: String,
    billing_cycle: String,
    status: String,
    current_period_start: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    entitlements: Vec<String>,
    cancel_reason: Option<String>,
    canceled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| corrupt("user_id", e))?,
            purchase_id: PurchaseId::from_uuid(row.purchase_id),
            plan_type: row.plan_type.parse().map_err(|e| corrupt("plan_type", e))?,
            billing_cycle: row
                .billing_cycle
                .parse()
                .map_err(|e| corrupt("billing_cycle", e))?,
            status: row.status.parse().map_err(|e| corrupt("status", e))?,
            current_period_start: Timestamp::from_datetime(row.current_period_start),
            current_period_end: Timestamp::from_datetime(row.current_period_end),
            entitlements: entitlements_from_column(row.entitlements),
            cancel_reason: row
                .cancel_reason
                .map(|r| r.parse())
                .transpose()
                .map_err(|e| corrupt("cancel_reason", e))?,
            canceled_at: row.canceled_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

/// Creates the owner's account row if needed and locks it until commit.
async fn lock_account(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &UserId,
    now: Timestamp,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO user_accounts (id, entitlements, updated_at)
        VALUES ($1, '{}', $2)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(user_id.as_str())
    .bind(now.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("create user account", e))?;

    sqlx::query("SELECT id FROM user_accounts WHERE id = $1 FOR UPDATE")
        .bind(user_id.as_str())
        .execute(&mut **tx)
        .await
        .map_err(|e| db_error("lock user account", e))?;
    Ok(())
}

/// Resolves the owner's entitlements from the subscriptions visible inside
/// the transaction and writes them.
async fn regrant(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &UserId,
    now: Timestamp,
) -> Result<EntitlementSet, DomainError> {
    let sql = format!("{} WHERE user_id = $1", SELECT_COLUMNS);
    let rows: Vec<SubscriptionRow> = sqlx::query_as(&sql)
        .bind(user_id.as_str())
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| db_error("list subscriptions", e))?;
    let subscriptions = rows
        .into_iter()
        .map(Subscription::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let entitlements = resolve_entitlements(&subscriptions, now);

    sqlx::query("UPDATE user_accounts SET entitlements = $2, updated_at = $3 WHERE id = $1")
        .bind(user_id.as_str())
        .bind(entitlements_to_column(&entitlements))
        .bind(now.as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| db_error("write entitlements", e))?;
    Ok(entitlements)
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn find_by_purchase(
        &self,
        purchase_id: &PurchaseId,
    ) -> Result<Option<Subscription>, DomainError> {
        let sql = format!("{} WHERE purchase_id = $1", SELECT_COLUMNS);
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(purchase_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find subscription", e))?;
        row.map(Subscription::try_from).transpose()
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        let sql = format!("{} WHERE user_id = $1 ORDER BY created_at", SELECT_COLUMNS);
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list subscriptions", e))?;
        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn insert_and_grant(
        &self,
        subscription: &Subscription,
        now: Timestamp,
    ) -> Result<InsertOutcome, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin transaction", e))?;
        lock_account(&mut tx, &subscription.user_id, now).await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, purchase_id, plan_type, billing_cycle, status,
                current_period_start, current_period_end, entitlements, cancel_reason,
                canceled_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (purchase_id) DO NOTHING
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_str())
        .bind(subscription.purchase_id.as_uuid())
        .bind(subscription.plan_type.as_str())
        .bind(subscription.billing_cycle.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.current_period_start.as_datetime())
        .bind(subscription.current_period_end.as_datetime())
        .bind(entitlements_to_column(&subscription.entitlements))
        .bind(subscription.cancel_reason.map(|r| r.as_str()))
        .bind(subscription.canceled_at.map(|t| *t.as_datetime()))
        .bind(subscription.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("insert subscription", e))?;

        if inserted.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| db_error("roll back transaction", e))?;
            return Ok(InsertOutcome::AlreadyExists);
        }

        let entitlements = regrant(&mut tx, &subscription.user_id, now).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("commit subscription", e))?;
        Ok(InsertOutcome::Inserted(entitlements))
    }

    async fn update_and_grant(
        &self,
        subscription: &Subscription,
        now: Timestamp,
    ) -> Result<EntitlementSet, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin transaction", e))?;
        lock_account(&mut tx, &subscription.user_id, now).await?;

        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = $2, cancel_reason = $3, canceled_at = $4
            WHERE id = $1
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.status.as_str())
        .bind(subscription.cancel_reason.map(|r| r.as_str()))
        .bind(subscription.canceled_at.map(|t| *t.as_datetime()))
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("update subscription", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("subscription {} not found", subscription.id),
            ));
        }

        let entitlements = regrant(&mut tx, &subscription.user_id, now).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("commit subscription", e))?;
        Ok(entitlements)
    }

    async fn list_lapsed(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<Subscription>, DomainError> {
        let sql = format!(
            "{} WHERE status = 'active' AND current_period_end <= $1 ORDER BY current_period_end LIMIT $2",
            SELECT_COLUMNS
        );
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(now.as_datetime())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list lapsed subscriptions", e))?;
        rows.into_iter().map(Subscription::try_from).collect()
    }
}
