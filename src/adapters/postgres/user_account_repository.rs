//! PostgreSQL implementation of UserAccountRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::access::EntitlementSet;
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::{UserAccount, UserAccountRepository};

use super::{corrupt, db_error, entitlements_from_column, entitlements_to_column};

pub struct PostgresUserAccountRepository {
    pool: PgPool,
}

impl PostgresUserAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserAccountRow {
    id: String,
    email: Option<String>,
    display_name: Option<String>,
    entitlements: Vec<String>,
    updated_at: DateTime<Utc>,
}

#[async_trait]
impl UserAccountRepository for PostgresUserAccountRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<UserAccount>, DomainError> {
        let row: Option<UserAccountRow> = sqlx::query_as(
            r#"
            SELECT id, email, display_name, entitlements, updated_at
            FROM user_accounts
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find user account", e))?;

        row.map(|r| {
            Ok(UserAccount {
                id: UserId::new(r.id).map_err(|e| corrupt("user_id", e))?,
                email: r.email,
                display_name: r.display_name,
                entitlements: entitlements_from_column(r.entitlements),
                updated_at: Timestamp::from_datetime(r.updated_at),
            })
        })
        .transpose()
    }

    async fn set_entitlements(
        &self,
        user_id: &UserId,
        entitlements: &EntitlementSet,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO user_accounts (id, entitlements, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET entitlements = EXCLUDED.entitlements, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id.as_str())
        .bind(entitlements_to_column(entitlements))
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("write entitlements", e))?;
        Ok(())
    }
}
