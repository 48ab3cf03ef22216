//! PostgreSQL adapters - Database implementations for storage ports.
//!
//! - `PostgresPurchaseRepository` - Purchases with conditional status updates
//! - `PostgresSubscriptionRepository` - Subscriptions and transactional grants
//! - `PostgresUserAccountRepository` - Entitlement sets on user accounts
//! - `PostgresWebhookEventStore` - Deduplicated webhook records

mod purchase_repository;
mod subscription_repository;
mod user_account_repository;
mod webhook_event_store;

pub use purchase_repository::PostgresPurchaseRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use user_account_repository::PostgresUserAccountRepository;
pub use webhook_event_store::PostgresWebhookEventStore;

use crate::domain::access::{Entitlement, EntitlementSet};
use crate::domain::foundation::{DomainError, ErrorCode};

/// Applies pending migrations from `migrations/`.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, e))
}

/// Maps an unparseable stored value to a database error.
fn corrupt(column: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} value: {}", column, err),
    )
}

fn entitlements_to_column(set: &EntitlementSet) -> Vec<String> {
    set.iter().map(|e| e.as_str().to_string()).collect()
}

/// Unknown tokens grant nothing and are skipped.
fn entitlements_from_column(values: Vec<String>) -> EntitlementSet {
    values
        .iter()
        .filter_map(|v| match v.parse::<Entitlement>() {
            Ok(e) => Some(e),
            Err(_) => {
                tracing::warn!(token = %v, "Ignoring unknown stored entitlement");
                None
            }
        })
        .collect()
}
