//! MaterializeSubscriptionHandler - turns a completed purchase into a
//! subscription plus the user's entitlement set.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::access::EntitlementSet;
use crate::domain::foundation::{DomainError, Timestamp, ValidationError};
use crate::domain::payment::Purchase;
use crate::domain::subscription::Subscription;
use crate::ports::{InsertOutcome, SubscriptionRepository};

/// Command to materialize the grant for a completed purchase.
#[derive(Debug, Clone)]
pub struct MaterializeSubscriptionCommand {
    pub purchase: Purchase,
}

/// Result of materialization.
#[derive(Debug, Clone)]
pub struct MaterializeSubscriptionResult {
    pub subscription: Subscription,
    /// False when the purchase already had its subscription.
    pub created: bool,
    /// Entitlements written onto the user.
    pub entitlements: EntitlementSet,
}

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("Purchase {0} is not completed")]
    PurchaseNotCompleted(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Handler for subscription materialization.
///
/// Safe to run any number of times for one purchase: the storage layer keeps
/// one subscription per purchase, and a re-run rewrites the user's
/// entitlements from the stored subscriptions. The store recomputes them in
/// the write's own transaction, so grants for several purchases of one user
/// can run concurrently.
pub struct MaterializeSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl MaterializeSubscriptionHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        cmd: MaterializeSubscriptionCommand,
    ) -> Result<MaterializeSubscriptionResult, MaterializeError> {
        let purchase = cmd.purchase;
        let now = Timestamp::now();

        // 1. Only completed purchases grant anything
        if !purchase.is_completed() {
            return Err(MaterializeError::PurchaseNotCompleted(purchase.id.to_string()));
        }

        // 2. Existing subscription: repair entitlements only
        if let Some(existing) = self.subscriptions.find_by_purchase(&purchase.id).await? {
            return self.repair(existing, now).await;
        }

        // 3. New subscription for this purchase
        let subscription = Subscription::activate(&purchase, now)?;

        // 4. Insert and grant in one write
        match self.subscriptions.insert_and_grant(&subscription, now).await? {
            InsertOutcome::Inserted(entitlements) => {
                tracing::info!(
                    purchase_id = %purchase.id,
                    subscription_id = %subscription.id,
                    user_id = %subscription.user_id,
                    plan_type = %subscription.plan_type,
                    period_end = %subscription.current_period_end,
                    "Subscription materialized"
                );
                Ok(MaterializeSubscriptionResult {
                    subscription,
                    created: true,
                    entitlements,
                })
            }
            InsertOutcome::AlreadyExists => {
                // Lost a race with a concurrent materialize for the same purchase
                let existing = self
                    .subscriptions
                    .find_by_purchase(&purchase.id)
                    .await?
                    .ok_or_else(|| {
                        DomainError::database(format!(
                            "subscription for purchase {} vanished after conflict",
                            purchase.id
                        ))
                    })?;
                self.repair(existing, now).await
            }
        }
    }

    async fn repair(
        &self,
        existing: Subscription,
        now: Timestamp,
    ) -> Result<MaterializeSubscriptionResult, MaterializeError> {
        let entitlements = self.subscriptions.update_and_grant(&existing, now).await?;

        tracing::debug!(
            purchase_id = %existing.purchase_id,
            subscription_id = %existing.id,
            "Subscription already materialized, entitlements rewritten"
        );

        Ok(MaterializeSubscriptionResult {
            subscription: existing,
            created: false,
            entitlements,
        })
    }
}
