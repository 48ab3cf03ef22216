//! SubscriptionRepository port.
//!
//! Writes that change what a user is entitled to go through the `*_and_grant`
//! methods. They persist the subscription, then recompute the owner's
//! entitlements from every stored subscription and write them, all in one
//! transaction that holds the owner's account row locked. Two grants for one
//! user therefore serialize and neither overwrites the other.

use async_trait::async_trait;

use crate::domain::access::EntitlementSet;
use crate::domain::foundation::{DomainError, PurchaseId, Timestamp, UserId};
use crate::domain::subscription::Subscription;

/// Result of inserting a subscription for a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Subscription stored; the owner's entitlements as written.
    Inserted(EntitlementSet),
    /// The purchase already has a subscription. Nothing was written.
    AlreadyExists,
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn find_by_purchase(
        &self,
        purchase_id: &PurchaseId,
    ) -> Result<Option<Subscription>, DomainError>;

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError>;

    /// Inserts `subscription` unless its purchase already has one, and
    /// rewrites the owner's entitlements as of `now` in the same transaction.
    async fn insert_and_grant(
        &self,
        subscription: &Subscription,
        now: Timestamp,
    ) -> Result<InsertOutcome, DomainError>;

    /// Persists a status change and returns the owner's recomputed
    /// entitlements as of `now`.
    async fn update_and_grant(
        &self,
        subscription: &Subscription,
        now: Timestamp,
    ) -> Result<EntitlementSet, DomainError>;

    /// Active subscriptions whose period ended at or before `now`.
    async fn list_lapsed(&self, now: Timestamp, limit: u32)
        -> Result<Vec<Subscription>, DomainError>;
}
