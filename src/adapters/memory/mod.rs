//! In-memory storage adapters for tests and local runs.
//!
//! One `InMemoryStore` implements every storage port over a single lock, so
//! the multi-row writes (`insert_and_grant`, `update_and_grant`) are atomic
//! the same way a database transaction is. State is lost on restart.

mod purchases;
mod subscriptions;
mod users;
mod webhook_events;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{PurchaseId, SubscriptionId, UserId};
use crate::domain::payment::Purchase;
use crate::domain::subscription::Subscription;
use crate::domain::webhook::WebhookEvent;
use crate::ports::UserAccount;

#[derive(Debug, Default)]
struct StoreState {
    purchases: HashMap<PurchaseId, Purchase>,
    subscriptions: HashMap<SubscriptionId, Subscription>,
    users: HashMap<UserId, UserAccount>,
    /// Keyed by gateway event id.
    webhook_events: HashMap<String, WebhookEvent>,
}

/// Shared in-memory store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subscriptions stored for a purchase.
    pub async fn subscription_count_for(&self, purchase_id: &PurchaseId) -> usize {
        self.state
            .read()
            .await
            .subscriptions
            .values()
            .filter(|s| &s.purchase_id == purchase_id)
            .count()
    }

    pub async fn webhook_event_count(&self) -> usize {
        self.state.read().await.webhook_events.len()
    }
}
