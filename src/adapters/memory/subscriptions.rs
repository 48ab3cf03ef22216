use async_trait::async_trait;

use crate::domain::access::EntitlementSet;
use crate::domain::foundation::{DomainError, ErrorCode, PurchaseId, Timestamp, UserId};
use crate::domain::subscription::{resolve_entitlements, Subscription};
use crate::ports::{InsertOutcome, SubscriptionRepository};

use super::users::write_entitlements;
use super::{InMemoryStore, StoreState};

/// Recomputes and stores the user's entitlements. Callers hold the write lock.
fn regrant(state: &mut StoreState, user_id: &UserId, now: Timestamp) -> EntitlementSet {
    let owned: Vec<Subscription> = state
        .subscriptions
        .values()
        .filter(|s| &s.user_id == user_id)
        .cloned()
        .collect();
    let entitlements = resolve_entitlements(&owned, now);
    write_entitlements(state, user_id, &entitlements, now);
    entitlements
}

#[async_trait]
impl SubscriptionRepository for InMemoryStore {
    async fn find_by_purchase(
        &self,
        purchase_id: &PurchaseId,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .subscriptions
            .values()
            .find(|s| &s.purchase_id == purchase_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        let state = self.state.read().await;
        let mut subs: Vec<Subscription> = state
            .subscriptions
            .values()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        subs.sort_by_key(|s| s.created_at);
        Ok(subs)
    }

    async fn insert_and_grant(
        &self,
        subscription: &Subscription,
        now: Timestamp,
    ) -> Result<InsertOutcome, DomainError> {
        let mut state = self.state.write().await;
        let exists = state
            .subscriptions
            .values()
            .any(|s| s.purchase_id == subscription.purchase_id);
        if exists {
            return Ok(InsertOutcome::AlreadyExists);
        }
        state
            .subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(InsertOutcome::Inserted(regrant(
            &mut state,
            &subscription.user_id,
            now,
        )))
    }

    async fn update_and_grant(
        &self,
        subscription: &Subscription,
        now: Timestamp,
    ) -> Result<EntitlementSet, DomainError> {
        let mut state = self.state.write().await;
        if !state.subscriptions.contains_key(&subscription.id) {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("subscription {} not found", subscription.id),
            ));
        }
        state
            .subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(regrant(&mut state, &subscription.user_id, now))
    }

    async fn list_lapsed(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<Subscription>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .values()
            .filter(|s| s.is_lapsed(now))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::Entitlement;
    use crate::domain::payment::{
        BillingCycle, Currency, Gateway, Money, NewPurchase, PlanType, Purchase,
    };
    use crate::ports::UserAccountRepository;

    fn completed_purchase() -> Purchase {
        let mut p = Purchase::pending(
            NewPurchase {
                gateway: Gateway::Paypal,
                gateway_order_id: "ORDER-1".to_string(),
                user_id: UserId::new("u1").unwrap(),
                amount: Money::new(Currency::Usd, 2_200).unwrap(),
                plan_type: PlanType::Senior,
                billing_cycle: BillingCycle::Monthly,
                request_id: "req".to_string(),
            },
            Timestamp::now(),
        )
        .unwrap();
        p.complete("CAP-1", None, Timestamp::now()).unwrap();
        p
    }

    #[tokio::test]
    async fn insert_and_grant_is_once_per_purchase() {
        let store = InMemoryStore::new();
        let purchase = completed_purchase();
        let grant = EntitlementSet::from([Entitlement::Senior]);
        let now = Timestamp::now();

        let first = Subscription::activate(&purchase, now).unwrap();
        let second = Subscription::activate(&purchase, now).unwrap();

        assert_eq!(
            store.insert_and_grant(&first, now).await.unwrap(),
            InsertOutcome::Inserted(grant.clone())
        );
        assert_eq!(
            store.insert_and_grant(&second, now).await.unwrap(),
            InsertOutcome::AlreadyExists
        );
        assert_eq!(store.subscription_count_for(&purchase.id).await, 1);
        assert_eq!(
            store.entitlements(&purchase.user_id).await.unwrap(),
            grant
        );
    }

    #[tokio::test]
    async fn lapsed_lists_only_active_past_end() {
        let store = InMemoryStore::new();
        let purchase = completed_purchase();
        let sub = Subscription::activate(&purchase, Timestamp::now()).unwrap();
        store.insert_and_grant(&sub, Timestamp::now()).await.unwrap();

        assert!(store.list_lapsed(Timestamp::now(), 10).await.unwrap().is_empty());
        let later = Timestamp::now().add_days(40);
        assert_eq!(store.list_lapsed(later, 10).await.unwrap().len(), 1);
    }
}
