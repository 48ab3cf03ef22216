//! ExpireSubscriptionsHandler - sweeps active subscriptions past their period end.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::SubscriptionRepository;

/// Rows examined per storage round trip.
pub const DEFAULT_EXPIRY_BATCH: u32 = 100;

#[derive(Debug, Clone, Copy)]
pub struct ExpireSubscriptionsCommand {
    pub now: Timestamp,
    pub batch_size: u32,
}

impl ExpireSubscriptionsCommand {
    pub fn at(now: Timestamp) -> Self {
        Self {
            now,
            batch_size: DEFAULT_EXPIRY_BATCH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpireSubscriptionsResult {
    pub expired: usize,
}

/// Marks lapsed subscriptions expired and recomputes their owners' entitlements.
pub struct ExpireSubscriptionsHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl ExpireSubscriptionsHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        cmd: ExpireSubscriptionsCommand,
    ) -> Result<ExpireSubscriptionsResult, DomainError> {
        let batch_size = cmd.batch_size.max(1);
        let mut expired = 0;

        loop {
            let lapsed = self.subscriptions.list_lapsed(cmd.now, batch_size).await?;
            let fetched = lapsed.len();

            for mut subscription in lapsed {
                subscription.expire()?;
                self.subscriptions
                    .update_and_grant(&subscription, cmd.now)
                    .await?;

                tracing::info!(
                    subscription_id = %subscription.id,
                    user_id = %subscription.user_id,
                    period_end = %subscription.current_period_end,
                    "Subscription expired"
                );
                expired += 1;
            }

            if fetched < batch_size as usize {
                break;
            }
        }

        Ok(ExpireSubscriptionsResult { expired })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::subscription::{
        MaterializeSubscriptionCommand, MaterializeSubscriptionHandler,
    };
    use crate::domain::access::EntitlementSet;
    use crate::domain::foundation::UserId;
    use crate::domain::payment::{
        BillingCycle, Currency, Gateway, Money, NewPurchase, PlanType, Purchase,
    };
    use crate::domain::subscription::SubscriptionStatus;
    use crate::ports::UserAccountRepository;

    fn completed(user: &str, cycle: BillingCycle) -> Purchase {
        let mut p = Purchase::pending(
            NewPurchase {
                gateway: Gateway::Paypal,
                gateway_order_id: format!("ORDER-{}", uuid::Uuid::new_v4()),
                user_id: UserId::new(user).unwrap(),
                amount: Money::new(Currency::Usd, 1_500).unwrap(),
                plan_type: PlanType::Intermediate,
                billing_cycle: cycle,
                request_id: "req".to_string(),
            },
            Timestamp::now(),
        )
        .unwrap();
        p.complete("CAP", None, Timestamp::now()).unwrap();
        p
    }

    #[tokio::test]
    async fn expires_lapsed_and_clears_entitlements() {
        let store = InMemoryStore::new();
        let purchase = completed("u1", BillingCycle::Monthly);
        MaterializeSubscriptionHandler::new(Arc::new(store.clone()))
            .handle(MaterializeSubscriptionCommand {
                purchase: purchase.clone(),
            })
            .await
            .unwrap();

        let handler = ExpireSubscriptionsHandler::new(Arc::new(store.clone()));

        // Nothing lapsed yet
        let result = handler
            .handle(ExpireSubscriptionsCommand::at(Timestamp::now()))
            .await
            .unwrap();
        assert_eq!(result.expired, 0);

        // Forty days on the monthly period has ended
        let later = Timestamp::now().add_days(40);
        let result = handler
            .handle(ExpireSubscriptionsCommand {
                now: later,
                batch_size: 1,
            })
            .await
            .unwrap();
        assert_eq!(result.expired, 1);

        let subs = store.list_for_user(&purchase.user_id).await.unwrap();
        assert_eq!(subs[0].status, SubscriptionStatus::Expired);
        assert_eq!(
            store.entitlements(&purchase.user_id).await.unwrap(),
            EntitlementSet::new()
        );
    }

    #[tokio::test]
    async fn still_current_subscription_keeps_entitlements() {
        let store = InMemoryStore::new();
        let materialize = MaterializeSubscriptionHandler::new(Arc::new(store.clone()));
        let monthly = completed("u1", BillingCycle::Monthly);
        let yearly = completed("u1", BillingCycle::Yearly);
        for purchase in [monthly, yearly.clone()] {
            materialize
                .handle(MaterializeSubscriptionCommand { purchase })
                .await
                .unwrap();
        }

        let later = Timestamp::now().add_days(40);
        let result = ExpireSubscriptionsHandler::new(Arc::new(store.clone()))
            .handle(ExpireSubscriptionsCommand::at(later))
            .await
            .unwrap();

        assert_eq!(result.expired, 1);
        assert!(!store
            .entitlements(&yearly.user_id)
            .await
            .unwrap()
            .is_empty());
    }
}
