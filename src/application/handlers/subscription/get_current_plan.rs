//! GetCurrentPlanHandler - query handler for the caller's live plan.

use std::sync::Arc;

use crate::domain::access::{
    entitlement_for_tier, features_for, tier_for_set, EntitlementSet, PlanLimits, PlanTier,
};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::subscription::Subscription;
use crate::ports::{SubscriptionRepository, UserAccountRepository};

/// Query for the current plan of a user.
#[derive(Debug, Clone)]
pub struct GetCurrentPlanQuery {
    pub user_id: UserId,
}

/// The caller's plan, resolved from stored entitlements.
#[derive(Debug, Clone)]
pub struct CurrentPlan {
    pub user_id: UserId,
    pub tier: PlanTier,
    pub entitlements: EntitlementSet,
    /// Customer-facing plan name (Junior, Intermediate, Senior, Bundle).
    pub display_name: &'static str,
    pub features: &'static [&'static str],
    pub limits: PlanLimits,
    /// The current subscription granting a paid tier, if any.
    pub subscription: Option<Subscription>,
    pub days_remaining: Option<i64>,
}

pub struct GetCurrentPlanHandler {
    users: Arc<dyn UserAccountRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl GetCurrentPlanHandler {
    pub fn new(
        users: Arc<dyn UserAccountRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            users,
            subscriptions,
        }
    }

    pub async fn handle(&self, query: GetCurrentPlanQuery) -> Result<CurrentPlan, DomainError> {
        let now = Timestamp::now();

        // Entitlements are read on every call, never from the session
        let entitlements = self.users.entitlements(&query.user_id).await?;
        let tier = tier_for_set(&entitlements);

        let subscription = self
            .subscriptions
            .list_for_user(&query.user_id)
            .await?
            .into_iter()
            .filter(|s| s.is_current(now) && s.tier() == tier)
            .max_by_key(|s| s.current_period_end);
        let days_remaining = subscription.as_ref().map(|s| s.days_remaining(now));

        Ok(CurrentPlan {
            user_id: query.user_id,
            tier,
            entitlements,
            display_name: entitlement_for_tier(tier).display_name(),
            features: features_for(tier),
            limits: PlanLimits::for_tier(tier),
            subscription,
            days_remaining,
        })
    }
}
