//! Subscription aggregate: the durable grant behind a user's entitlements.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::access::{EntitlementSet, PlanTier};
use crate::domain::foundation::{
    PurchaseId, StateMachine, SubscriptionId, Timestamp, UserId, ValidationError,
};
use crate::domain::payment::{BillingCycle, PlanType, Purchase, PurchaseStatus};

/// Lifecycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            "expired" => Ok(SubscriptionStatus::Expired),
            _ => Err(ValidationError::unsupported("subscription_status", s)),
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn successors(&self) -> &'static [Self] {
        use SubscriptionStatus::*;
        match self {
            Active => &[Canceled, Expired],
            Canceled | Expired => &[],
        }
    }
}

/// Why a subscription was canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    UserRequest,
    PaymentFailed,
    AdminAction,
    Fraud,
    Refund,
    Other,
}

impl CancelReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelReason::UserRequest => "user_request",
            CancelReason::PaymentFailed => "payment_failed",
            CancelReason::AdminAction => "admin_action",
            CancelReason::Fraud => "fraud",
            CancelReason::Refund => "refund",
            CancelReason::Other => "other",
        }
    }
}

impl FromStr for CancelReason {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_request" => Ok(CancelReason::UserRequest),
            "payment_failed" => Ok(CancelReason::PaymentFailed),
            "admin_action" => Ok(CancelReason::AdminAction),
            "fraud" => Ok(CancelReason::Fraud),
            "refund" => Ok(CancelReason::Refund),
            "other" => Ok(CancelReason::Other),
            _ => Err(ValidationError::unsupported("cancel_reason", s)),
        }
    }
}

/// End of a billing period that starts at `start`.
///
/// Calendar arithmetic: monthly adds one calendar month, yearly one calendar
/// year, clamping to the end of shorter months.
pub fn billing_period_end(start: Timestamp, cycle: BillingCycle) -> Result<Timestamp, ValidationError> {
    match cycle {
        BillingCycle::Monthly => start.add_months(1),
        BillingCycle::Yearly => start.add_years(1),
    }
}

/// Durable grant derived from one completed purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    /// Originating purchase. One subscription per purchase.
    pub purchase_id: PurchaseId,
    pub plan_type: PlanType,
    pub billing_cycle: BillingCycle,
    pub status: SubscriptionStatus,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
    pub entitlements: EntitlementSet,
    pub cancel_reason: Option<CancelReason>,
    pub canceled_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Subscription {
    /// Starts a subscription for a completed purchase.
    pub fn activate(purchase: &Purchase, now: Timestamp) -> Result<Self, ValidationError> {
        if purchase.status != PurchaseStatus::Completed {
            return Err(ValidationError::invalid_format(
                "purchase_status",
                format!("expected completed purchase, got {}", purchase.status),
            ));
        }
        Ok(Self {
            id: SubscriptionId::new(),
            user_id: purchase.user_id.clone(),
            purchase_id: purchase.id,
            plan_type: purchase.plan_type,
            billing_cycle: purchase.billing_cycle,
            status: SubscriptionStatus::Active,
            current_period_start: now,
            current_period_end: billing_period_end(now, purchase.billing_cycle)?,
            entitlements: purchase.plan_type.entitlements(),
            cancel_reason: None,
            canceled_at: None,
            created_at: now,
        })
    }

    /// Active and inside its period: `start <= now < end`.
    pub fn is_current(&self, now: Timestamp) -> bool {
        self.status == SubscriptionStatus::Active
            && !now.is_before(&self.current_period_start)
            && now.is_before(&self.current_period_end)
    }

    /// Whole days left in the period, zero once ended.
    pub fn days_remaining(&self, now: Timestamp) -> i64 {
        if !self.is_current(now) {
            return 0;
        }
        self.current_period_end.duration_since(&now).num_days().max(0)
    }

    /// Active but past its period end.
    pub fn is_lapsed(&self, now: Timestamp) -> bool {
        self.status == SubscriptionStatus::Active && !now.is_before(&self.current_period_end)
    }

    pub fn tier(&self) -> PlanTier {
        self.plan_type.tier()
    }

    pub fn cancel(&mut self, reason: CancelReason, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(SubscriptionStatus::Canceled)?;
        self.cancel_reason = Some(reason);
        self.canceled_at = Some(now);
        Ok(())
    }

    pub fn expire(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(SubscriptionStatus::Expired)?;
        Ok(())
    }
}

/// Entitlements a user should hold given all their subscriptions.
///
/// Only one subscription drives the result: the current one with the highest
/// tier, ties broken by the later period end. No current subscription means
/// an empty set, which resolves to the free tier.
pub fn resolve_entitlements(subscriptions: &[Subscription], now: Timestamp) -> EntitlementSet {
    subscriptions
        .iter()
        .filter(|s| s.is_current(now))
        .max_by(|a, b| {
            a.tier()
                .cmp(&b.tier())
                .then_with(|| a.current_period_end.cmp(&b.current_period_end))
        })
        .map(|s| s.entitlements.clone())
        .unwrap_or_default()
}
