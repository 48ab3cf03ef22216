//! Purchase aggregate: one checkout attempt and its lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::foundation::{
    PurchaseId, StateMachine, Timestamp, UserId, ValidationError,
};

use super::{BillingCycle, Gateway, Money, PlanType};

/// Lifecycle of a purchase.
///
/// ```text
/// pending ──► completed ──► refunded
///    │
///    └──────► failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Failed => "failed",
            PurchaseStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PurchaseStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PurchaseStatus::Pending),
            "completed" => Ok(PurchaseStatus::Completed),
            "failed" => Ok(PurchaseStatus::Failed),
            "refunded" => Ok(PurchaseStatus::Refunded),
            _ => Err(ValidationError::unsupported("purchase_status", s)),
        }
    }
}

impl StateMachine for PurchaseStatus {
    fn successors(&self) -> &'static [Self] {
        use PurchaseStatus::*;
        match self {
            Pending => &[Completed, Failed],
            Completed => &[Refunded],
            Failed | Refunded => &[],
        }
    }
}

/// Internal order reference: `ORD-{unix_millis}-{8 uppercase hex}`.
pub fn generate_order_ref(now: Timestamp) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_uppercase();
    format!("ORD-{}-{}", now.as_unix_millis(), suffix)
}

/// One checkout attempt, keyed by the gateway order id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    /// Internal reference shown to support staff.
    pub order_ref: String,
    pub gateway: Gateway,
    /// Order id assigned by the gateway. Unique across purchases.
    pub gateway_order_id: String,
    /// Capture id, known once the gateway captured funds.
    pub capture_id: Option<String>,
    pub user_id: UserId,
    pub amount: Money,
    pub plan_type: PlanType,
    pub billing_cycle: BillingCycle,
    pub status: PurchaseStatus,
    /// Idempotency key sent with the create-order call.
    pub request_id: String,
    pub payer_email: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Inputs for a new pending purchase.
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub gateway: Gateway,
    pub gateway_order_id: String,
    pub user_id: UserId,
    pub amount: Money,
    pub plan_type: PlanType,
    pub billing_cycle: BillingCycle,
    pub request_id: String,
}

impl Purchase {
    /// Creates a purchase in `pending`.
    pub fn pending(new: NewPurchase, now: Timestamp) -> Result<Self, ValidationError> {
        if new.gateway_order_id.trim().is_empty() {
            return Err(ValidationError::empty_field("gateway_order_id"));
        }
        Ok(Self {
            id: PurchaseId::new(),
            order_ref: generate_order_ref(now),
            gateway: new.gateway,
            gateway_order_id: new.gateway_order_id,
            capture_id: None,
            user_id: new.user_id,
            amount: new.amount,
            plan_type: new.plan_type,
            billing_cycle: new.billing_cycle,
            status: PurchaseStatus::Pending,
            request_id: new.request_id,
            payer_email: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_completed(&self) -> bool {
        self.status == PurchaseStatus::Completed
    }

    /// Applies a successful capture.
    pub fn complete(
        &mut self,
        capture_id: impl Into<String>,
        payer_email: Option<String>,
        now: Timestamp,
    ) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(PurchaseStatus::Completed)?;
        self.capture_id = Some(capture_id.into());
        if payer_email.is_some() {
            self.payer_email = payer_email;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Marks the purchase failed with a reason.
    pub fn fail(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(PurchaseStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        self.updated_at = now;
        Ok(())
    }

    /// Marks a completed purchase refunded.
    pub fn refund(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(PurchaseStatus::Refunded)?;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Currency;

    fn pending() -> Purchase {
        Purchase::pending(
            NewPurchase {
                gateway: Gateway::Paypal,
                gateway_order_id: "PP-ORDER-1".to_string(),
                user_id: UserId::new("u1").unwrap(),
                amount: Money::new(Currency::Usd, 22_000).unwrap(),
                plan_type: PlanType::Senior,
                billing_cycle: BillingCycle::Yearly,
                request_id: "req-1".to_string(),
            },
            Timestamp::now(),
        )
        .unwrap()
    }

    #[test]
    fn status_transitions() {
        use PurchaseStatus::*;
        assert!(Pending.can_transition_to(&Completed));
        assert!(Pending.can_transition_to(&Failed));
        assert!(Completed.can_transition_to(&Refunded));
        assert!(!Completed.can_transition_to(&Failed));
        assert!(!Failed.can_transition_to(&Completed));
        assert!(Failed.is_terminal());
        assert!(Refunded.is_terminal());
    }

    #[test]
    fn order_ref_has_expected_shape() {
        let r = generate_order_ref(Timestamp::now());
        let parts: Vec<&str> = r.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn new_purchase_is_pending() {
        let p = pending();
        assert_eq!(p.status, PurchaseStatus::Pending);
        assert!(p.capture_id.is_none());
    }

    #[test]
    fn complete_records_capture() {
        let mut p = pending();
        p.complete("CAP-1", Some("payer@example.com".into()), Timestamp::now())
            .unwrap();
        assert!(p.is_completed());
        assert_eq!(p.capture_id.as_deref(), Some("CAP-1"));
        assert_eq!(p.payer_email.as_deref(), Some("payer@example.com"));
    }

    #[test]
    fn cannot_complete_twice() {
        let mut p = pending();
        p.complete("CAP-1", None, Timestamp::now()).unwrap();
        assert!(p.complete("CAP-2", None, Timestamp::now()).is_err());
        assert_eq!(p.capture_id.as_deref(), Some("CAP-1"));
    }

    #[test]
    fn refund_requires_completion() {
        let mut p = pending();
        assert!(p.refund(Timestamp::now()).is_err());
        p.complete("CAP-1", None, Timestamp::now()).unwrap();
        p.refund(Timestamp::now()).unwrap();
        assert_eq!(p.status, PurchaseStatus::Refunded);
    }

    #[test]
    fn fail_records_reason() {
        let mut p = pending();
        p.fail("declined", Timestamp::now()).unwrap();
        assert_eq!(p.status, PurchaseStatus::Failed);
        assert_eq!(p.failure_reason.as_deref(), Some("declined"));
    }

    #[test]
    fn empty_gateway_order_id_rejected() {
        let result = Purchase::pending(
            NewPurchase {
                gateway: Gateway::Paypal,
                gateway_order_id: " ".to_string(),
                user_id: UserId::new("u1").unwrap(),
                amount: Money::new(Currency::Usd, 1_500).unwrap(),
                plan_type: PlanType::Intermediate,
                billing_cycle: BillingCycle::Monthly,
                request_id: "r".to_string(),
            },
            Timestamp::now(),
        );
        assert!(result.is_err());
    }
}
