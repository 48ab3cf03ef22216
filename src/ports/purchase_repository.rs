//! PurchaseRepository port.
//!
//! Status changes are conditional writes (`UPDATE ... WHERE status = $expected`)
//! so two racing captures cannot both complete the same order. Each
//! transition method returns `true` only for the caller that applied it.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PurchaseId, Timestamp};
use crate::domain::payment::Purchase;

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Inserts a new purchase.
    ///
    /// Fails with `ErrorCode::Conflict` if the gateway order id is taken.
    async fn insert(&self, purchase: &Purchase) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, DomainError>;

    async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Purchase>, DomainError>;

    async fn find_by_capture_id(&self, capture_id: &str) -> Result<Option<Purchase>, DomainError>;

    /// pending → completed, recording capture id and payer email.
    async fn complete_if_pending(
        &self,
        id: &PurchaseId,
        capture_id: &str,
        payer_email: Option<&str>,
        now: Timestamp,
    ) -> Result<bool, DomainError>;

    /// Records a capture id on a purchase that is still pending.
    async fn record_capture_if_pending(
        &self,
        id: &PurchaseId,
        capture_id: &str,
        now: Timestamp,
    ) -> Result<bool, DomainError>;

    /// pending → failed with a reason.
    async fn fail_if_pending(
        &self,
        id: &PurchaseId,
        reason: &str,
        now: Timestamp,
    ) -> Result<bool, DomainError>;

    /// completed → refunded.
    async fn refund_if_completed(&self, id: &PurchaseId, now: Timestamp)
        -> Result<bool, DomainError>;
}
