use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, PurchaseId, Timestamp};
use crate::domain::payment::{Purchase, PurchaseStatus};
use crate::ports::PurchaseRepository;

use super::InMemoryStore;

#[async_trait]
impl PurchaseRepository for InMemoryStore {
    async fn insert(&self, purchase: &Purchase) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let taken = state.purchases.values().any(|p| {
            p.gateway_order_id == purchase.gateway_order_id || p.order_ref == purchase.order_ref
        });
        if taken || state.purchases.contains_key(&purchase.id) {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("purchase for order {} already exists", purchase.gateway_order_id),
            ));
        }
        state.purchases.insert(purchase.id, purchase.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, DomainError> {
        Ok(self.state.read().await.purchases.get(id).cloned())
    }

    async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Purchase>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .purchases
            .values()
            .find(|p| p.gateway_order_id == gateway_order_id)
            .cloned())
    }

    async fn find_by_capture_id(&self, capture_id: &str) -> Result<Option<Purchase>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .purchases
            .values()
            .find(|p| p.capture_id.as_deref() == Some(capture_id))
            .cloned())
    }

    async fn complete_if_pending(
        &self,
        id: &PurchaseId,
        capture_id: &str,
        payer_email: Option<&str>,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        match state.purchases.get_mut(id) {
            Some(p) if p.status == PurchaseStatus::Pending => {
                p.complete(capture_id, payer_email.map(str::to_string), now)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_capture_if_pending(
        &self,
        id: &PurchaseId,
        capture_id: &str,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        match state.purchases.get_mut(id) {
            Some(p) if p.status == PurchaseStatus::Pending => {
                p.capture_id = Some(capture_id.to_string());
                p.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn fail_if_pending(
        &self,
        id: &PurchaseId,
        reason: &str,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        match state.purchases.get_mut(id) {
            Some(p) if p.status == PurchaseStatus::Pending => {
                p.fail(reason, now)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn refund_if_completed(
        &self,
        id: &PurchaseId,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        match state.purchases.get_mut(id) {
            Some(p) if p.status == PurchaseStatus::Completed => {
                p.refund(now)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
