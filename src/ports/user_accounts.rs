//! UserAccountRepository port - the entitlement set read by access checks.

use async_trait::async_trait;

use crate::domain::access::EntitlementSet;
use crate::domain::foundation::{DomainError, Timestamp, UserId};

/// The slice of a user record this service reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub entitlements: EntitlementSet,
    pub updated_at: Timestamp,
}

#[async_trait]
pub trait UserAccountRepository: Send + Sync {
    async fn find(&self, user_id: &UserId) -> Result<Option<UserAccount>, DomainError>;

    /// Current entitlements. Unknown users hold none.
    async fn entitlements(&self, user_id: &UserId) -> Result<EntitlementSet, DomainError> {
        Ok(self
            .find(user_id)
            .await?
            .map(|account| account.entitlements)
            .unwrap_or_default())
    }

    /// Replaces the entitlement set, creating the account row if needed.
    async fn set_entitlements(
        &self,
        user_id: &UserId,
        entitlements: &EntitlementSet,
        now: Timestamp,
    ) -> Result<(), DomainError>;
}
