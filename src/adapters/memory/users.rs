use async_trait::async_trait;

use crate::domain::access::EntitlementSet;
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::{UserAccount, UserAccountRepository};

use super::{InMemoryStore, StoreState};

pub(super) fn write_entitlements(
    state: &mut StoreState,
    user_id: &UserId,
    entitlements: &EntitlementSet,
    now: Timestamp,
) {
    let account = state
        .users
        .entry(user_id.clone())
        .or_insert_with(|| UserAccount {
            id: user_id.clone(),
            email: None,
            display_name: None,
            entitlements: EntitlementSet::new(),
            updated_at: now,
        });
    account.entitlements = entitlements.clone();
    account.updated_at = now;
}

impl InMemoryStore {
    /// Seeds a user account.
    pub async fn put_user(&self, account: UserAccount) {
        self.state
            .write()
            .await
            .users
            .insert(account.id.clone(), account);
    }
}

#[async_trait]
impl UserAccountRepository for InMemoryStore {
    async fn find(&self, user_id: &UserId) -> Result<Option<UserAccount>, DomainError> {
        Ok(self.state.read().await.users.get(user_id).cloned())
    }

    async fn set_entitlements(
        &self,
        user_id: &UserId,
        entitlements: &EntitlementSet,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        write_entitlements(&mut state, user_id, entitlements, now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::Entitlement;

    #[tokio::test]
    async fn unknown_user_has_no_entitlements() {
        let store = InMemoryStore::new();
        let set = store
            .entitlements(&UserId::new("ghost").unwrap())
            .await
            .unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn set_entitlements_creates_and_replaces() {
        let store = InMemoryStore::new();
        let user = UserId::new("u1").unwrap();
        store
            .set_entitlements(&user, &EntitlementSet::from([Entitlement::Senior]), Timestamp::now())
            .await
            .unwrap();
        store
            .set_entitlements(&user, &EntitlementSet::from([Entitlement::Bundle]), Timestamp::now())
            .await
            .unwrap();
        let set = store.entitlements(&user).await.unwrap();
        assert_eq!(set, EntitlementSet::from([Entitlement::Bundle]));
    }
}
