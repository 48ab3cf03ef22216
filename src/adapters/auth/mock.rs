//! Fixed-token session validator for tests and local runs.
//!
//! ```ignore
//! let validator = MockSessionValidator::new()
//!     .with_test_user("user-token", "user-1")
//!     .with_admin("admin-token", "ops-1");
//! ```

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId, UserRole};
use crate::ports::SessionValidator;

/// Unknown tokens are `InvalidToken`. A configured failure overrides everything.
#[derive(Debug, Clone, Default)]
pub struct MockSessionValidator {
    sessions: HashMap<String, AuthenticatedUser>,
    failure: Option<AuthError>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.sessions.insert(token.into(), user);
        self
    }

    /// Plain user with email `{user_id}@test.example.com`. Blank ids are ignored.
    pub fn with_test_user(self, token: impl Into<String>, user_id: &str) -> Self {
        match member(user_id) {
            Some(user) => self.with_user(token, user),
            None => self,
        }
    }

    pub fn with_admin(self, token: impl Into<String>, user_id: &str) -> Self {
        match member(user_id) {
            Some(user) => self.with_user(token, user.with_role(UserRole::Admin)),
            None => self,
        }
    }

    pub fn with_error(mut self, error: AuthError) -> Self {
        self.failure = Some(error);
        self
    }
}

fn member(user_id: &str) -> Option<AuthenticatedUser> {
    let id = UserId::new(user_id).ok()?;
    Some(AuthenticatedUser::new(id, format!("{}@test.example.com", user_id)))
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        self.sessions
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_tokens_resolve_to_their_users() {
        let validator = MockSessionValidator::new()
            .with_test_user("member", "user-123")
            .with_admin("root", "ops-1");

        let user = validator.validate("member").await.unwrap();
        assert_eq!(user.id.as_str(), "user-123");
        assert_eq!(user.email, "user-123@test.example.com");
        assert!(!user.is_admin());

        assert!(validator.validate("root").await.unwrap().is_admin());
        assert!(matches!(
            validator.validate("nobody").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn configured_failure_applies_to_known_tokens_too() {
        let validator = MockSessionValidator::new()
            .with_test_user("member", "u1")
            .with_error(AuthError::TokenExpired);

        assert!(matches!(
            validator.validate("member").await,
            Err(AuthError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn blank_user_id_registers_nothing() {
        let validator = MockSessionValidator::new().with_test_user("t", " ");
        assert!(validator.validate("t").await.is_err());
    }
}
