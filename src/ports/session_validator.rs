//! Bearer session port.
//!
//! A validated session yields identity and role only. Entitlements are read
//! from the user store for every access decision, so a revoked plan takes
//! effect on the next request even while the token is still live.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Errors:
/// - `InvalidToken` for malformed, unsigned or wrong-issuer/audience tokens
/// - `TokenExpired` once `exp` has passed
/// - `ServiceUnavailable` when validation itself could not run
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// `token` is the raw credential, without the `Bearer ` prefix.
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{UserId, UserRole};
    use std::sync::Arc;

    /// Accepts `live:<user>` and `admin:<user>`, rejects `stale:*` as expired.
    struct PrefixValidator;

    #[async_trait]
    impl SessionValidator for PrefixValidator {
        async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
            let (kind, user) = token.split_once(':').ok_or(AuthError::InvalidToken)?;
            let id = UserId::new(user).map_err(|_| AuthError::InvalidToken)?;
            let email = format!("{}@example.com", user);
            match kind {
                "live" => Ok(AuthenticatedUser::new(id, email)),
                "admin" => Ok(AuthenticatedUser::new(id, email).with_role(UserRole::Admin)),
                "stale" => Err(AuthError::TokenExpired),
                _ => Err(AuthError::InvalidToken),
            }
        }
    }

    #[tokio::test]
    async fn usable_through_a_shared_trait_object() {
        let validator: Arc<dyn SessionValidator> = Arc::new(PrefixValidator);

        let user = validator.validate("live:user-1").await.unwrap();
        assert_eq!(user.id.as_str(), "user-1");
        assert!(!user.is_admin());

        let admin = validator.validate("admin:ops-1").await.unwrap();
        assert!(admin.is_admin());
    }

    #[tokio::test]
    async fn expired_and_garbage_tokens_both_force_reauthentication() {
        let validator = PrefixValidator;

        for token in ["stale:user-1", "no-separator", "bogus:user-1"] {
            let err = validator.validate(token).await.unwrap_err();
            assert!(err.requires_reauthentication(), "{}", token);
        }
    }
}
