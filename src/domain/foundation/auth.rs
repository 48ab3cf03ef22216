//! Authentication types for the domain layer.
//!
//! `AuthenticatedUser` is what a validated session token yields. It carries
//! identity and role only: entitlements are deliberately absent because they
//! must be read live from the user store on every decision.

use super::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role attached to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    /// Parses the `role` claim. Anything other than `admin` is a plain user.
    pub fn from_claim(role: Option<&str>) -> Self {
        match role {
            Some(r) if r.eq_ignore_ascii_case("admin") => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}

/// Authenticated user extracted from a validated session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The unique user identifier.
    pub id: UserId,

    /// User's email address from the token claims.
    pub email: String,

    /// Session role.
    pub role: UserRole,

    /// Session identifier, when the token carries one.
    pub session_id: Option<String>,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user with the plain `User` role.
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            role: UserRole::User,
            session_id: None,
        }
    }

    /// Sets the session role.
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    /// Sets the session identifier.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// User exists but lacks required permissions for this action.
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    /// The authentication service is unavailable (network, config, etc.).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this error indicates the user should re-authenticate.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, AuthError::InvalidToken | AuthError::TokenExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new("user-123").unwrap(), "test@example.com")
    }

    #[test]
    fn new_user_has_plain_role() {
        let u = user();
        assert_eq!(u.role, UserRole::User);
        assert!(!u.is_admin());
        assert!(u.session_id.is_none());
    }

    #[test]
    fn builder_sets_role_and_session() {
        let u = user().with_role(UserRole::Admin).with_session_id("s-1");
        assert!(u.is_admin());
        assert_eq!(u.session_id.as_deref(), Some("s-1"));
    }

    #[test]
    fn role_claim_parsing() {
        assert_eq!(UserRole::from_claim(Some("admin")), UserRole::Admin);
        assert_eq!(UserRole::from_claim(Some("ADMIN")), UserRole::Admin);
        assert_eq!(UserRole::from_claim(Some("user")), UserRole::User);
        assert_eq!(UserRole::from_claim(None), UserRole::User);
    }

    #[test]
    fn reauthentication_only_for_token_problems() {
        assert!(AuthError::InvalidToken.requires_reauthentication());
        assert!(AuthError::TokenExpired.requires_reauthentication());
        assert!(!AuthError::InsufficientPermissions.requires_reauthentication());
        assert!(!AuthError::service_unavailable("down").requires_reauthentication());
    }
}
