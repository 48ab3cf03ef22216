//! HS256 session token validator.
//!
//! Tokens are issued by the platform's login flow and signed with a shared
//! secret. This adapter validates them by:
//!
//! 1. Verifying the HS256 signature against the configured secret
//! 2. Validating issuer, audience, and expiry claims
//! 3. Mapping claims to the domain `AuthenticatedUser` type
//!
//! Entitlements are deliberately absent from the claim set; access checks
//! read them from the user store.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId, UserRole};
use crate::ports::SessionValidator;

pub const DEFAULT_ISSUER: &str = "quiz-platform";
pub const DEFAULT_AUDIENCE: &str = "quiz-platform-client";

/// Configuration for the JWT validator.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }
}

/// Claim set carried by session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// `SessionValidator` for HS256 tokens.
pub struct JwtSessionValidator {
    config: JwtConfig,
    decoding_key: DecodingKey,
}

impl JwtSessionValidator {
    pub fn new(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.expose_secret().as_bytes());
        Self {
            config,
            decoding_key,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("Token expired");
                        AuthError::TokenExpired
                    }
                    ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
                        tracing::warn!(error = %e, "Token issued for another service");
                        AuthError::InvalidToken
                    }
                    _ => {
                        tracing::debug!(error = %e, "Token validation failed");
                        AuthError::InvalidToken
                    }
                }
            })?;
        let claims = data.claims;

        let user_id = UserId::new(&claims.user_id).map_err(|_| {
            tracing::warn!("Token carries an empty userId");
            AuthError::InvalidToken
        })?;

        let mut user = AuthenticatedUser::new(user_id, claims.email.unwrap_or_default())
            .with_role(UserRole::from_claim(claims.role.as_deref()));
        if let Some(session_id) = claims.session_id {
            user = user.with_session_id(session_id);
        }
        Ok(user)
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-that-is-at-least-32-chars!";

    fn validator() -> JwtSessionValidator {
        JwtSessionValidator::new(JwtConfig::new(SecretString::new(SECRET.to_string())))
    }

    fn claims(exp_offset_secs: i64) -> SessionClaims {
        SessionClaims {
            user_id: "user-1".to_string(),
            email: Some("u1@example.com".to_string()),
            role: Some("user".to_string()),
            session_id: Some("sess-1".to_string()),
            exp: chrono::Utc::now().timestamp() + exp_offset_secs,
            iss: DEFAULT_ISSUER.to_string(),
            aud: DEFAULT_AUDIENCE.to_string(),
        }
    }

    fn sign(claims: &SessionClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Claim Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn valid_token_maps_claims() {
        let token = sign(&claims(3600), SECRET);
        let user = validator().validate(&token).await.unwrap();

        assert_eq!(user.id.as_str(), "user-1");
        assert_eq!(user.email, "u1@example.com");
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.session_id.as_deref(), Some("sess-1"));
    }

    #[tokio::test]
    async fn admin_role_claim_maps_to_admin() {
        let mut c = claims(3600);
        c.role = Some("admin".to_string());
        let user = validator().validate(&sign(&c, SECRET)).await.unwrap();
        assert!(user.is_admin());
    }

    #[test]
    fn claims_use_camel_case_names() {
        let json = serde_json::to_value(claims(0)).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("sessionId").is_some());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Rejection Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let token = sign(&claims(-3600), SECRET);
        let result = validator().validate(&token).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let token = sign(&claims(3600), "another-secret-that-is-32-chars-long!!");
        let result = validator().validate(&token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn wrong_audience_is_rejected() {
        let mut c = claims(3600);
        c.aud = "someone-else".to_string();
        let result = validator().validate(&sign(&c, SECRET)).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn wrong_issuer_is_rejected() {
        let mut c = claims(3600);
        c.iss = "elsewhere".to_string();
        let result = validator().validate(&sign(&c, SECRET)).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn garbage_is_rejected() {
        let result = validator().validate("not-a-jwt").await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn debug_hides_secret() {
        let debug = format!("{:?}", validator());
        assert!(!debug.contains(SECRET));
    }
}
