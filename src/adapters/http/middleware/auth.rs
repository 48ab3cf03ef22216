//! Session authentication for the api router.
//!
//! `auth_middleware` turns a valid `Authorization: Bearer` header into an
//! `AuthenticatedUser` request extension. No header means an anonymous
//! request; the extractors below and the plan guard decide what anonymous
//! callers may reach.
//!
//! The session only says who the caller is. Entitlements come from the user
//! store at decision time.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

pub type AuthState = Arc<dyn SessionValidator>;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// 401 for a bad or expired token, 503 when validation could not run.
pub async fn auth_middleware(
    State(validator): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return next.run(request).await;
    };

    match validator.validate(token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => session_failure(&err),
    }
}

fn session_failure(err: &AuthError) -> Response {
    let (status, message) = match err {
        AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
        AuthError::InvalidToken | AuthError::InsufficientPermissions => {
            (StatusCode::UNAUTHORIZED, "Invalid token")
        }
        AuthError::ServiceUnavailable(detail) => {
            tracing::error!(error = %detail, "Session validation unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Authentication service unavailable",
            )
        }
    };
    failure_body(status, message, "AUTH_ERROR")
}

fn failure_body(status: StatusCode, message: &str, code: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "error": message,
            "code": code
        })),
    )
        .into_response()
}

fn session_user(parts: &Parts) -> Option<AuthenticatedUser> {
    parts.extensions.get::<AuthenticatedUser>().cloned()
}

/// Signed-in caller, or 401.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_user(parts)
            .map(RequireAuth)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Signed-in caller if there is one.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(session_user(parts)))
    }
}

/// Signed-in admin: 401 when anonymous, 403 for other roles.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthenticatedUser);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts).ok_or(AuthRejection::Unauthenticated)?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, "Non-admin called an admin route");
            return Err(AuthRejection::Forbidden);
        }
        Ok(RequireAdmin(user))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    Unauthenticated,
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthenticated => failure_body(
                StatusCode::UNAUTHORIZED,
                "Authentication required",
                "UNAUTHENTICATED",
            ),
            AuthRejection::Forbidden => {
                failure_body(StatusCode::FORBIDDEN, "Admin access required", "FORBIDDEN")
            }
        }
    }
}
