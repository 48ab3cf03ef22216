//! Per-operation rate limiting for the checkout routes.
//!
//! Mounted with `route_layer` so only matched routes count:
//!
//! ```ignore
//! Router::new()
//!     .route("/api/payments/paypal/create-order", post(create_order))
//!     .route_layer(middleware::from_fn_with_state(
//!         ResourceRateLimit::new(limiter, RESOURCE_CREATE_ORDER),
//!         rate_limit_middleware,
//!     ))
//! ```
//!
//! Signed-in callers are counted per user, anonymous ones per client address.
//! Allowed responses carry `X-RateLimit-Limit`, `X-RateLimit-Remaining` and
//! `X-RateLimit-Reset`; a 429 also carries `Retry-After`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::AuthenticatedUser;
use crate::ports::{Quota, RateLimitDecision, RateLimitKey, RateLimiter};

static LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
static REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
static RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Middleware state: the shared limiter and the operation a route counts as.
#[derive(Clone)]
pub struct ResourceRateLimit {
    limiter: Arc<dyn RateLimiter>,
    operation: &'static str,
}

impl ResourceRateLimit {
    pub fn new(limiter: Arc<dyn RateLimiter>, operation: &'static str) -> Self {
        Self { limiter, operation }
    }

    fn key_for(&self, user: Option<&AuthenticatedUser>, client_ip: Option<String>) -> Option<RateLimitKey> {
        match (user, client_ip) {
            (Some(user), _) => Some(RateLimitKey::user(&user.id, self.operation)),
            (None, Some(ip)) => Some(RateLimitKey::ip(ip, self.operation)),
            (None, None) => None,
        }
    }
}

/// Counts the request and refuses it with 429 once the window is spent.
///
/// A limiter outage lets the request through.
pub async fn rate_limit_middleware(
    State(state): State<ResourceRateLimit>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let client_ip = client_ip(request.headers(), connect_info.as_ref());
    let user = request.extensions().get::<AuthenticatedUser>();

    let Some(key) = state.key_for(user, client_ip) else {
        return next.run(request).await;
    };

    let quota = match state.limiter.hit(&key).await {
        Ok(RateLimitDecision::Allowed(quota)) => Some(quota),
        Ok(RateLimitDecision::Denied {
            limit,
            retry_after_secs,
        }) => {
            tracing::info!(%key, limit, retry_after_secs, "Rate limit exceeded");
            return too_many_requests(limit, retry_after_secs);
        }
        Err(e) => {
            tracing::warn!(error = %e, operation = state.operation, "Rate limiter unavailable, allowing request");
            None
        }
    };

    let mut response = next.run(request).await;
    if let Some(quota) = quota {
        set_quota_headers(response.headers_mut(), &quota);
    }
    response
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer.
fn client_ip(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> Option<String> {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header_value("x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .or_else(|| header_value("x-real-ip"))
        .map(str::to_string)
        .or_else(|| connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()))
}

fn too_many_requests(limit: u32, retry_after_secs: u32) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "success": false,
            "error": "Too many requests, please try again later",
            "code": "RATE_LIMITED"
        })),
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(LIMIT.clone(), HeaderValue::from(limit));
    headers.insert(REMAINING.clone(), HeaderValue::from(0u32));
    headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
    response
}

fn set_quota_headers(headers: &mut HeaderMap, quota: &Quota) {
    headers.insert(LIMIT.clone(), HeaderValue::from(quota.limit));
    headers.insert(REMAINING.clone(), HeaderValue::from(quota.remaining));
    headers.insert(RESET.clone(), HeaderValue::from(quota.resets_at.as_unix_secs()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::rate_limiter::{
        InMemoryRateLimiter, RateLimitConfig, RateWindow, RESOURCE_CREATE_ORDER,
    };
    use crate::domain::foundation::UserId;
    use crate::ports::RateLimitError;
    use async_trait::async_trait;
    use axum::{body::Body, middleware, routing::post, Router};
    use tower::ServiceExt;

    fn app(limiter: Arc<dyn RateLimiter>, user: Option<AuthenticatedUser>) -> Router {
        let router = Router::new()
            .route("/create-order", post(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(
                ResourceRateLimit::new(limiter, RESOURCE_CREATE_ORDER),
                rate_limit_middleware,
            ));
        match user {
            Some(user) => router.layer(axum::Extension(user)),
            None => router,
        }
    }

    fn limited_to(max_requests: u32) -> Arc<dyn RateLimiter> {
        Arc::new(InMemoryRateLimiter::new(
            RateLimitConfig::default()
                .with_operation(RESOURCE_CREATE_ORDER, RateWindow::new(max_requests, 900)),
        ))
    }

    fn user() -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new("user-1").unwrap(), "u1@example.com")
    }

    fn post_from(ip: &str) -> axum::http::Request<Body> {
        axum::http::Request::post("/create-order")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    struct DownLimiter;

    #[async_trait]
    impl RateLimiter for DownLimiter {
        async fn hit(&self, _key: &RateLimitKey) -> Result<RateLimitDecision, RateLimitError> {
            Err(RateLimitError::Unavailable("connection refused".into()))
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Client address
    // ════════════════════════════════════════════════════════════════════════════

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn first_forwarded_hop_wins() {
        let map = headers(&[("x-forwarded-for", "1.2.3.4, 5.6.7.8"), ("x-real-ip", "9.9.9.9")]);
        assert_eq!(client_ip(&map, None).as_deref(), Some("1.2.3.4"));
    }

    #[test]
    fn real_ip_used_without_forwarded_for() {
        let map = headers(&[("x-real-ip", "9.8.7.6")]);
        assert_eq!(client_ip(&map, None).as_deref(), Some("9.8.7.6"));
    }

    #[test]
    fn socket_peer_is_the_last_resort() {
        let peer = ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000)));
        assert_eq!(client_ip(&HeaderMap::new(), Some(&peer)).as_deref(), Some("127.0.0.1"));
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }

    #[test]
    fn signed_in_callers_are_keyed_by_user() {
        let state = ResourceRateLimit::new(limited_to(1), RESOURCE_CREATE_ORDER);

        let key = state.key_for(Some(&user()), Some("10.0.0.1".into())).unwrap();
        assert_eq!(key.to_string(), "user:user-1:create_order");

        let key = state.key_for(None, Some("10.0.0.1".into())).unwrap();
        assert_eq!(key.to_string(), "ip:10.0.0.1:create_order");

        assert!(state.key_for(None, None).is_none());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Middleware
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn third_request_in_window_gets_429() {
        let app = app(limited_to(2), None);

        for remaining in ["1", "0"] {
            let response = app.clone().oneshot(post_from("10.0.0.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()["x-ratelimit-remaining"], remaining);
            assert!(response.headers().contains_key("x-ratelimit-reset"));
        }

        let response = app.oneshot(post_from("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["x-ratelimit-limit"], "2");
        assert!(response.headers().contains_key(header::RETRY_AFTER));
    }

    #[tokio::test]
    async fn anonymous_addresses_count_separately() {
        let app = app(limited_to(1), None);

        let response = app.clone().oneshot(post_from("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let response = app.oneshot(post_from("10.0.0.2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn user_window_is_independent_of_the_address_window() {
        let limiter = limited_to(1);

        let response = app(limiter.clone(), Some(user()))
            .oneshot(post_from("10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(limiter.clone(), None)
            .oneshot(post_from("10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(limiter, Some(user()))
            .oneshot(post_from("10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn limiter_outage_fails_open() {
        let response = app(Arc::new(DownLimiter), None)
            .oneshot(post_from("10.0.0.1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key("x-ratelimit-limit"));
    }
}
