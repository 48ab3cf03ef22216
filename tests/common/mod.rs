//! Shared harness for the HTTP integration tests.
//!
//! Builds the full router over in-memory adapters so each test drives the
//! service exactly as a client would, then inspects the store directly.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

use quiz_entitlements::adapters::auth::MockSessionValidator;
use quiz_entitlements::adapters::http::{app_router, AppState};
use quiz_entitlements::adapters::paypal::{MockPaymentGateway, MockWebhookVerifier};
use quiz_entitlements::adapters::rate_limiter::{InMemoryRateLimiter, RateLimitConfig};
use quiz_entitlements::adapters::{HmacWebhookVerifier, InMemoryStore};
use quiz_entitlements::application::CheckoutUrls;
use quiz_entitlements::domain::access::AccessPolicy;
use quiz_entitlements::domain::payment::{Gateway, PriceCatalog, Purchase};
use quiz_entitlements::ports::{PurchaseRepository, WebhookVerifier};

pub const USER_TOKEN: &str = "user-token";
pub const USER_ID: &str = "user-1";
pub const OTHER_TOKEN: &str = "other-token";
pub const OTHER_ID: &str = "user-2";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const ADMIN_ID: &str = "ops-1";

pub const APS_SECRET: &str = "aps-shared-secret";

pub struct TestApp {
    pub store: InMemoryStore,
    pub gateway: Arc<MockPaymentGateway>,
    state: AppState,
}

impl TestApp {
    /// PayPal deliveries accepted without a signature check, APS on HMAC.
    pub fn new() -> Self {
        Self::with(
            Arc::new(MockWebhookVerifier::accept_all()),
            RateLimitConfig::default(),
        )
    }

    pub fn with_paypal_verifier(verifier: MockWebhookVerifier) -> Self {
        Self::with(Arc::new(verifier), RateLimitConfig::default())
    }

    pub fn with_rate_limits(config: RateLimitConfig) -> Self {
        Self::with(Arc::new(MockWebhookVerifier::accept_all()), config)
    }

    fn with(paypal: Arc<dyn WebhookVerifier>, limits: RateLimitConfig) -> Self {
        let store = InMemoryStore::new();
        let gateway = Arc::new(MockPaymentGateway::new());

        let mut webhook_verifiers: HashMap<Gateway, Arc<dyn WebhookVerifier>> = HashMap::new();
        webhook_verifiers.insert(Gateway::Paypal, paypal);
        webhook_verifiers.insert(
            Gateway::Aps,
            Arc::new(HmacWebhookVerifier::new(Some(APS_SECRET))),
        );

        let state = AppState {
            purchases: Arc::new(store.clone()),
            subscriptions: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            webhook_events: Arc::new(store.clone()),
            gateway: gateway.clone(),
            session_validator: Arc::new(
                MockSessionValidator::new()
                    .with_test_user(USER_TOKEN, USER_ID)
                    .with_test_user(OTHER_TOKEN, OTHER_ID)
                    .with_admin(ADMIN_TOKEN, ADMIN_ID),
            ),
            rate_limiter: Arc::new(InMemoryRateLimiter::new(limits)),
            webhook_verifiers,
            policy: Arc::new(AccessPolicy::standard()),
            catalog: PriceCatalog::standard(),
            checkout_urls: CheckoutUrls::for_client("http://localhost:3000"),
        };

        Self {
            store,
            gateway,
            state,
        }
    }

    pub fn router(&self) -> Router {
        app_router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        read_json(self.router().oneshot(request).await.unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::get(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        self.send(json_request(uri, token, &body)).await
    }

    /// Creates an order for the plan and returns the gateway order id.
    pub async fn create_order(&self, token: &str, plan: &str, cycle: &str) -> String {
        let (status, body) = self
            .post_json(
                "/api/payments/paypal/create-order",
                Some(token),
                serde_json::json!({
                    "planType": plan,
                    "currency": "USD",
                    "billingCycle": cycle,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create-order failed: {}", body);
        body["orderID"].as_str().unwrap().to_string()
    }

    pub async fn capture_order(&self, token: &str, order_id: &str) -> (StatusCode, serde_json::Value) {
        self.post_json(
            "/api/payments/paypal/capture-order",
            Some(token),
            serde_json::json!({ "orderID": order_id }),
        )
        .await
    }

    pub async fn purchase(&self, order_id: &str) -> Purchase {
        PurchaseRepository::find_by_gateway_order_id(&self.store, order_id)
            .await
            .unwrap()
            .expect("purchase should exist")
    }
}

pub fn json_request(uri: &str, token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// PayPal `PAYMENT.CAPTURE.COMPLETED` delivery for an order.
pub fn capture_completed_event(event_id: &str, capture_id: &str, order_id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": event_id,
        "event_type": "PAYMENT.CAPTURE.COMPLETED",
        "resource_type": "capture",
        "resource": {
            "id": capture_id,
            "status": "COMPLETED",
            "supplementary_data": {
                "related_ids": { "order_id": order_id }
            }
        }
    })
}

/// PayPal `PAYMENT.CAPTURE.REFUNDED` delivery pointing at a capture.
pub fn capture_refunded_event(event_id: &str, refund_id: &str, capture_id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": event_id,
        "event_type": "PAYMENT.CAPTURE.REFUNDED",
        "resource_type": "refund",
        "resource": {
            "id": refund_id,
            "status": "COMPLETED",
            "links": [{
                "href": format!("https://api.sandbox.paypal.com/v2/payments/captures/{}", capture_id),
                "rel": "up",
                "method": "GET"
            }]
        }
    })
}

/// `sha256=<hex>` over the body with the given secret.
pub fn hmac_signature(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
