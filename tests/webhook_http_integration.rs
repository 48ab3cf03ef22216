//! Integration tests for gateway webhook intake and operator retry.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use quiz_entitlements::adapters::paypal::{
    MockWebhookVerifier, HEADER_AUTH_ALGO, HEADER_CERT_URL, HEADER_TRANSMISSION_ID,
    HEADER_TRANSMISSION_SIG, HEADER_TRANSMISSION_TIME,
};
use quiz_entitlements::domain::foundation::UserId;
use quiz_entitlements::domain::payment::PurchaseStatus;
use quiz_entitlements::domain::subscription::{CancelReason, SubscriptionStatus};
use quiz_entitlements::domain::webhook::WebhookEventStatus;
use quiz_entitlements::ports::{SubscriptionRepository, UserAccountRepository, WebhookEventStore};

use common::{
    capture_completed_event, capture_refunded_event, hmac_signature, json_request, read_json,
    TestApp, ADMIN_TOKEN, APS_SECRET, USER_ID, USER_TOKEN,
};

const PAYPAL_WEBHOOK: &str = "/api/payments/paypal/webhook";
const APS_WEBHOOK: &str = "/api/payments/aps/webhook";

fn paypal_delivery(event: &serde_json::Value, signature: &str) -> Request<Body> {
    Request::post(PAYPAL_WEBHOOK)
        .header("content-type", "application/json")
        .header(HEADER_AUTH_ALGO, "SHA256withRSA")
        .header(HEADER_CERT_URL, "https://api.sandbox.paypal.com/v1/notifications/certs/CERT")
        .header(HEADER_TRANSMISSION_ID, "tx-1")
        .header(HEADER_TRANSMISSION_SIG, signature)
        .header(HEADER_TRANSMISSION_TIME, "2026-01-01T00:00:00Z")
        .body(Body::from(event.to_string()))
        .unwrap()
}

fn aps_delivery(body: &str, signature: &str) -> Request<Body> {
    Request::post(APS_WEBHOOK)
        .header("content-type", "application/json")
        .header("x-signature", signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ════════════════════════════════════════════════════════════════════════════════
// Authenticity
// ════════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn tampered_paypal_signature_is_rejected_without_side_effects() {
    let app = TestApp::with_paypal_verifier(MockWebhookVerifier::expecting_signature("good-sig"));
    let order_id = app.create_order(USER_TOKEN, "SENIOR", "monthly").await;
    let event = capture_completed_event("WH-TAMPER", "CAP-1", &order_id);

    let (status, body) = app.send(paypal_delivery(&event, "forged-sig")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let purchase = app.purchase(&order_id).await;
    assert_eq!(purchase.status, PurchaseStatus::Pending);
    assert_eq!(app.store.subscription_count_for(&purchase.id).await, 0);
    assert_eq!(app.store.webhook_event_count().await, 0);
}

#[tokio::test]
async fn rejected_signature_does_not_echo_gateway_error() {
    let app = TestApp::with_paypal_verifier(MockWebhookVerifier::reject_all(
        "Webhook verification failed: invalid_client Client Authentication failed",
    ));
    let event = capture_completed_event("WH-LEAK", "CAP-1", "MOCK-ORDER-0001");

    let (status, body) = app.send(paypal_delivery(&event, "sig")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid webhook signature");
    assert_eq!(body["code"], "INVALID_WEBHOOK_SIGNATURE");
    assert!(!body.to_string().contains("invalid_client"));
    assert_eq!(app.store.webhook_event_count().await, 0);
}

#[tokio::test]
async fn correctly_signed_paypal_delivery_completes_the_purchase() {
    let app = TestApp::with_paypal_verifier(MockWebhookVerifier::expecting_signature("good-sig"));
    let order_id = app.create_order(USER_TOKEN, "SENIOR", "monthly").await;
    let event = capture_completed_event("WH-GOOD", "CAP-1", &order_id);

    let (status, body) = app.send(paypal_delivery(&event, "good-sig")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
    let purchase = app.purchase(&order_id).await;
    assert_eq!(purchase.status, PurchaseStatus::Completed);
    assert_eq!(purchase.capture_id.as_deref(), Some("CAP-1"));
    assert_eq!(app.store.subscription_count_for(&purchase.id).await, 1);
}

#[tokio::test]
async fn aps_delivery_with_wrong_hmac_is_rejected() {
    let app = TestApp::new();
    let body = r#"{"id":"APS-1","event_type":"payment.completed"}"#;
    let signature = hmac_signature("not-the-secret", body.as_bytes());

    let (status, _) = app.send(aps_delivery(body, &signature)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.webhook_event_count().await, 0);
}

#[tokio::test]
async fn aps_delivery_with_valid_hmac_is_recorded() {
    let app = TestApp::new();
    let body = r#"{"id":"APS-2","event_type":"payment.completed"}"#;
    let signature = hmac_signature(APS_SECRET, body.as_bytes());

    let (status, _) = app.send(aps_delivery(body, &signature)).await;

    assert_eq!(status, StatusCode::OK);
    let record = WebhookEventStore::find(&app.store, "APS-2")
        .await
        .unwrap()
        .expect("record stored");
    assert_eq!(record.status, WebhookEventStatus::Processed);
}

#[tokio::test]
async fn unparseable_body_is_rejected() {
    let app = TestApp::new();

    let request = Request::post(PAYPAL_WEBHOOK)
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_WEBHOOK_PAYLOAD");
}

// ════════════════════════════════════════════════════════════════════════════════
// Deduplication
// ════════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn concurrent_duplicate_deliveries_create_one_subscription() {
    let app = TestApp::new();
    let order_id = app.create_order(USER_TOKEN, "INTERMEDIATE", "monthly").await;
    let event = capture_completed_event("WH-DUP", "CAP-DUP", &order_id);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let router = app.router();
            let request = json_request(PAYPAL_WEBHOOK, None, &event);
            tokio::spawn(async move { read_json(router.oneshot(request).await.unwrap()).await })
        })
        .collect();

    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let purchase = app.purchase(&order_id).await;
    assert_eq!(purchase.status, PurchaseStatus::Completed);
    assert_eq!(app.store.subscription_count_for(&purchase.id).await, 1);
    assert_eq!(app.store.webhook_event_count().await, 1);
}

#[tokio::test]
async fn webhook_after_synchronous_capture_does_not_double_grant() {
    let app = TestApp::new();
    let order_id = app.create_order(USER_TOKEN, "SENIOR", "monthly").await;
    let (_, captured) = app.capture_order(USER_TOKEN, &order_id).await;
    let capture_id = captured["captureID"].as_str().unwrap().to_string();

    let event = capture_completed_event("WH-LATE", &capture_id, &order_id);
    let (status, _) = app.post_json(PAYPAL_WEBHOOK, None, event).await;

    assert_eq!(status, StatusCode::OK);
    let purchase = app.purchase(&order_id).await;
    assert_eq!(app.store.subscription_count_for(&purchase.id).await, 1);
}

// ════════════════════════════════════════════════════════════════════════════════
// Refunds and denials
// ════════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn refund_revokes_the_grant() {
    let app = TestApp::new();
    let user = UserId::new(USER_ID).unwrap();
    let order_id = app.create_order(USER_TOKEN, "SENIOR", "monthly").await;
    let (_, captured) = app.capture_order(USER_TOKEN, &order_id).await;
    let capture_id = captured["captureID"].as_str().unwrap().to_string();

    let event = capture_refunded_event("WH-REFUND", "REF-1", &capture_id);
    let (status, _) = app.post_json(PAYPAL_WEBHOOK, None, event).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.purchase(&order_id).await.status, PurchaseStatus::Refunded);

    let subscriptions = app.store.list_for_user(&user).await.unwrap();
    assert_eq!(subscriptions[0].status, SubscriptionStatus::Canceled);
    assert_eq!(subscriptions[0].cancel_reason, Some(CancelReason::Refund));
    assert!(UserAccountRepository::entitlements(&app.store, &user)
        .await
        .unwrap()
        .is_empty());

    let (_, plan) = app.get("/api/plans/current", Some(USER_TOKEN)).await;
    assert_eq!(plan["plan"]["tier"], "free");
}

#[tokio::test]
async fn denied_capture_fails_the_pending_purchase() {
    let app = TestApp::new();
    let order_id = app.create_order(USER_TOKEN, "INTERMEDIATE", "monthly").await;

    let mut event = capture_completed_event("WH-DENIED", "CAP-X", &order_id);
    event["event_type"] = json!("PAYMENT.CAPTURE.DENIED");
    let (status, _) = app.post_json(PAYPAL_WEBHOOK, None, event).await;

    assert_eq!(status, StatusCode::OK);
    let purchase = app.purchase(&order_id).await;
    assert_eq!(purchase.status, PurchaseStatus::Failed);
    assert_eq!(app.store.subscription_count_for(&purchase.id).await, 0);
}

// ════════════════════════════════════════════════════════════════════════════════
// Operator retry
// ════════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn retry_requires_admin() {
    let app = TestApp::new();

    let (status, _) = app
        .post_json("/api/admin/webhooks/WH-1/retry", Some(USER_TOKEN), json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post_json("/api/admin/webhooks/WH-1/retry", None, json!({}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn retry_of_unknown_event_is_not_found() {
    let app = TestApp::new();

    let (status, _) = app
        .post_json("/api/admin/webhooks/WH-MISSING/retry", Some(ADMIN_TOKEN), json!({}))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn gateway_redelivery_after_500_completes_the_purchase() {
    let app = TestApp::new();
    let event = capture_completed_event("WH-REDELIVER", "CAP-R", "MOCK-ORDER-0001");

    let (status, _) = app.post_json(PAYPAL_WEBHOOK, None, event.clone()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let order_id = app.create_order(USER_TOKEN, "SENIOR", "monthly").await;
    assert_eq!(order_id, "MOCK-ORDER-0001");

    // PayPal retries the same event id after the 500
    let (status, body) = app.post_json(PAYPAL_WEBHOOK, None, event.clone()).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let record = WebhookEventStore::find(&app.store, "WH-REDELIVER")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, WebhookEventStatus::Processed);
    assert_eq!(record.retry_count, 1);

    let purchase = app.purchase(&order_id).await;
    assert_eq!(purchase.status, PurchaseStatus::Completed);
    assert_eq!(app.store.subscription_count_for(&purchase.id).await, 1);
    let user = UserId::new(USER_ID).unwrap();
    assert_eq!(app.store.list_for_user(&user).await.unwrap().len(), 1);

    // A further redelivery is only acknowledged
    let (status, _) = app.post_json(PAYPAL_WEBHOOK, None, event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.subscription_count_for(&purchase.id).await, 1);
}

#[tokio::test]
async fn failed_event_succeeds_on_retry_once_the_purchase_exists() {
    let app = TestApp::new();

    // The mock gateway numbers orders from 0001
    let event = capture_completed_event("WH-EARLY", "CAP-EARLY", "MOCK-ORDER-0001");
    let (status, _) = app.post_json(PAYPAL_WEBHOOK, None, event).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let record = WebhookEventStore::find(&app.store, "WH-EARLY")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, WebhookEventStatus::Failed);

    let order_id = app.create_order(USER_TOKEN, "SENIOR", "monthly").await;
    assert_eq!(order_id, "MOCK-ORDER-0001");

    let (status, body) = app
        .post_json("/api/admin/webhooks/WH-EARLY/retry", Some(ADMIN_TOKEN), json!({}))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "processed");
    assert_eq!(body["retryCount"], 1);

    let purchase = app.purchase(&order_id).await;
    assert_eq!(purchase.status, PurchaseStatus::Completed);
    assert_eq!(app.store.subscription_count_for(&purchase.id).await, 1);

    // Processed events cannot be reopened
    let (status, _) = app
        .post_json("/api/admin/webhooks/WH-EARLY/retry", Some(ADMIN_TOKEN), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
