//! Shared application state for the HTTP layer.

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::handlers::{
    CaptureOrderHandler, CheckoutUrls, CreateOrderHandler, GetCurrentPlanHandler,
    ProcessWebhookHandler, RetryWebhookEventHandler, WebhookDispatcher,
};
use crate::domain::access::AccessPolicy;
use crate::domain::payment::{Gateway, PriceCatalog};
use crate::ports::{
    PaymentGateway, PurchaseRepository, RateLimiter, SessionValidator, SubscriptionRepository,
    UserAccountRepository, WebhookEventStore, WebhookVerifier,
};

/// Dependencies shared by every route.
///
/// Cloned per request; everything inside is `Arc`-wrapped or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub purchases: Arc<dyn PurchaseRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub users: Arc<dyn UserAccountRepository>,
    pub webhook_events: Arc<dyn WebhookEventStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub session_validator: Arc<dyn SessionValidator>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Gateways without an entry reject every delivery.
    pub webhook_verifiers: HashMap<Gateway, Arc<dyn WebhookVerifier>>,
    pub policy: Arc<AccessPolicy>,
    pub catalog: PriceCatalog,
    pub checkout_urls: CheckoutUrls,
}

impl AppState {
    pub fn create_order_handler(&self) -> CreateOrderHandler {
        CreateOrderHandler::new(
            self.purchases.clone(),
            self.gateway.clone(),
            self.catalog.clone(),
            self.checkout_urls.clone(),
        )
    }

    pub fn capture_order_handler(&self) -> CaptureOrderHandler {
        CaptureOrderHandler::new(
            self.purchases.clone(),
            self.subscriptions.clone(),
            self.gateway.clone(),
        )
    }

    pub fn current_plan_handler(&self) -> GetCurrentPlanHandler {
        GetCurrentPlanHandler::new(self.users.clone(), self.subscriptions.clone())
    }

    fn dispatcher(&self) -> Arc<WebhookDispatcher> {
        Arc::new(WebhookDispatcher::new(
            self.purchases.clone(),
            self.subscriptions.clone(),
        ))
    }

    pub fn process_webhook_handler(&self) -> ProcessWebhookHandler {
        self.webhook_verifiers.iter().fold(
            ProcessWebhookHandler::new(self.webhook_events.clone(), self.dispatcher()),
            |handler, (gateway, verifier)| handler.with_verifier(*gateway, verifier.clone()),
        )
    }

    pub fn retry_webhook_handler(&self) -> RetryWebhookEventHandler {
        RetryWebhookEventHandler::new(self.webhook_events.clone(), self.dispatcher())
    }
}
