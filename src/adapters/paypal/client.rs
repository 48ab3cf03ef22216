//! PayPal REST client implementing `PaymentGateway`.
//!
//! Every call authenticates with an OAuth client-credentials token that is
//! cached until shortly before it expires. Order creation and capture send
//! the caller's request id as `PayPal-Request-Id`, so PayPal replays the
//! original response for retried calls instead of acting twice.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use crate::ports::{
    CaptureOrderRequest, CaptureResult, CreateOrderRequest, GatewayError, GatewayErrorCode,
    GatewayOrder, PaymentGateway,
};

use super::api_types::{
    error_from_response, order_body, AccessTokenResponse, CaptureResponse, OrderResponse,
    VerifySignatureRequest, VerifySignatureResponse,
};

const SANDBOX_BASE_URL: &str = "https://api-m.sandbox.paypal.com";
const LIVE_BASE_URL: &str = "https://api-m.paypal.com";

/// Refresh tokens this long before PayPal expires them.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// PayPal environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayPalMode {
    #[default]
    Sandbox,
    Live,
}

impl PayPalMode {
    pub fn base_url(&self) -> &'static str {
        match self {
            PayPalMode::Sandbox => SANDBOX_BASE_URL,
            PayPalMode::Live => LIVE_BASE_URL,
        }
    }
}

/// PayPal API configuration.
#[derive(Clone)]
pub struct PayPalConfig {
    client_id: String,
    client_secret: SecretString,
    api_base_url: String,
    timeout: Duration,
}

impl PayPalConfig {
    pub fn new(
        mode: PayPalMode,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            api_base_url: mode.base_url().to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Bound on every outbound call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for PayPalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayPalConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// PayPal Orders API client.
pub struct PayPalClient {
    config: PayPalConfig,
    http_client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl PayPalClient {
    pub fn new(config: PayPalConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
            token: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .http_client
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status, "PayPal token request failed");
            return Err(error_from_response(status, &body));
        }

        let token: AccessTokenResponse = response.json().await.map_err(|e| {
            GatewayError::new(
                GatewayErrorCode::ProviderUnavailable,
                format!("Failed to parse PayPal token response: {}", e),
            )
        })?;

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(value)
    }

    /// Asks PayPal whether a webhook delivery carries a valid signature.
    ///
    /// Returns PayPal's `verification_status`, `SUCCESS` for authentic events.
    pub(super) async fn verify_webhook_signature(
        &self,
        request: &VerifySignatureRequest<'_>,
    ) -> Result<String, GatewayError> {
        let token = self.access_token().await?;
        let response = self
            .http_client
            .post(self.url("/v1/notifications/verify-webhook-signature"))
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }

        let parsed: VerifySignatureResponse = response.json().await.map_err(|e| {
            GatewayError::new(
                GatewayErrorCode::ProviderUnavailable,
                format!("Failed to parse PayPal verification response: {}", e),
            )
        })?;
        Ok(parsed.verification_status)
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::timeout()
    } else {
        GatewayError::network(e.to_string())
    }
}

#[async_trait]
impl PaymentGateway for PayPalClient {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, GatewayError> {
        let token = self.access_token().await?;
        let response = self
            .http_client
            .post(self.url("/v2/checkout/orders"))
            .bearer_auth(token)
            .header("PayPal-Request-Id", &request.request_id)
            .json(&order_body(&request))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let error = error_from_response(status, &body);
            tracing::error!(
                status,
                code = %error.code,
                reference_id = %request.reference_id,
                "PayPal create_order failed"
            );
            return Err(error);
        }

        let order: OrderResponse = response.json().await.map_err(|e| {
            GatewayError::new(
                GatewayErrorCode::ProviderUnavailable,
                format!("Failed to parse PayPal order response: {}", e),
            )
        })?;

        tracing::info!(
            order_id = %order.id,
            status = %order.status,
            reference_id = %request.reference_id,
            "PayPal order created"
        );

        Ok(GatewayOrder {
            approve_url: order.approve_url(),
            order_id: order.id,
            status: order.status,
        })
    }

    async fn capture_order(
        &self,
        request: CaptureOrderRequest,
    ) -> Result<CaptureResult, GatewayError> {
        let token = self.access_token().await?;
        let response = self
            .http_client
            .post(self.url(&format!("/v2/checkout/orders/{}/capture", request.order_id)))
            .bearer_auth(token)
            .header("PayPal-Request-Id", &request.request_id)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body("{}")
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let error = error_from_response(status, &body);
            tracing::warn!(
                status,
                code = %error.code,
                order_id = %request.order_id,
                "PayPal capture_order failed"
            );
            return Err(error);
        }

        let parsed: CaptureResponse = response.json().await.map_err(|e| {
            GatewayError::new(
                GatewayErrorCode::ProviderUnavailable,
                format!("Failed to parse PayPal capture response: {}", e),
            )
        })?;
        parsed.into_capture_result()
    }
}
