//! quiz-entitlements server.
//!
//! Wires configuration, storage, the payment gateway and the HTTP router,
//! then serves until SIGINT/SIGTERM. A maintenance task expires lapsed
//! subscriptions and purges old webhook records on an interval.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::ExposeSecret;
use thiserror::Error;
use tokio::sync::watch;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing_subscriber::EnvFilter;

use quiz_entitlements::adapters::auth::{JwtConfig, JwtSessionValidator};
use quiz_entitlements::adapters::http::{app_router, AppState};
use quiz_entitlements::adapters::paypal::{
    PayPalClient, PayPalConfig, PayPalMode, PayPalWebhookVerifier,
};
use quiz_entitlements::adapters::postgres::{
    self, PostgresPurchaseRepository, PostgresSubscriptionRepository, PostgresUserAccountRepository,
    PostgresWebhookEventStore,
};
use quiz_entitlements::adapters::rate_limiter::RedisRateLimiter;
use quiz_entitlements::adapters::HmacWebhookVerifier;
use quiz_entitlements::application::{
    CheckoutUrls, ExpireSubscriptionsHandler, MaintenanceTask, PurgeWebhookEventsHandler,
};
use quiz_entitlements::config::{self, AppConfig, PaymentMode};
use quiz_entitlements::domain::access::AccessPolicy;
use quiz_entitlements::domain::foundation::DomainError;
use quiz_entitlements::domain::payment::{Gateway, PriceCatalog};
use quiz_entitlements::ports::{GatewayError, WebhookVerifier};

#[derive(Debug, Error)]
enum StartupError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] config::ValidationError),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migrations: {0}")]
    Migrate(#[from] DomainError),

    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("redis connection timed out")]
    RedisTimeout,

    #[error("payment gateway client: {0}")]
    Gateway(#[from] GatewayError),

    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

/// JSON logs in production, pretty logs elsewhere. `RUST_LOG` wins over the configured level.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .init();
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    config.validate()?;
    let addr = config.server.socket_addr()?;

    // Storage
    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        postgres::run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    // Rate limiting
    let redis = redis::Client::open(config.redis.url.as_str())?;
    let redis_conn = tokio::time::timeout(
        config.redis.connect_timeout(),
        redis.get_multiplexed_tokio_connection(),
    )
    .await
    .map_err(|_| StartupError::RedisTimeout)??;
    let rate_limiter = RedisRateLimiter::new(redis_conn, config.rate_limit.limiter_config())
        .with_key_prefix(config.redis.key_prefix.clone());

    // Payment gateway
    let mode = match config.payment.paypal_mode {
        PaymentMode::Sandbox => PayPalMode::Sandbox,
        PaymentMode::Live => PayPalMode::Live,
    };
    let paypal = Arc::new(PayPalClient::new(
        PayPalConfig::new(
            mode,
            config.payment.paypal_client_id.clone(),
            config.payment.paypal_client_secret.clone(),
        )
        .with_timeout(config.payment.gateway_timeout()),
    )?);

    let state = AppState {
        purchases: Arc::new(PostgresPurchaseRepository::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        users: Arc::new(PostgresUserAccountRepository::new(pool.clone())),
        webhook_events: Arc::new(PostgresWebhookEventStore::new(pool.clone())),
        gateway: paypal.clone(),
        session_validator: Arc::new(JwtSessionValidator::new(
            JwtConfig::new(config.auth.jwt_secret.clone())
                .with_issuer(config.auth.issuer.clone())
                .with_audience(config.auth.audience.clone()),
        )),
        rate_limiter: Arc::new(rate_limiter),
        webhook_verifiers: webhook_verifiers(&config, paypal),
        policy: Arc::new(AccessPolicy::standard()),
        catalog: PriceCatalog::standard(),
        checkout_urls: CheckoutUrls::for_client(&config.server.client_url),
    };

    // Maintenance
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let maintenance = MaintenanceTask::new(
        ExpireSubscriptionsHandler::new(state.subscriptions.clone()),
        PurgeWebhookEventsHandler::new(state.webhook_events.clone(), config.webhooks.retention_days),
        config.webhooks.maintenance_interval(),
    );
    let maintenance_handle = tokio::spawn(async move { maintenance.run(shutdown_rx).await });

    // HTTP
    let app = app_router(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors_layer(&config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        paypal_mode = ?config.payment.paypal_mode,
        "Listening"
    );

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = maintenance_handle.await {
        tracing::warn!(error = %e, "Maintenance task did not stop cleanly");
    }

    served?;
    tracing::info!("Server stopped");
    Ok(())
}

fn webhook_verifiers(
    config: &AppConfig,
    paypal: Arc<PayPalClient>,
) -> HashMap<Gateway, Arc<dyn WebhookVerifier>> {
    let payment = &config.payment;
    if payment.paypal_webhook_id().is_none() {
        tracing::warn!("PayPal webhook id not set; PayPal webhooks will be rejected");
    }

    let hmac = |secret: &Option<secrecy::SecretString>| -> Arc<dyn WebhookVerifier> {
        Arc::new(HmacWebhookVerifier::new(
            secret.as_ref().map(|s| s.expose_secret().as_str()),
        ))
    };

    let mut verifiers: HashMap<Gateway, Arc<dyn WebhookVerifier>> = HashMap::new();
    verifiers.insert(
        Gateway::Paypal,
        Arc::new(PayPalWebhookVerifier::new(paypal, payment.paypal_webhook_id())),
    );
    verifiers.insert(Gateway::Aps, hmac(&payment.aps_webhook_secret));
    verifiers.insert(Gateway::Hyperpay, hmac(&payment.hyperpay_webhook_secret));
    verifiers
}

/// Configured origins, or permissive outside production when none are set.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        if config.is_production() {
            return CorsLayer::new();
        }
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
