//! CreateOrderHandler - Command handler for opening a gateway order.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId, ValidationError};
use crate::domain::idempotency::build_deterministic_request_id;
use crate::domain::payment::{
    generate_order_ref, BillingCycle, Currency, Gateway, NewPurchase, PlanType, PriceCatalog,
    Purchase, PurchaseStatus,
};
use crate::ports::{
    CreateOrderRequest, GatewayError, GatewayOrder, PaymentGateway, PurchaseRepository,
};

/// Where the gateway sends the buyer after approval or cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub return_url: String,
    pub cancel_url: String,
}

impl CheckoutUrls {
    /// `{client_url}/payment/success` and `{client_url}/payment/cancel`.
    pub fn for_client(client_url: &str) -> Self {
        let base = client_url.trim_end_matches('/');
        Self {
            return_url: format!("{}/payment/success", base),
            cancel_url: format!("{}/payment/cancel", base),
        }
    }
}

/// Command to create an order for a plan.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub user_id: UserId,
    pub plan_type: PlanType,
    pub currency: Currency,
    pub billing_cycle: BillingCycle,
    /// Client cart id. Without one every checkout attempt is a new cart.
    pub cart_id: Option<String>,
}

impl CreateOrderCommand {
    /// Key the request id is derived from.
    ///
    /// A client cart id is stable across retries. The fallback is unique per
    /// attempt so a later checkout of the same plan opens a new order.
    pub fn cart_key(&self, now: Timestamp) -> String {
        match self.cart_id.as_deref().map(str::trim) {
            Some(cart) if !cart.is_empty() => cart.to_string(),
            _ => format!(
                "plan-{}-{}-{}-{}-{}",
                self.plan_type,
                self.billing_cycle,
                self.currency,
                now.as_unix_millis(),
                Uuid::new_v4().simple()
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub purchase: Purchase,
    pub order: GatewayOrder,
    /// True when a retried request found the purchase it created before.
    pub replayed: bool,
}

#[derive(Debug, Error)]
pub enum CreateOrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Payment gateway error: {0}")]
    Gateway(GatewayError),

    /// The cart's order was already captured, declined or refunded.
    #[error("Cart for order {order_id} is already settled ({status})")]
    CartSettled {
        order_id: String,
        status: PurchaseStatus,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Handler for order creation.
///
/// The price comes from the server-side catalog. The outbound request id is
/// deterministic in (cart, user), so a client retry with the same cart
/// replays the original gateway order and finds the purchase stored the
/// first time. Only a still-pending purchase is handed back.
pub struct CreateOrderHandler {
    purchases: Arc<dyn PurchaseRepository>,
    gateway: Arc<dyn PaymentGateway>,
    catalog: PriceCatalog,
    urls: CheckoutUrls,
}

impl CreateOrderHandler {
    pub fn new(
        purchases: Arc<dyn PurchaseRepository>,
        gateway: Arc<dyn PaymentGateway>,
        catalog: PriceCatalog,
        urls: CheckoutUrls,
    ) -> Self {
        Self {
            purchases,
            gateway,
            catalog,
            urls,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateOrderCommand,
    ) -> Result<CreateOrderResult, CreateOrderError> {
        let now = Timestamp::now();

        // 1. Price from the catalog, within amount bounds
        let amount = self
            .catalog
            .price_for(cmd.plan_type, cmd.billing_cycle, cmd.currency)?;

        // 2. Deterministic idempotency key
        let request_id =
            build_deterministic_request_id(&cmd.cart_key(now), cmd.user_id.as_str())?;
        let reference_id = generate_order_ref(now);

        // 3. Open the gateway order
        let order = self
            .gateway
            .create_order(CreateOrderRequest {
                amount,
                plan_type: cmd.plan_type,
                billing_cycle: cmd.billing_cycle,
                reference_id: reference_id.clone(),
                description: format!("{} Plan - {}", cmd.plan_type, cmd.billing_cycle),
                request_id: request_id.clone(),
                return_url: self.urls.return_url.clone(),
                cancel_url: self.urls.cancel_url.clone(),
            })
            .await
            .map_err(CreateOrderError::Gateway)?;

        // 4. A replayed gateway order already has its purchase
        if let Some(existing) = self
            .purchases
            .find_by_gateway_order_id(&order.order_id)
            .await?
        {
            if existing.user_id != cmd.user_id {
                return Err(DomainError::new(
                    ErrorCode::Conflict,
                    format!("gateway order {} belongs to another user", order.order_id),
                )
                .into());
            }
            if existing.status != PurchaseStatus::Pending {
                return Err(CreateOrderError::CartSettled {
                    order_id: order.order_id,
                    status: existing.status,
                });
            }
            tracing::info!(
                order_id = %order.order_id,
                purchase_id = %existing.id,
                "Create order replayed"
            );
            return Ok(CreateOrderResult {
                purchase: existing,
                order,
                replayed: true,
            });
        }

        // 5. Persist the pending purchase
        let mut purchase = Purchase::pending(
            NewPurchase {
                gateway: Gateway::Paypal,
                gateway_order_id: order.order_id.clone(),
                user_id: cmd.user_id,
                amount,
                plan_type: cmd.plan_type,
                billing_cycle: cmd.billing_cycle,
                request_id,
            },
            now,
        )?;
        purchase.order_ref = reference_id;

        if let Err(err) = self.purchases.insert(&purchase).await {
            // A concurrent retry inserted first
            if err.code == ErrorCode::Conflict {
                if let Some(existing) = self
                    .purchases
                    .find_by_gateway_order_id(&order.order_id)
                    .await?
                {
                    return Ok(CreateOrderResult {
                        purchase: existing,
                        order,
                        replayed: true,
                    });
                }
            }
            return Err(err.into());
        }

        tracing::info!(
            order_id = %order.order_id,
            order_ref = %purchase.order_ref,
            user_id = %purchase.user_id,
            plan_type = %purchase.plan_type,
            amount = %purchase.amount,
            "Order created"
        );

        Ok(CreateOrderResult {
            purchase,
            order,
            replayed: false,
        })
    }
}
