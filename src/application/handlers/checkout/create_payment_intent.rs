//! CreatePaymentIntentHandler - prices a selection and opens a gateway intent.
//!
//! The order written here is a hint: the intent metadata carries every
//! order-identifying field, so webhook reconciliation can rebuild the order
//! if this write is lost.

use std::sync::Arc;

use crate::domain::foundation::{AuthenticatedUser, OrderId, Timestamp};
use crate::domain::order::{CheckoutError, Order, OrderContent, OrderMetadata};
use crate::domain::pricing::{AmountBounds, Platform, PriceCatalog, Quote, ServiceType};
use crate::ports::{CreatePaymentIntentRequest, OrderRepository, PaymentGateway};

use super::CustomerResolver;

/// Longest accepted target reference (a profile URL or handle). It travels
/// in intent metadata, where the gateway caps values at 500 characters.
pub const MAX_TARGET_REFERENCE_LEN: usize = 500;

/// Currency used when none is configured.
pub const DEFAULT_CURRENCY: &str = "inr";

/// Command to start a checkout.
///
/// Fields arrive unparsed from the client.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntentCommand {
    pub owner: AuthenticatedUser,
    pub service_type: String,
    pub quantity: i64,
    /// Client-computed subtotal in minor units, checked against the catalog.
    pub amount: i64,
    pub target_reference: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePaymentIntentResult {
    pub client_secret: String,
    pub order_id: OrderId,
    pub quote: Quote,
}

/// Handler for payment intent creation.
pub struct CreatePaymentIntentHandler {
    catalog: PriceCatalog,
    bounds: AmountBounds,
    currency: String,
    resolver: Arc<CustomerResolver>,
    gateway: Arc<dyn PaymentGateway>,
    orders: Arc<dyn OrderRepository>,
}

impl CreatePaymentIntentHandler {
    pub fn new(
        catalog: PriceCatalog,
        resolver: Arc<CustomerResolver>,
        gateway: Arc<dyn PaymentGateway>,
        orders: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            catalog,
            bounds: AmountBounds::default(),
            currency: DEFAULT_CURRENCY.to_string(),
            resolver,
            gateway,
            orders,
        }
    }

    pub fn with_bounds(mut self, bounds: AmountBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into().to_ascii_lowercase();
        self
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentIntentCommand,
    ) -> Result<CreatePaymentIntentResult, CheckoutError> {
        // 1. Validate the selection and price it
        let content = self.validate_selection(&cmd)?;
        let quote = self.catalog.quote(content.service_type, content.quantity)?;

        // 2. Resolve the gateway customer
        let customer_id = self.resolver.resolve(&cmd.owner).await?;

        // 3. Describe the order in intent metadata
        let now = Timestamp::now();
        let order_id = OrderId::generate(now);
        let metadata = OrderMetadata {
            order_id: order_id.clone(),
            owner_id: cmd.owner.id.clone(),
            content: content.clone(),
            amount_subtotal: quote.subtotal,
            amount_tax: quote.tax,
        };

        // 4. Create the intent for the tax-inclusive total
        let intent = self
            .gateway
            .create_payment_intent(CreatePaymentIntentRequest {
                customer_id,
                amount: quote.total,
                currency: self.currency.clone(),
                metadata: metadata.to_map(),
                description: Some(format!("{} x {}", content.service_type, content.quantity)),
                idempotency_key: Some(format!("intent-{}", order_id)),
            })
            .await
            .map_err(|e| {
                tracing::error!(
                    order_id = %order_id,
                    error = %e,
                    "Payment intent creation failed"
                );
                CheckoutError::gateway(e.message, e.retryable)
            })?;

        // 5. Record the pending order (best effort)
        let order = Order::new_pending(
            order_id.clone(),
            intent.id.clone(),
            cmd.owner.id.clone(),
            content,
            quote,
            now,
        )?;
        match self.orders.insert_if_absent(&order).await {
            Ok(true) => tracing::info!(
                order_id = %order_id,
                intent_id = %intent.id,
                amount_total = quote.total,
                "Pending order created"
            ),
            Ok(false) => tracing::warn!(
                order_id = %order_id,
                intent_id = %intent.id,
                "Order already recorded for this intent"
            ),
            Err(e) => tracing::error!(
                order_id = %order_id,
                intent_id = %intent.id,
                error = %e,
                "Failed to persist pending order, webhook reconciliation will rebuild it"
            ),
        }

        Ok(CreatePaymentIntentResult {
            client_secret: intent.client_secret,
            order_id,
            quote,
        })
    }

    fn validate_selection(
        &self,
        cmd: &CreatePaymentIntentCommand,
    ) -> Result<OrderContent, CheckoutError> {
        let service_type: ServiceType = cmd.service_type.parse()?;

        if cmd.quantity <= 0 {
            return Err(CheckoutError::validation(
                "quantity",
                "quantity must be positive",
            ));
        }
        let quantity = u32::try_from(cmd.quantity).map_err(|_| {
            CheckoutError::validation("quantity", "quantity is too large")
        })?;

        self.bounds.check(cmd.amount)?;

        let subtotal = self.catalog.subtotal(service_type, quantity)?;
        if cmd.amount != subtotal {
            return Err(CheckoutError::amount_mismatch(subtotal, cmd.amount));
        }

        let platform = match cmd.platform.as_deref().map(str::trim) {
            None | Some("") => service_type.platform(),
            Some(raw) => {
                let platform: Platform = raw.parse()?;
                if platform != service_type.platform() {
                    return Err(CheckoutError::validation(
                        "platform",
                        format!(
                            "{} is delivered on {}, not {}",
                            service_type,
                            service_type.platform(),
                            platform
                        ),
                    ));
                }
                platform
            }
        };

        let target_reference = match cmd.target_reference.as_deref().map(str::trim) {
            None => None,
            Some("") => {
                return Err(CheckoutError::validation(
                    "target_reference",
                    "target reference cannot be blank",
                ))
            }
            Some(target) if target.chars().count() > MAX_TARGET_REFERENCE_LEN => {
                return Err(CheckoutError::validation(
                    "target_reference",
                    format!("target reference exceeds {} characters", MAX_TARGET_REFERENCE_LEN),
                ))
            }
            Some(target) => Some(target.to_string()),
        };

        Ok(OrderContent {
            service_type,
            quantity,
            target_reference,
            platform,
        })
    }
}
