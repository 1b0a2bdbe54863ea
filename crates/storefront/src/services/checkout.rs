//! Checkout orchestration.
//!
//! Turns a cart into an order in the commerce backend and, for online
//! payment, a payment at the provider. Prices are always derived here: the
//! shipping cost is recomputed from the destination and the product volumes
//! loaded from the backend, whatever the client claims.
//!
//! # Order lifecycle
//!
//! ```text
//! submit (cod)     pending ──▶ processing
//! submit (online)  pending ──webhook paid──▶ processing
//!                  pending ──webhook failed/expired/canceled──▶ failed
//! retry            failed ──▶ pending (new payment)
//! ```

use std::collections::HashMap;
use std::net::{IpAddr, Ipv6Addr};
use std::sync::Arc;

use haardhout_core::{
    CheckoutRef, CurrencyCode, Email, OrderId, OrderKey, OrderStatus, PaymentId, PaymentMethod,
    ProductId, RateCard,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::tracking::{ConversionTracker, PurchaseEvent};
use super::validation::{FieldErrors, ValidCheckout, validate_checkout};
use crate::commerce::{
    Address, CommerceBackend, CommerceError, LineItem, NewOrder, Order, OrderLine, Product,
    ShippingLine,
};
use crate::payments::{NewPayment, PaymentError, PaymentProvider};

/// Shipping line title stored on orders.
const SHIPPING_METHOD_TITLE: &str = "Bezorging";

/// Path of the confirmation page the customer lands on after checkout.
const CONFIRMATION_PATH: &str = "/checkout/confirmation";

/// Path of the payment webhook, relative to the public base URL.
pub const PAYMENT_WEBHOOK_PATH: &str = "/api/webhooks/payment";

/// Errors that can occur during checkout and order lookups.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request has invalid fields.
    #[error("Invalid checkout: {}", .0.keys().cloned().collect::<Vec<_>>().join(", "))]
    Validation(FieldErrors),

    /// No delivery rate exists for the destination and volume.
    #[error("Delivery not available for this postal code")]
    UnsupportedDestination,

    /// Unknown order, or the presented key does not match.
    #[error("Order not found")]
    OrderNotFound,

    /// Retry requested for an order that is already paid.
    #[error("Order is already paid")]
    AlreadyPaid,

    /// Retry requested for an order whose payment has not failed.
    #[error("Order payment has not failed (status {0})")]
    NotFailed(OrderStatus),

    /// The payment provider did not return a hosted checkout page.
    #[error("Payment provider returned no checkout URL")]
    MissingCheckoutUrl,

    /// Commerce backend operation failed.
    #[error("Commerce backend error: {0}")]
    Commerce(#[from] CommerceError),

    /// Payment provider operation failed.
    #[error("Payment provider error: {0}")]
    Payment(#[from] PaymentError),
}

/// Customer details as submitted by the checkout form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub house_number: String,
    pub house_number_suffix: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub company: Option<String>,
}

/// One cart line.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Checkout form submission.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub customer: CustomerInput,
    pub items: Vec<CartLine>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub terms_accepted: bool,
    /// Shipping cost shown to the customer. Only logged, never charged.
    #[serde(default)]
    pub shipping_cost: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub order_id: OrderId,
    pub order_key: OrderKey,
    /// Hosted payment page, or the confirmation page for pay-on-delivery.
    pub redirect_url: String,
    #[serde(skip)]
    pub checkout_ref: CheckoutRef,
}

/// What a payment webhook did to its order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The order moved to the given status.
    Updated(OrderStatus),
    /// The payment status does not change the order.
    Unchanged,
    /// The payment does not belong to a known order, or is not the order's
    /// current payment.
    Ignored,
}

/// Order status for the confirmation page.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusSummary {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub paid: bool,
    pub total: Decimal,
    pub currency: CurrencyCode,
}

/// Order contents for the confirmation page.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub payment_method: Option<PaymentMethod>,
    pub total: Decimal,
    pub shipping_total: Decimal,
    pub currency: CurrencyCode,
    pub line_items: Vec<OrderLine>,
    pub billing: Address,
}

/// Checkout orchestrator.
#[derive(Clone)]
pub struct CheckoutService {
    commerce: Arc<dyn CommerceBackend>,
    payments: Arc<dyn PaymentProvider>,
    tracker: ConversionTracker,
    rate_card: RateCard,
    base_url: String,
    webhook_url: Option<String>,
}

impl CheckoutService {
    /// Create a checkout service using the standard rate card.
    ///
    /// `base_url` is the storefront's public URL. Payment webhooks are only
    /// requested when it is publicly reachable.
    #[must_use]
    pub fn new(
        commerce: Arc<dyn CommerceBackend>,
        payments: Arc<dyn PaymentProvider>,
        tracker: ConversionTracker,
        base_url: &str,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let webhook_url = webhook_url_for(&base_url);
        if webhook_url.is_none() {
            warn!(base_url = %base_url, "Base URL is not public, payment webhooks disabled");
        }
        Self {
            commerce,
            payments,
            tracker,
            rate_card: RateCard::STANDARD,
            base_url,
            webhook_url,
        }
    }

    /// Use a different rate card.
    #[must_use]
    pub fn with_rate_card(mut self, rate_card: RateCard) -> Self {
        self.rate_card = rate_card;
        self
    }

    /// Webhook URL sent with new payments.
    #[must_use]
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref()
    }

    /// Validate a checkout, create the order and start its payment.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Validation`] for invalid fields or unknown products
    /// - [`CheckoutError::UnsupportedDestination`] when no rate applies; no
    ///   order is created
    /// - [`CheckoutError::MissingCheckoutUrl`] when the provider returns no
    ///   payment page; the order stays `pending`
    /// - Upstream errors from the commerce backend or payment provider
    #[instrument(skip(self, request), fields(payment_method = ?request.payment_method))]
    pub async fn submit_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let checkout = validate_checkout(&request).map_err(CheckoutError::Validation)?;

        let product_ids: Vec<ProductId> = checkout.items.iter().map(|l| l.product_id).collect();
        let products = self.commerce.get_products(&product_ids).await?;
        let volume = total_volume(&checkout.items, &products).map_err(CheckoutError::Validation)?;

        let quote = self
            .rate_card
            .quote(checkout.customer.postal_code.as_compact(), volume)
            .ok_or(CheckoutError::UnsupportedDestination)?;

        if let Some(client_cost) = request.shipping_cost
            && client_cost != quote.price
        {
            info!(
                client_cost = %client_cost,
                shipping_cost = %quote.price,
                "Ignoring client-supplied shipping cost"
            );
        }

        let checkout_ref = CheckoutRef::generate();
        let order = self
            .commerce
            .create_order(new_order(&checkout, quote.price, checkout_ref))
            .await?;
        info!(
            order_id = %order.id,
            checkout_ref = %checkout_ref,
            volume,
            shipping_cost = %quote.price,
            "Order created"
        );

        let (order, redirect_url) = match checkout.payment_method {
            PaymentMethod::PayOnDelivery => {
                let order = self
                    .commerce
                    .update_order_status(order.id, OrderStatus::Processing)
                    .await?;
                self.track_purchase(&order, checkout_ref.to_string());
                let redirect_url = confirmation_path(order.id, &order.key, checkout_ref);
                (order, redirect_url)
            }
            PaymentMethod::PayOnline => {
                let redirect_url = self.start_online_payment(&order, checkout_ref).await?;
                (order, redirect_url)
            }
        };

        Ok(CheckoutOutcome {
            order_id: order.id,
            order_key: order.key,
            redirect_url,
            checkout_ref,
        })
    }

    /// Apply a payment webhook. Never fails: errors are logged.
    pub async fn handle_payment_webhook(&self, payment_id: &PaymentId) {
        match self.process_payment_webhook(payment_id).await {
            Ok(outcome) => info!(payment_id = %payment_id, ?outcome, "Payment webhook processed"),
            Err(e) => tracing::error!(
                payment_id = %payment_id,
                error = %e,
                "Payment webhook failed"
            ),
        }
    }

    /// Re-read a payment and project its status onto its order.
    ///
    /// # Errors
    ///
    /// Returns upstream errors from the payment provider or commerce backend.
    #[instrument(skip(self))]
    pub async fn process_payment_webhook(
        &self,
        payment_id: &PaymentId,
    ) -> Result<WebhookOutcome, CheckoutError> {
        let payment = self.payments.get_payment(payment_id).await?;

        let Some(order_id) = payment.order_id else {
            warn!("Payment has no order id in its metadata");
            return Ok(WebhookOutcome::Ignored);
        };

        let order = match self.commerce.get_order(order_id).await {
            Ok(order) => order,
            Err(CommerceError::NotFound(_)) => {
                warn!(order_id = %order_id, "Payment refers to an unknown order");
                return Ok(WebhookOutcome::Ignored);
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(key) = &payment.order_key
            && !order.key.matches(key.expose())
        {
            warn!(order_id = %order_id, "Payment metadata key does not match order");
            return Ok(WebhookOutcome::Ignored);
        }

        if let Some(active) = &order.payment_id
            && active != &payment.id
        {
            info!(
                order_id = %order_id,
                active_payment_id = %active,
                "Ignoring webhook for superseded payment"
            );
            return Ok(WebhookOutcome::Ignored);
        }

        let Some(next) = order.status.after_payment(payment.status) else {
            debug!(
                order_id = %order_id,
                order_status = %order.status,
                payment_status = %payment.status,
                "Payment status does not change order"
            );
            return Ok(WebhookOutcome::Unchanged);
        };

        let updated = self.commerce.update_order_status(order.id, next).await?;
        info!(
            order_id = %order_id,
            from = %order.status,
            to = %next,
            payment_status = %payment.status,
            "Order status updated from payment"
        );

        if next == OrderStatus::Processing {
            let event_id = order
                .checkout_ref
                .map_or_else(|| order.id.to_string(), |r| r.to_string());
            self.track_purchase(&updated, event_id);
        }

        Ok(WebhookOutcome::Updated(next))
    }

    /// Start a new online payment for an order whose payment failed.
    ///
    /// Returns the provider's checkout URL.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::OrderNotFound`] for unknown orders or wrong keys
    /// - [`CheckoutError::AlreadyPaid`] for paid orders
    /// - [`CheckoutError::NotFailed`] for any other status than `failed`
    #[instrument(skip(self, key))]
    pub async fn retry_payment(&self, order_id: OrderId, key: &str) -> Result<String, CheckoutError> {
        let order = self.authorized_order(order_id, key).await?;

        match order.status {
            OrderStatus::Failed => {}
            status if status.is_paid() => return Err(CheckoutError::AlreadyPaid),
            status => return Err(CheckoutError::NotFailed(status)),
        }

        let order = self.commerce.reopen_order(order.id).await?;
        info!(order_id = %order_id, "Retrying payment");

        self.start_online_payment(&order, CheckoutRef::generate())
            .await
            .inspect_err(|e| {
                warn!(
                    order_id = %order_id,
                    error = %e,
                    "Order reopened for retry but no payment was started"
                );
            })
    }

    /// Current status of an order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::OrderNotFound`] for unknown orders or wrong keys.
    pub async fn get_order_status(
        &self,
        order_id: OrderId,
        key: &str,
    ) -> Result<OrderStatusSummary, CheckoutError> {
        let order = self.authorized_order(order_id, key).await?;
        Ok(OrderStatusSummary {
            order_id: order.id,
            status: order.status,
            paid: order.status.is_paid(),
            total: order.total,
            currency: order.currency,
        })
    }

    /// Contents of an order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::OrderNotFound`] for unknown orders or wrong keys.
    pub async fn get_order_details(
        &self,
        order_id: OrderId,
        key: &str,
    ) -> Result<OrderDetails, CheckoutError> {
        let order = self.authorized_order(order_id, key).await?;
        Ok(OrderDetails {
            order_id: order.id,
            status: order.status,
            payment_method: order.payment_method,
            total: order.total,
            shipping_total: order.shipping_total,
            currency: order.currency,
            line_items: order.line_items,
            billing: order.billing,
        })
    }

    /// Load an order, treating a wrong key exactly like an unknown order.
    async fn authorized_order(&self, order_id: OrderId, key: &str) -> Result<Order, CheckoutError> {
        let order = match self.commerce.get_order(order_id).await {
            Ok(order) => order,
            Err(CommerceError::NotFound(_)) => return Err(CheckoutError::OrderNotFound),
            Err(e) => return Err(e.into()),
        };
        if !order.key.matches(key) {
            warn!(order_id = %order_id, "Order key mismatch");
            return Err(CheckoutError::OrderNotFound);
        }
        Ok(order)
    }

    /// Create a payment for the order total and attach it to the order.
    async fn start_online_payment(
        &self,
        order: &Order,
        checkout_ref: CheckoutRef,
    ) -> Result<String, CheckoutError> {
        let payment = self
            .payments
            .create_payment(NewPayment {
                amount: order.total_price(),
                description: format!("Bestelling {}", order.id),
                redirect_url: format!(
                    "{}{}",
                    self.base_url,
                    confirmation_path(order.id, &order.key, checkout_ref)
                ),
                webhook_url: self.webhook_url.clone(),
                order_id: order.id,
                order_key: order.key.clone(),
            })
            .await?;
        info!(order_id = %order.id, payment_id = %payment.id, "Payment created");

        // Best effort: new and reopened orders carry no payment id, so they
        // accept webhooks of any of their payments
        if let Err(e) = self.commerce.attach_payment(order.id, &payment.id).await {
            warn!(
                order_id = %order.id,
                payment_id = %payment.id,
                error = %e,
                "Failed to attach payment to order"
            );
        }

        payment.checkout_url.ok_or(CheckoutError::MissingCheckoutUrl)
    }

    fn track_purchase(&self, order: &Order, event_id: String) {
        self.tracker.notify(PurchaseEvent {
            event_id,
            order_id: order.id,
            email: Email::parse(&order.billing.email).ok(),
            value: order.total_price(),
        });
    }
}

fn new_order(checkout: &ValidCheckout, shipping_cost: Decimal, checkout_ref: CheckoutRef) -> NewOrder {
    NewOrder {
        billing: checkout.customer.to_address(),
        line_items: checkout.items.clone(),
        shipping: ShippingLine {
            method_title: SHIPPING_METHOD_TITLE.to_string(),
            total: shipping_cost,
        },
        payment_method: checkout.payment_method,
        customer_note: checkout.notes.clone(),
        checkout_ref,
    }
}

/// Total volume in cubic meters of the ordered items.
///
/// Every item must refer to a known product.
fn total_volume(items: &[LineItem], products: &[Product]) -> Result<f64, FieldErrors> {
    let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let mut errors = FieldErrors::new();
    let mut volume = 0.0;

    for (index, item) in items.iter().enumerate() {
        match by_id.get(&item.product_id) {
            Some(product) => volume += product.volume_m3 * f64::from(item.quantity),
            None => {
                errors.insert(
                    format!("items[{index}].product_id"),
                    "product not found".to_string(),
                );
            }
        }
    }

    if errors.is_empty() {
        Ok(volume)
    } else {
        Err(errors)
    }
}

/// Confirmation page path with the order credentials and correlation id.
fn confirmation_path(order_id: OrderId, key: &OrderKey, checkout_ref: CheckoutRef) -> String {
    format!(
        "{CONFIRMATION_PATH}?order_id={order_id}&key={}&ref={checkout_ref}",
        urlencoding::encode(key.expose())
    )
}

/// Webhook URL for a public base URL.
///
/// Returns `None` for hosts the payment provider cannot reach: `localhost`,
/// `.local` names, loopback, private and link-local addresses.
#[must_use]
pub fn webhook_url_for(base_url: &str) -> Option<String> {
    let parsed = url::Url::parse(base_url).ok()?;
    let routable = match parsed.host()? {
        url::Host::Domain(domain) => {
            let domain = domain.to_ascii_lowercase();
            !(domain == "localhost"
                || domain.ends_with(".localhost")
                || domain.ends_with(".local")
                || domain.ends_with(".internal"))
        }
        url::Host::Ipv4(ip) => is_public_ip(IpAddr::V4(ip)),
        url::Host::Ipv6(ip) => is_public_ip(IpAddr::V6(ip)),
    };
    routable.then(|| format!("{}{PAYMENT_WEBHOOK_PATH}", base_url.trim_end_matches('/')))
}

fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ip) => {
            !(ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified())
        }
        IpAddr::V6(ip) => !(ip.is_loopback() || ip.is_unspecified() || is_unique_local(ip)),
    }
}

/// `fc00::/7`
const fn is_unique_local(ip: Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xfe00) == 0xfc00
}
