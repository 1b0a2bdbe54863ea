//! Integration test support for the Haardhout storefront.
//!
//! The storefront talks to WooCommerce, Mollie and Meta through traits, so
//! these tests swap in in-memory implementations and drive both the checkout
//! orchestrator and the full axum router without network access.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p haardhout-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - Order creation, shipping integrity, payment start
//! - `payment_webhooks` - Webhook projection, stale payments, retries
//! - `api_routes` - HTTP status codes and response shapes via the router

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use haardhout_core::{
    CurrencyCode, OrderId, OrderKey, OrderStatus, PaymentId, PaymentStatus, ProductId,
};
use haardhout_storefront::commerce::{
    CommerceBackend, CommerceError, NewOrder, Order, OrderLine, Product,
};
use haardhout_storefront::config::AddressLookupConfig;
use haardhout_storefront::payments::{NewPayment, Payment, PaymentError, PaymentProvider};
use haardhout_storefront::routes;
use haardhout_storefront::services::{
    AddressLookup, CheckoutService, ConversionSink, ConversionTracker, PurchaseEvent,
    TrackingError,
};
use haardhout_storefront::state::AppState;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Public base URL used by default; payment webhooks are enabled for it.
pub const PUBLIC_BASE_URL: &str = "https://haardhout.example";

/// Oak logs, one cubic meter per unit.
pub const OAK: ProductId = ProductId::new(1);
/// Birch logs, half a cubic meter per unit.
pub const BIRCH: ProductId = ProductId::new(2);
/// Kindling without volume metadata.
pub const KINDLING: ProductId = ProductId::new(3);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Commerce backend
// =============================================================================

/// Commerce backend keeping products and orders in memory.
///
/// Totals are computed like WooCommerce does: line prices times quantities
/// plus the shipping line.
pub struct InMemoryCommerce {
    products: Mutex<HashMap<ProductId, Product>>,
    orders: Mutex<BTreeMap<OrderId, Order>>,
    next_id: AtomicU64,
    fail_attach: AtomicBool,
}

impl Default for InMemoryCommerce {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCommerce {
    /// Backend seeded with the three test products.
    #[must_use]
    pub fn new() -> Self {
        let commerce = Self {
            products: Mutex::new(HashMap::new()),
            orders: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1001),
            fail_attach: AtomicBool::new(false),
        };
        commerce.add_product(OAK, "Eikenhout 1 m³", Decimal::new(12900, 2), 1.0);
        commerce.add_product(BIRCH, "Berkenhout 0,5 m³", Decimal::new(7900, 2), 0.5);
        commerce.add_product(KINDLING, "Aanmaakhout", Decimal::new(995, 2), 1.0);
        commerce
    }

    pub fn add_product(&self, id: ProductId, name: &str, price: Decimal, volume_m3: f64) {
        lock(&self.products).insert(
            id,
            Product {
                id,
                name: name.to_string(),
                price,
                volume_m3,
            },
        );
    }

    /// Make `attach_payment` fail.
    pub fn fail_attach(&self) {
        self.fail_attach.store(true, Ordering::SeqCst);
    }

    /// Snapshot of a stored order.
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<Order> {
        lock(&self.orders).get(&id).cloned()
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        lock(&self.orders).len()
    }

    /// Overwrite an order's status without going through the state machine.
    pub fn force_status(&self, id: OrderId, status: OrderStatus) {
        if let Some(order) = lock(&self.orders).get_mut(&id) {
            order.status = status;
        }
    }
}

#[async_trait]
impl CommerceBackend for InMemoryCommerce {
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, CommerceError> {
        let products = lock(&self.products);
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, CommerceError> {
        let products = lock(&self.products).clone();
        let mut line_items = Vec::with_capacity(order.line_items.len());
        for item in &order.line_items {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| CommerceError::NotFound(format!("product {}", item.product_id)))?;
            line_items.push(OrderLine {
                product_id: product.id,
                name: product.name.clone(),
                quantity: item.quantity,
                total: product.price * Decimal::from(item.quantity),
            });
        }
        let subtotal: Decimal = line_items.iter().map(|l| l.total).sum();

        let id = OrderId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let created = Order {
            id,
            key: OrderKey::new(format!("wc_order_test{id}")),
            status: OrderStatus::Pending,
            total: subtotal + order.shipping.total,
            shipping_total: order.shipping.total,
            currency: CurrencyCode::EUR,
            payment_method: Some(order.payment_method),
            payment_id: None,
            checkout_ref: Some(order.checkout_ref),
            billing: order.billing,
            line_items,
        };
        lock(&self.orders).insert(id, created.clone());
        Ok(created)
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, CommerceError> {
        self.order(id)
            .ok_or_else(|| CommerceError::NotFound(format!("order {id}")))
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, CommerceError> {
        let mut orders = lock(&self.orders);
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| CommerceError::NotFound(format!("order {id}")))?;
        order.status = status;
        Ok(order.clone())
    }

    async fn reopen_order(&self, id: OrderId) -> Result<Order, CommerceError> {
        let mut orders = lock(&self.orders);
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| CommerceError::NotFound(format!("order {id}")))?;
        order.status = OrderStatus::Pending;
        order.payment_id = None;
        Ok(order.clone())
    }

    async fn attach_payment(
        &self,
        id: OrderId,
        payment_id: &PaymentId,
    ) -> Result<(), CommerceError> {
        if self.fail_attach.load(Ordering::SeqCst) {
            return Err(CommerceError::Api {
                status: 500,
                message: "attach failed".to_string(),
            });
        }
        let mut orders = lock(&self.orders);
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| CommerceError::NotFound(format!("order {id}")))?;
        order.payment_id = Some(payment_id.clone());
        Ok(())
    }
}

// =============================================================================
// Payment provider
// =============================================================================

/// Payment provider that records every payment it creates.
pub struct RecordingPayments {
    created: Mutex<Vec<NewPayment>>,
    payments: Mutex<HashMap<PaymentId, Payment>>,
    next_id: AtomicU64,
    omit_checkout_url: AtomicBool,
}

impl Default for RecordingPayments {
    fn default() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            payments: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            omit_checkout_url: AtomicBool::new(false),
        }
    }
}

impl RecordingPayments {
    /// Payments requested so far, oldest first.
    #[must_use]
    pub fn created(&self) -> Vec<NewPayment> {
        lock(&self.created).clone()
    }

    /// Id of the most recently created payment.
    #[must_use]
    pub fn last_payment_id(&self) -> Option<PaymentId> {
        let n = self.next_id.load(Ordering::SeqCst).checked_sub(1)?;
        (n > 0).then(|| PaymentId::new(format!("tr_test{n}")))
    }

    /// Change a payment's status, as the customer paying (or not) would.
    pub fn set_status(&self, id: &PaymentId, status: PaymentStatus) {
        if let Some(payment) = lock(&self.payments).get_mut(id) {
            payment.status = status;
        }
    }

    /// Register a payment the storefront did not create.
    pub fn insert(&self, payment: Payment) {
        lock(&self.payments).insert(payment.id.clone(), payment);
    }

    /// Return new payments without a hosted payment page.
    pub fn omit_checkout_url(&self) {
        self.omit_checkout_url.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentProvider for RecordingPayments {
    async fn create_payment(&self, payment: NewPayment) -> Result<Payment, PaymentError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = PaymentId::new(format!("tr_test{n}"));
        let checkout_url = (!self.omit_checkout_url.load(Ordering::SeqCst))
            .then(|| format!("https://pay.example/checkout/{id}"));

        let created = Payment {
            id: id.clone(),
            status: PaymentStatus::Open,
            amount: payment.amount,
            checkout_url,
            order_id: Some(payment.order_id),
            order_key: Some(payment.order_key.clone()),
        };
        lock(&self.created).push(payment);
        lock(&self.payments).insert(id, created.clone());
        Ok(created)
    }

    async fn get_payment(&self, id: &PaymentId) -> Result<Payment, PaymentError> {
        lock(&self.payments)
            .get(id)
            .cloned()
            .ok_or_else(|| PaymentError::NotFound(id.to_string()))
    }
}

// =============================================================================
// Conversion tracking
// =============================================================================

/// Conversion sink that keeps every event.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PurchaseEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn events(&self) -> Vec<PurchaseEvent> {
        lock(&self.events).clone()
    }

    /// Wait until at least `count` events arrived; tracking runs on spawned
    /// tasks. Returns whatever arrived within one second.
    pub async fn wait_for(&self, count: usize) -> Vec<PurchaseEvent> {
        for _ in 0..100 {
            let events = self.events();
            if events.len() >= count {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.events()
    }
}

#[async_trait]
impl ConversionSink for RecordingSink {
    async fn purchase(&self, event: &PurchaseEvent) -> Result<(), TrackingError> {
        lock(&self.events).push(event.clone());
        Ok(())
    }
}

// =============================================================================
// Test context
// =============================================================================

/// Storefront state wired to in-memory collaborators.
pub struct TestContext {
    pub commerce: Arc<InMemoryCommerce>,
    pub payments: Arc<RecordingPayments>,
    pub sink: Arc<RecordingSink>,
    pub state: AppState,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Context with a public base URL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(PUBLIC_BASE_URL)
    }

    /// Context with the given storefront base URL.
    ///
    /// # Panics
    ///
    /// Panics if the address lookup client cannot be built.
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        let commerce = Arc::new(InMemoryCommerce::new());
        let payments = Arc::new(RecordingPayments::default());
        let sink = Arc::new(RecordingSink::default());

        // Nothing listens on the discard port: lookups degrade to "not found"
        let address_lookup = AddressLookup::new(&AddressLookupConfig {
            url: "http://127.0.0.1:9/search".to_string(),
            timeout: Duration::from_millis(500),
        })
        .expect("address lookup client");

        let state = AppState::with_backends(
            commerce.clone(),
            payments.clone(),
            ConversionTracker::new(sink.clone()),
            base_url,
            address_lookup,
        );

        Self {
            commerce,
            payments,
            sink,
            state,
        }
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        self.state.checkout()
    }

    /// The full application router without rate limiting.
    #[must_use]
    pub fn router(&self) -> Router {
        haardhout_storefront::app(self.state.clone(), routes::routes())
    }

    /// Send a request through the router and decode the JSON body.
    ///
    /// Non-JSON bodies decode to `Value::Null`.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body cannot be read.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.expect("router");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(get(uri)).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.send(post_json(uri, body)).await
    }

    /// Post the payment provider's webhook form.
    pub async fn post_webhook(&self, form: &str) -> (StatusCode, Value) {
        self.send(post_form("/api/webhooks/payment", form)).await
    }
}

// =============================================================================
// Request builders
// =============================================================================

/// # Panics
///
/// Panics on an invalid URI.
#[must_use]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

/// # Panics
///
/// Panics on an invalid URI.
#[must_use]
pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// # Panics
///
/// Panics on an invalid URI.
#[must_use]
pub fn post_form(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("request")
}

// =============================================================================
// Fixtures
// =============================================================================

/// A valid checkout body for the storefront API.
///
/// `items` is a list of `(product_id, quantity)` pairs.
#[must_use]
pub fn checkout_body(payment_method: &str, postal_code: &str, items: &[(u64, u32)]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(product_id, quantity)| json!({"product_id": product_id, "quantity": quantity}))
        .collect();
    json!({
        "customer": {
            "first_name": "Sanne",
            "last_name": "de Vries",
            "email": "Sanne@Example.nl",
            "phone": "06 1234 5678",
            "street": "Herengracht",
            "house_number": "182",
            "postal_code": postal_code,
            "city": "Amsterdam"
        },
        "items": items,
        "payment_method": payment_method,
        "terms_accepted": true,
        "notes": "Graag achterom leveren"
    })
}
