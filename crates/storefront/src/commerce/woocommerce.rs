//! WooCommerce REST API (v3) client.
//!
//! Authenticates with HTTP basic auth using the consumer key and secret.
//! Products are cached using `moka` (5-minute TTL); orders are never cached.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use haardhout_core::{
    CheckoutRef, CurrencyCode, OrderId, OrderKey, OrderStatus, PaymentId, PaymentMethod,
    ProductId,
};
use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{
    Address, CommerceBackend, CommerceError, DEFAULT_PRODUCT_VOLUME, NewOrder, Order, OrderLine,
    Product,
};
use crate::config::WooCommerceConfig;

/// Order meta key holding the checkout correlation id.
const CHECKOUT_REF_META_KEY: &str = "_haardhout_checkout_ref";

/// Product meta key holding the volume of one unit in cubic meters.
const VOLUME_META_KEY: &str = "volume_m3";

/// Client for the WooCommerce REST API.
#[derive(Clone)]
pub struct WooCommerceClient {
    inner: Arc<WooCommerceClientInner>,
}

struct WooCommerceClientInner {
    client: reqwest::Client,
    api_base: String,
    products: Cache<ProductId, Product>,
}

impl WooCommerceClient {
    /// Create a new WooCommerce API client.
    ///
    /// # Errors
    ///
    /// Returns error if the credentials are not valid header characters or the
    /// HTTP client fails to build.
    pub fn new(config: &WooCommerceConfig, timeout: Duration) -> Result<Self, CommerceError> {
        let credentials = format!(
            "{}:{}",
            config.consumer_key.expose_secret(),
            config.consumer_secret.expose_secret()
        );
        let mut auth_value = HeaderValue::from_str(&format!("Basic {}", BASE64.encode(credentials)))
            .map_err(|e| CommerceError::Parse(format!("Invalid credentials format: {e}")))?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(WooCommerceClientInner {
                client,
                api_base: format!("{}/wp-json/wc/v3", config.url),
                products,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.api_base)
    }

    /// Send a request and decode the JSON response.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<T, CommerceError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CommerceError::NotFound(resource.to_string()));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "WooCommerce API returned non-success status"
            );
            return Err(CommerceError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse WooCommerce response"
            );
            CommerceError::Parse(e.to_string())
        })
    }
}

#[async_trait]
impl CommerceBackend for WooCommerceClient {
    #[instrument(skip(self), fields(count = ids.len()))]
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, CommerceError> {
        let mut products = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        let mut seen = HashSet::new();

        for id in ids.iter().filter(|id| seen.insert(**id)) {
            match self.inner.products.get(id).await {
                Some(product) => products.push(product),
                None => missing.push(id.to_string()),
            }
        }

        if missing.is_empty() {
            debug!("Cache hit for all products");
            return Ok(products);
        }

        let url = format!(
            "{}?include={}&per_page=100",
            self.url("/products"),
            urlencoding::encode(&missing.join(","))
        );
        let fetched: Vec<WcProduct> = self.send(self.inner.client.get(url), "products").await?;

        for raw in fetched {
            let product = convert_product(raw)?;
            self.inner.products.insert(product.id, product.clone()).await;
            products.push(product);
        }

        Ok(products)
    }

    #[instrument(skip(self, order), fields(checkout_ref = %order.checkout_ref))]
    async fn create_order(&self, order: NewOrder) -> Result<Order, CommerceError> {
        let body = new_order_body(&order);
        let created: WcOrder = self
            .send(self.inner.client.post(self.url("/orders")).json(&body), "order")
            .await?;
        let created = convert_order(created)?;
        debug!(order_id = %created.id, "Order created");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get_order(&self, id: OrderId) -> Result<Order, CommerceError> {
        let raw: WcOrder = self
            .send(
                self.inner.client.get(self.url(&format!("/orders/{id}"))),
                &format!("order {id}"),
            )
            .await?;
        convert_order(raw)
    }

    #[instrument(skip(self))]
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, CommerceError> {
        let body = serde_json::json!({ "status": status.as_str() });
        let raw: WcOrder = self
            .send(
                self.inner
                    .client
                    .put(self.url(&format!("/orders/{id}")))
                    .json(&body),
                &format!("order {id}"),
            )
            .await?;
        convert_order(raw)
    }

    #[instrument(skip(self))]
    async fn reopen_order(&self, id: OrderId) -> Result<Order, CommerceError> {
        let raw: WcOrder = self
            .send(
                self.inner
                    .client
                    .put(self.url(&format!("/orders/{id}")))
                    .json(&reopen_order_body()),
                &format!("order {id}"),
            )
            .await?;
        convert_order(raw)
    }

    #[instrument(skip(self))]
    async fn attach_payment(
        &self,
        id: OrderId,
        payment_id: &PaymentId,
    ) -> Result<(), CommerceError> {
        let body = serde_json::json!({ "transaction_id": payment_id.as_str() });
        let _: WcOrder = self
            .send(
                self.inner
                    .client
                    .put(self.url(&format!("/orders/{id}")))
                    .json(&body),
                &format!("order {id}"),
            )
            .await?;
        Ok(())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct WcMeta {
    key: String,
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WcProduct {
    id: u64,
    name: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    meta_data: Vec<WcMeta>,
}

#[derive(Debug, Deserialize)]
struct WcLineItem {
    product_id: u64,
    #[serde(default)]
    name: String,
    quantity: u32,
    #[serde(default)]
    total: String,
}

#[derive(Debug, Deserialize)]
struct WcOrder {
    id: u64,
    order_key: String,
    status: OrderStatus,
    #[serde(default)]
    total: String,
    #[serde(default)]
    shipping_total: String,
    #[serde(default)]
    currency: String,
    #[serde(default)]
    payment_method: String,
    #[serde(default)]
    transaction_id: String,
    #[serde(default)]
    billing: Address,
    #[serde(default)]
    line_items: Vec<WcLineItem>,
    #[serde(default)]
    meta_data: Vec<WcMeta>,
}

#[derive(Debug, Deserialize)]
struct WcErrorBody {
    message: String,
}

// =============================================================================
// Conversions
// =============================================================================

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<WcErrorBody>(body).map_or_else(
        |_| body.chars().take(200).collect(),
        |error| error.message,
    )
}

/// Parse a backend money string. WooCommerce sends `""` for unset amounts.
fn parse_amount(value: &str, field: &str) -> Result<Decimal, CommerceError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(value)
        .map_err(|e| CommerceError::Parse(format!("invalid {field} '{value}': {e}")))
}

fn meta_value<'a>(meta: &'a [WcMeta], key: &str) -> Option<&'a serde_json::Value> {
    meta.iter().find(|m| m.key == key).map(|m| &m.value)
}

/// Volume from product metadata. Shop managers type it, so accept strings
/// with a decimal comma as well as numbers.
fn volume_from_meta(meta: &[WcMeta]) -> f64 {
    let volume = match meta_value(meta, VOLUME_META_KEY) {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    volume
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(DEFAULT_PRODUCT_VOLUME)
}

fn convert_product(raw: WcProduct) -> Result<Product, CommerceError> {
    Ok(Product {
        id: ProductId::new(raw.id),
        price: parse_amount(&raw.price, "product price")?,
        volume_m3: volume_from_meta(&raw.meta_data),
        name: raw.name,
    })
}

fn convert_order(raw: WcOrder) -> Result<Order, CommerceError> {
    let currency = CurrencyCode::from_str(&raw.currency)
        .map_err(|_| CommerceError::Parse(format!("unsupported currency '{}'", raw.currency)))?;

    let line_items = raw
        .line_items
        .iter()
        .map(|line| {
            Ok(OrderLine {
                product_id: ProductId::new(line.product_id),
                name: line.name.clone(),
                quantity: line.quantity,
                total: parse_amount(&line.total, "line total")?,
            })
        })
        .collect::<Result<Vec<_>, CommerceError>>()?;

    let checkout_ref = meta_value(&raw.meta_data, CHECKOUT_REF_META_KEY)
        .and_then(serde_json::Value::as_str)
        .and_then(|s| CheckoutRef::from_str(s).ok());

    let payment_id = Some(raw.transaction_id.trim())
        .filter(|id| !id.is_empty())
        .map(PaymentId::new);

    Ok(Order {
        id: OrderId::new(raw.id),
        key: OrderKey::new(raw.order_key),
        status: raw.status,
        total: parse_amount(&raw.total, "order total")?,
        shipping_total: parse_amount(&raw.shipping_total, "shipping total")?,
        currency,
        payment_method: PaymentMethod::from_backend_id(&raw.payment_method),
        payment_id,
        checkout_ref,
        billing: raw.billing,
        line_items,
    })
}

fn reopen_order_body() -> serde_json::Value {
    serde_json::json!({
        "status": OrderStatus::Pending.as_str(),
        "transaction_id": "",
    })
}

fn new_order_body(order: &NewOrder) -> serde_json::Value {
    let billing = &order.billing;
    serde_json::json!({
        "status": OrderStatus::Pending.as_str(),
        "set_paid": false,
        "payment_method": order.payment_method.backend_id(),
        "payment_method_title": order.payment_method.title(),
        "billing": billing,
        "shipping": {
            "first_name": billing.first_name,
            "last_name": billing.last_name,
            "company": billing.company,
            "address_1": billing.address_1,
            "postcode": billing.postcode,
            "city": billing.city,
            "country": billing.country,
            "phone": billing.phone,
        },
        "line_items": order.line_items,
        "shipping_lines": [{
            "method_id": "flat_rate",
            "method_title": order.shipping.method_title,
            "total": order.shipping.total.to_string(),
        }],
        "customer_note": order.customer_note.clone().unwrap_or_default(),
        "meta_data": [{
            "key": CHECKOUT_REF_META_KEY,
            "value": order.checkout_ref.to_string(),
        }],
    })
}
