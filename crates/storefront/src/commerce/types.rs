//! Domain types exchanged with the commerce backend.

use haardhout_core::{
    CheckoutRef, CurrencyCode, OrderId, OrderKey, OrderStatus, PaymentId, PaymentMethod, Price,
    ProductId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Volume assumed for products without `volume_m3` metadata.
pub const DEFAULT_PRODUCT_VOLUME: f64 = 1.0;

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price including VAT.
    pub price: Decimal,
    /// Volume of one unit in cubic meters.
    pub volume_m3: f64,
}

/// Billing and delivery address, in the backend's field layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    /// Street and house number.
    #[serde(default)]
    pub address_1: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Product and quantity ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Delivery charge added to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingLine {
    pub method_title: String,
    pub total: Decimal,
}

/// Order to create in the backend.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub billing: Address,
    pub line_items: Vec<LineItem>,
    pub shipping: ShippingLine,
    pub payment_method: PaymentMethod,
    pub customer_note: Option<String>,
    pub checkout_ref: CheckoutRef,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub total: Decimal,
}

/// An order as stored in the backend.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub key: OrderKey,
    pub status: OrderStatus,
    /// Grand total including shipping.
    pub total: Decimal,
    pub shipping_total: Decimal,
    pub currency: CurrencyCode,
    pub payment_method: Option<PaymentMethod>,
    /// Payment currently collecting this order.
    pub payment_id: Option<PaymentId>,
    pub checkout_ref: Option<CheckoutRef>,
    pub billing: Address,
    pub line_items: Vec<OrderLine>,
}

impl Order {
    /// Grand total as a price.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::new(self.total, self.currency)
    }
}
