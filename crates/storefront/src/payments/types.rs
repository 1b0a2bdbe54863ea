//! Payment types.

use haardhout_core::{OrderId, OrderKey, PaymentId, PaymentStatus, Price};

/// Payment to create for an order.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub amount: Price,
    pub description: String,
    /// Where the provider sends the customer after paying.
    pub redirect_url: String,
    /// Where the provider posts status changes. `None` when the storefront
    /// is not publicly reachable.
    pub webhook_url: Option<String>,
    pub order_id: OrderId,
    pub order_key: OrderKey,
}

/// A payment attempt as reported by the provider.
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: PaymentId,
    pub status: PaymentStatus,
    pub amount: Price,
    /// Hosted payment page, present while the payment is open.
    pub checkout_url: Option<String>,
    /// Order id from the payment metadata; `None` when missing or malformed.
    pub order_id: Option<OrderId>,
    /// Order key from the payment metadata.
    pub order_key: Option<OrderKey>,
}
