//! Order and payment status enums and the order state machine.
//!
//! The storefront writes exactly three order statuses:
//!
//! ```text
//!            pay-on-delivery / payment paid
//!   pending ───────────────────────────────▶ processing
//!      │ ▲                                       │
//!      │ │ retry                                 │ payment failed/expired/canceled
//!      ▼ │                                       ▼
//!    failed ◀────────────────────────────────────┘
//! ```
//!
//! Everything else the commerce backend may report (fulfillment, refunds) is
//! represented but never produced here.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Order status as stored in the commerce backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    /// Created, awaiting payment (initial state).
    #[default]
    Pending,
    /// Paid, or accepted for payment on delivery.
    Processing,
    /// Payment failed, expired or was canceled; recoverable via retry.
    Failed,
    /// Awaiting manual action in the backend.
    OnHold,
    /// Fulfilled.
    Completed,
    /// Canceled by the shop.
    Cancelled,
    /// Refunded by the shop.
    Refunded,
    /// Any status this storefront does not know about.
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Whether the order state machine allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending | Self::Processing, Self::Failed)
                | (Self::Failed, Self::Pending)
        )
    }

    /// Project a payment status onto this order.
    ///
    /// Returns the status to persist, or `None` when the payment status does
    /// not change the order (still open, already applied, or a transition the
    /// state machine does not allow).
    #[must_use]
    pub fn after_payment(self, payment: PaymentStatus) -> Option<Self> {
        let target = payment.order_status()?;
        (target != self && self.can_transition_to(target)).then_some(target)
    }

    /// Whether the order has been paid or accepted for fulfillment.
    #[must_use]
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Processing | Self::Completed)
    }

    /// Wire name used by the commerce backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Failed => "failed",
            Self::OnHold => "on-hold",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status as reported by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Open,
    Pending,
    Authorized,
    Paid,
    Failed,
    Expired,
    Canceled,
}

impl PaymentStatus {
    /// The order status this payment status drives the order towards.
    #[must_use]
    pub const fn order_status(self) -> Option<OrderStatus> {
        match self {
            Self::Paid => Some(OrderStatus::Processing),
            Self::Failed | Self::Expired | Self::Canceled => Some(OrderStatus::Failed),
            Self::Open | Self::Pending | Self::Authorized => None,
        }
    }

    /// Whether the customer can still complete this payment.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open | Self::Pending | Self::Authorized)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Pending => "pending",
            Self::Authorized => "authorized",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Expired => "expired",
            Self::Canceled => "canceled",
        };
        f.write_str(s)
    }
}
