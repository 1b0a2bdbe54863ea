//! Application state shared across handlers.

use std::sync::Arc;

use haardhout_core::{PollSchedule, RateCard};
use thiserror::Error;

use crate::commerce::{CommerceBackend, CommerceError, WooCommerceClient};
use crate::config::StorefrontConfig;
use crate::payments::{MollieClient, PaymentError, PaymentProvider};
use crate::services::{
    AddressLookup, AddressLookupError, CheckoutService, ConversionTracker, TrackingError,
};

/// Error creating the upstream clients.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("commerce client: {0}")]
    Commerce(#[from] CommerceError),
    #[error("payment client: {0}")]
    Payment(#[from] PaymentError),
    #[error("tracking client: {0}")]
    Tracking(#[from] TrackingError),
    #[error("address lookup client: {0}")]
    AddressLookup(#[from] AddressLookupError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the checkout orchestrator and the upstream clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    checkout: CheckoutService,
    address_lookup: AddressLookup,
    rate_card: RateCard,
    poll_schedule: PollSchedule,
}

impl AppState {
    /// Build the production state: WooCommerce, Mollie, Meta tracking and
    /// PDOK address lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if any HTTP client fails to build.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, StateError> {
        let commerce = WooCommerceClient::new(&config.woocommerce, config.upstream_timeout)?;
        let payments = MollieClient::new(&config.mollie, config.upstream_timeout)?;
        let tracker = ConversionTracker::from_config(config.tracking.as_ref())?;
        let address_lookup = AddressLookup::new(&config.address_lookup)?;

        let checkout = CheckoutService::new(
            Arc::new(commerce),
            Arc::new(payments),
            tracker,
            &config.base_url,
        );

        Ok(Self::new(checkout, address_lookup))
    }

    /// Create state around an existing checkout service.
    #[must_use]
    pub fn new(checkout: CheckoutService, address_lookup: AddressLookup) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                checkout,
                address_lookup,
                rate_card: RateCard::STANDARD,
                poll_schedule: PollSchedule::DEFAULT,
            }),
        }
    }

    /// Build state directly from collaborator implementations.
    #[must_use]
    pub fn with_backends(
        commerce: Arc<dyn CommerceBackend>,
        payments: Arc<dyn PaymentProvider>,
        tracker: ConversionTracker,
        base_url: &str,
        address_lookup: AddressLookup,
    ) -> Self {
        Self::new(
            CheckoutService::new(commerce, payments, tracker, base_url),
            address_lookup,
        )
    }

    /// Get a reference to the checkout orchestrator.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    /// Get a reference to the address lookup client.
    #[must_use]
    pub fn address_lookup(&self) -> &AddressLookup {
        &self.inner.address_lookup
    }

    /// Rate card used for shipping quotes.
    #[must_use]
    pub fn rate_card(&self) -> &RateCard {
        &self.inner.rate_card
    }

    /// Backoff schedule handed to status-polling clients.
    #[must_use]
    pub fn poll_schedule(&self) -> &PollSchedule {
        &self.inner.poll_schedule
    }
}
