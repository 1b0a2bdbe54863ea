//! Server-side conversion tracking.
//!
//! Purchases are reported to the Meta Conversions API in addition to the
//! browser pixel. Both use the checkout correlation id as `event_id`, which
//! lets Meta deduplicate the two.
//!
//! Tracking never affects a checkout: [`ConversionTracker::notify`] returns
//! immediately and failures are only logged.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use haardhout_core::{Email, OrderId, Price};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::Instrument;

use crate::config::TrackingConfig;

/// Graph API endpoint for the Conversions API.
const GRAPH_API_URL: &str = "https://graph.facebook.com/v21.0";

/// Upper bound for a single tracking call.
pub const TRACKING_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur when reporting a conversion.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// A completed purchase.
#[derive(Debug, Clone)]
pub struct PurchaseEvent {
    /// Deduplication id shared with the browser pixel.
    pub event_id: String,
    pub order_id: OrderId,
    pub email: Option<Email>,
    pub value: Price,
}

/// Destination for conversion events.
#[async_trait]
pub trait ConversionSink: Send + Sync {
    /// Report a purchase.
    async fn purchase(&self, event: &PurchaseEvent) -> Result<(), TrackingError>;
}

/// Fire-and-forget conversion reporting.
#[derive(Clone, Default)]
pub struct ConversionTracker {
    sink: Option<Arc<dyn ConversionSink>>,
}

impl ConversionTracker {
    /// Tracker that reports to the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn ConversionSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Tracker that drops every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Tracker for the configured Meta pixel, or a disabled tracker.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn from_config(config: Option<&TrackingConfig>) -> Result<Self, TrackingError> {
        match config {
            Some(config) => Ok(Self::new(Arc::new(MetaConversionsClient::new(config)?))),
            None => {
                tracing::info!("Conversion tracking disabled");
                Ok(Self::disabled())
            }
        }
    }

    /// Whether events are reported anywhere.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Report a purchase in the background.
    ///
    /// Returns immediately. The spawned task is bounded by
    /// [`TRACKING_TIMEOUT`] and logs its own failures.
    pub fn notify(&self, event: PurchaseEvent) {
        let Some(sink) = self.sink.clone() else {
            return;
        };

        let span = tracing::info_span!("track_purchase", order_id = %event.order_id);
        tokio::spawn(
            async move {
                match tokio::time::timeout(TRACKING_TIMEOUT, sink.purchase(&event)).await {
                    Ok(Ok(())) => tracing::debug!("Purchase tracked"),
                    Ok(Err(e)) => tracing::warn!(error = %e, "Failed to track purchase"),
                    Err(_) => tracing::warn!("Purchase tracking timed out"),
                }
            }
            .instrument(span),
        );
    }
}

/// Meta Conversions API client.
pub struct MetaConversionsClient {
    client: reqwest::Client,
    pixel_id: String,
    access_token: SecretString,
}

impl MetaConversionsClient {
    /// Create a new Conversions API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &TrackingConfig) -> Result<Self, TrackingError> {
        let client = reqwest::Client::builder()
            .timeout(TRACKING_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            pixel_id: config.pixel_id.clone(),
            access_token: config.access_token.clone(),
        })
    }
}

#[async_trait]
impl ConversionSink for MetaConversionsClient {
    async fn purchase(&self, event: &PurchaseEvent) -> Result<(), TrackingError> {
        let url = format!(
            "{GRAPH_API_URL}/{}/events?access_token={}",
            self.pixel_id,
            urlencoding::encode(self.access_token.expose_secret())
        );
        let response = self
            .client
            .post(url)
            .json(&purchase_payload(event, chrono::Utc::now().timestamp()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TrackingError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

/// SHA-256 of the normalized email, hex encoded, as the Conversions API
/// expects for `em`.
#[must_use]
pub fn hash_email(email: &Email) -> String {
    format!("{:x}", Sha256::digest(email.normalized().as_bytes()))
}

fn purchase_payload(event: &PurchaseEvent, event_time: i64) -> serde_json::Value {
    let user_data = event.email.as_ref().map_or_else(
        || serde_json::json!({}),
        |email| serde_json::json!({ "em": [hash_email(email)] }),
    );

    serde_json::json!({
        "data": [{
            "event_name": "Purchase",
            "event_time": event_time,
            "event_id": event.event_id,
            "action_source": "website",
            "user_data": user_data,
            "custom_data": {
                "currency": event.value.currency_code.code(),
                "value": event.value.to_api_string(),
                "order_id": event.order_id.to_string(),
            },
        }],
    })
}
