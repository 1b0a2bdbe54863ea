//! Mollie Payments API (v2) client.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use haardhout_core::{CurrencyCode, OrderId, OrderKey, PaymentId, PaymentStatus, Price};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{NewPayment, Payment, PaymentError, PaymentProvider};
use crate::config::MollieConfig;

/// Client for the Mollie Payments API.
#[derive(Clone)]
pub struct MollieClient {
    inner: Arc<MollieClientInner>,
}

struct MollieClientInner {
    client: reqwest::Client,
    api_url: String,
}

impl MollieClient {
    /// Create a new Mollie API client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &MollieConfig, timeout: Duration) -> Result<Self, PaymentError> {
        let mut auth_value =
            HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
                .map_err(|e| PaymentError::Parse(format!("Invalid API key format: {e}")))?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(MollieClientInner {
                client,
                api_url: config.api_url.clone(),
            }),
        })
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<Payment, PaymentError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PaymentError::NotFound(resource.to_string()));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Mollie API returned non-success status"
            );
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let raw: MolliePayment = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Mollie response"
            );
            PaymentError::Parse(e.to_string())
        })?;

        convert_payment(raw)
    }
}

#[async_trait]
impl PaymentProvider for MollieClient {
    #[instrument(skip(self, payment), fields(order_id = %payment.order_id))]
    async fn create_payment(&self, payment: NewPayment) -> Result<Payment, PaymentError> {
        let body = new_payment_body(&payment);
        let created = self
            .send(
                self.inner
                    .client
                    .post(format!("{}/payments", self.inner.api_url))
                    .json(&body),
                "payment",
            )
            .await?;
        debug!(payment_id = %created.id, "Payment created");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get_payment(&self, id: &PaymentId) -> Result<Payment, PaymentError> {
        // Ids come from an unauthenticated webhook
        let url = format!(
            "{}/payments/{}",
            self.inner.api_url,
            urlencoding::encode(id.as_str())
        );
        self.send(self.inner.client.get(url), id.as_str()).await
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct MollieAmount {
    currency: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct MollieLink {
    href: String,
}

#[derive(Debug, Default, Deserialize)]
struct MollieLinks {
    checkout: Option<MollieLink>,
}

#[derive(Debug, Deserialize)]
struct MolliePayment {
    id: String,
    status: PaymentStatus,
    amount: MollieAmount,
    #[serde(default)]
    metadata: serde_json::Value,
    #[serde(rename = "_links", default)]
    links: MollieLinks,
}

#[derive(Debug, Deserialize)]
struct MollieErrorBody {
    detail: String,
}

// =============================================================================
// Conversions
// =============================================================================

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<MollieErrorBody>(body).map_or_else(
        |_| body.chars().take(200).collect(),
        |error| error.detail,
    )
}

/// Order id from metadata, sent as a number by this storefront and as a
/// string by the WooCommerce plugin.
fn metadata_order_id(metadata: &serde_json::Value) -> Option<OrderId> {
    match metadata.get("order_id")? {
        serde_json::Value::Number(n) => n.as_u64().map(OrderId::new),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn convert_payment(raw: MolliePayment) -> Result<Payment, PaymentError> {
    let currency = CurrencyCode::from_str(&raw.amount.currency)
        .map_err(|_| PaymentError::Parse(format!("unsupported currency '{}'", raw.amount.currency)))?;
    let amount = Price::parse(&raw.amount.value, currency)
        .map_err(|e| PaymentError::Parse(format!("invalid amount '{}': {e}", raw.amount.value)))?;

    Ok(Payment {
        id: PaymentId::new(raw.id),
        status: raw.status,
        amount,
        checkout_url: raw.links.checkout.map(|link| link.href),
        order_id: metadata_order_id(&raw.metadata),
        order_key: raw
            .metadata
            .get("order_key")
            .and_then(serde_json::Value::as_str)
            .map(OrderKey::new),
    })
}

fn new_payment_body(payment: &NewPayment) -> serde_json::Value {
    let mut body = serde_json::json!({
        "amount": {
            "currency": payment.amount.currency_code.code(),
            "value": payment.amount.to_api_string(),
        },
        "description": payment.description,
        "redirectUrl": payment.redirect_url,
        "method": "ideal",
        "metadata": {
            "order_id": payment.order_id.as_u64(),
            "order_key": payment.order_key.expose(),
        },
    });
    if let Some(webhook_url) = &payment.webhook_url {
        body["webhookUrl"] = serde_json::Value::String(webhook_url.clone());
    }
    body
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn payment_json() -> serde_json::Value {
        serde_json::json!({
            "resource": "payment",
            "id": "tr_WDqYK6vllg",
            "mode": "test",
            "status": "open",
            "amount": {"currency": "EUR", "value": "236.42"},
            "description": "Bestelling 4217",
            "method": "ideal",
            "metadata": {"order_id": 4217, "order_key": "wc_order_Xy12Ab"},
            "_links": {
                "self": {"href": "https://api.mollie.com/v2/payments/tr_WDqYK6vllg", "type": "application/hal+json"},
                "checkout": {"href": "https://www.mollie.com/checkout/select-issuer/ideal/7UhSN1zuXS", "type": "text/html"}
            }
        })
    }

    #[test]
    fn test_convert_open_payment() {
        let raw: MolliePayment = serde_json::from_value(payment_json()).unwrap();
        let payment = convert_payment(raw).unwrap();

        assert_eq!(payment.id, PaymentId::new("tr_WDqYK6vllg"));
        assert_eq!(payment.status, PaymentStatus::Open);
        assert_eq!(payment.amount, Price::eur(Decimal::new(23642, 2)));
        assert_eq!(
            payment.checkout_url.as_deref(),
            Some("https://www.mollie.com/checkout/select-issuer/ideal/7UhSN1zuXS")
        );
        assert_eq!(payment.order_id, Some(OrderId::new(4217)));
        assert!(payment.order_key.unwrap().matches("wc_order_Xy12Ab"));
    }

    #[test]
    fn test_convert_paid_payment_without_checkout_link() {
        let mut json = payment_json();
        json["status"] = serde_json::json!("paid");
        json["_links"] = serde_json::json!({"self": {"href": "x", "type": "application/hal+json"}});
        let payment = convert_payment(serde_json::from_value(json).unwrap()).unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(payment.checkout_url, None);
    }

    #[test]
    fn test_metadata_order_id_variants() {
        assert_eq!(
            metadata_order_id(&serde_json::json!({"order_id": "4217"})),
            Some(OrderId::new(4217))
        );
        assert_eq!(metadata_order_id(&serde_json::json!({"order_id": "abc"})), None);
        assert_eq!(metadata_order_id(&serde_json::json!({})), None);
        assert_eq!(metadata_order_id(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_new_payment_body() {
        let payment = NewPayment {
            amount: Price::eur(Decimal::new(8142, 2)),
            description: "Bestelling 4217".to_string(),
            redirect_url: "https://haardhout.nl/checkout/confirmation?order_id=4217".to_string(),
            webhook_url: None,
            order_id: OrderId::new(4217),
            order_key: OrderKey::new("wc_order_Xy12Ab"),
        };
        let body = new_payment_body(&payment);
        assert_eq!(body["amount"]["value"], "81.42");
        assert_eq!(body["amount"]["currency"], "EUR");
        assert_eq!(body["metadata"]["order_id"], 4217);
        assert!(body.get("webhookUrl").is_none());

        let with_webhook = NewPayment {
            webhook_url: Some("https://haardhout.nl/api/webhooks/payment".to_string()),
            ..payment
        };
        let body = new_payment_body(&with_webhook);
        assert_eq!(body["webhookUrl"], "https://haardhout.nl/api/webhooks/payment");
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"status":422,"title":"Unprocessable Entity","detail":"The amount is lower than the minimum","field":"amount"}"#;
        assert_eq!(api_error_message(body), "The amount is lower than the minimum");
    }
}
