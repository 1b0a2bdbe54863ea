//! Dutch address autocomplete via the PDOK locatieserver.
//!
//! The checkout form fills street and city from postal code and house
//! number. The lookup is a convenience: any failure or timeout is reported
//! as "not found" and the customer types the address by hand.

use std::time::Duration;

use haardhout_core::PostalCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::AddressLookupConfig;

/// Errors that can occur when looking up an address.
#[derive(Debug, Error)]
pub enum AddressLookupError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid lookup URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// API returned an error response.
    #[error("API error: {0}")]
    Api(u16),
}

/// A resolved address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressSuggestion {
    pub street: String,
    pub house_number: String,
    pub postal_code: String,
    pub city: String,
}

/// PDOK locatieserver client.
#[derive(Clone)]
pub struct AddressLookup {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl AddressLookup {
    /// Create a new address lookup client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &AddressLookupConfig) -> Result<Self, AddressLookupError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            timeout: config.timeout,
        })
    }

    /// Look up the address for a postal code and house number.
    ///
    /// Returns `None` when the address is unknown, the service fails, or
    /// the configured timeout elapses.
    #[instrument(skip(self), fields(postal_code = %postal_code))]
    pub async fn lookup(
        &self,
        postal_code: &PostalCode,
        house_number: &str,
    ) -> Option<AddressSuggestion> {
        match tokio::time::timeout(self.timeout, self.fetch(postal_code, house_number)).await {
            Ok(Ok(found)) => found,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Address lookup failed");
                None
            }
            Err(_) => {
                tracing::warn!("Address lookup timed out");
                None
            }
        }
    }

    async fn fetch(
        &self,
        postal_code: &PostalCode,
        house_number: &str,
    ) -> Result<Option<AddressSuggestion>, AddressLookupError> {
        let url = url::Url::parse_with_params(
            &self.url,
            &[
                ("q", lookup_query(postal_code, house_number)),
                ("fq", "type:adres".to_string()),
                ("rows", "1".to_string()),
            ],
        )?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AddressLookupError::Api(status.as_u16()));
        }

        let body: PdokResponse = response.json().await?;
        Ok(body
            .response
            .docs
            .into_iter()
            .next()
            .map(|doc| AddressSuggestion {
                street: doc.straatnaam,
                house_number: doc.huis_nlt.unwrap_or_else(|| house_number.to_string()),
                postal_code: postal_code.to_string(),
                city: doc.woonplaatsnaam,
            }))
    }
}

fn lookup_query(postal_code: &PostalCode, house_number: &str) -> String {
    let digits: String = house_number
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    format!(
        "postcode:{} and huisnummer:{}",
        postal_code.as_compact(),
        if digits.is_empty() { "0" } else { &digits }
    )
}

#[derive(Debug, Deserialize)]
struct PdokResponse {
    response: PdokDocs,
}

#[derive(Debug, Deserialize)]
struct PdokDocs {
    #[serde(default)]
    docs: Vec<PdokDoc>,
}

#[derive(Debug, Deserialize)]
struct PdokDoc {
    straatnaam: String,
    woonplaatsnaam: String,
    huis_nlt: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_query() {
        let postal_code = PostalCode::parse("1015 cs").unwrap();
        assert_eq!(
            lookup_query(&postal_code, "12"),
            "postcode:1015CS and huisnummer:12"
        );
        assert_eq!(
            lookup_query(&postal_code, " 12a "),
            "postcode:1015CS and huisnummer:12"
        );
    }

    #[test]
    fn test_parse_pdok_response() {
        let body: PdokResponse = serde_json::from_value(serde_json::json!({
            "response": {
                "numFound": 1,
                "docs": [{
                    "type": "adres",
                    "straatnaam": "Keizersgracht",
                    "woonplaatsnaam": "Amsterdam",
                    "huis_nlt": "12",
                    "postcode": "1015CS"
                }]
            }
        }))
        .unwrap();
        assert_eq!(body.response.docs[0].straatnaam, "Keizersgracht");
    }

    #[tokio::test]
    async fn test_unreachable_service_degrades_to_not_found() {
        let lookup = AddressLookup::new(&AddressLookupConfig {
            url: "http://127.0.0.1:9/search".to_string(),
            timeout: Duration::from_millis(500),
        })
        .unwrap();
        let postal_code = PostalCode::parse("1015CS").unwrap();
        assert_eq!(lookup.lookup(&postal_code, "12").await, None);
    }
}
