//! Shipping quote route handler.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query parameters for a quote.
#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub postcode: String,
    pub volume: f64,
}

/// Quote response. Unsupported destinations are a normal answer, not an error.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub success: bool,
    pub supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_fixed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Quote the delivery price for a postal code and cart volume.
#[instrument(skip(state, params))]
pub async fn quote(
    State(state): State<AppState>,
    params: std::result::Result<Query<QuoteParams>, QueryRejection>,
) -> Result<Json<QuoteResponse>> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let response = match state.rate_card().quote(&params.postcode, params.volume) {
        Some(quote) => QuoteResponse {
            success: true,
            supported: true,
            price: Some(quote.price),
            is_fixed: Some(quote.is_fixed),
            message: None,
        },
        None => QuoteResponse {
            success: true,
            supported: false,
            price: None,
            is_fixed: None,
            message: Some("Delivery is not available for this postal code, contact us for a quote"),
        },
    };

    Ok(Json(response))
}
