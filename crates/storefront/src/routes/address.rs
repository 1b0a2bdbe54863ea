//! Address autocomplete.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use haardhout_core::PostalCode;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::AddressSuggestion;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub postcode: String,
    pub number: String,
}

/// Lookup response. `found: false` also covers lookup service outages.
#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub success: bool,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressSuggestion>,
}

/// Resolve street and city from postal code and house number.
#[instrument(skip(state, params))]
pub async fn lookup(
    State(state): State<AppState>,
    params: std::result::Result<Query<LookupParams>, QueryRejection>,
) -> Result<Json<LookupResponse>> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let postal_code =
        PostalCode::parse(&params.postcode).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let number = params.number.trim();
    if number.is_empty() || !number.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(AppError::BadRequest("invalid house number".to_string()));
    }

    let address = state.address_lookup().lookup(&postal_code, number).await;

    Ok(Json(LookupResponse {
        success: true,
        found: address.is_some(),
        address,
    }))
}
