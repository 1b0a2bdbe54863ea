//! Checkout route handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::{CheckoutOutcome, CheckoutRequest};
use crate::state::AppState;

/// Successful checkout response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: CheckoutOutcome,
}

/// Submit a checkout.
///
/// Responds with the order id, its key and where to send the customer next:
/// the payment page for online payments, the confirmation page for cash on
/// delivery.
#[instrument(skip(state, request))]
pub async fn submit(
    State(state): State<AppState>,
    request: std::result::Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>> {
    let Json(request) = request.map_err(|e| AppError::BadRequest(e.body_text()))?;

    add_breadcrumb(
        "checkout",
        "Checkout submitted",
        &[("payment_method", request.payment_method.backend_id())],
    );

    let outcome = state.checkout().submit_checkout(request).await?;

    let order_id = outcome.order_id.to_string();
    let checkout_ref = outcome.checkout_ref.to_string();
    add_breadcrumb(
        "checkout",
        "Order created",
        &[("order_id", &order_id), ("checkout_ref", &checkout_ref)],
    );

    Ok(Json(CheckoutResponse {
        success: true,
        outcome,
    }))
}
