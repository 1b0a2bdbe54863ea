//! Order status, details and payment retry.
//!
//! Every endpoint requires the order key issued at checkout. A wrong key
//! gets the same 404 as an unknown order.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use haardhout_core::{OrderStatus, PollHint};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::parse_order_id;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::{OrderDetails, OrderStatusSummary};
use crate::state::AppState;

/// Order key query parameter.
#[derive(Debug, Deserialize)]
pub struct KeyParams {
    pub key: String,
}

/// Status polling parameters.
#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub key: String,
    /// Zero-based poll attempt, used to pick the next backoff delay.
    #[serde(default)]
    pub attempt: u32,
}

/// Status response. `poll` is only present while the order is pending.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: OrderStatusSummary,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollHint>,
}

#[derive(Debug, Serialize)]
pub struct DetailsResponse {
    pub success: bool,
    pub order: OrderDetails,
}

/// Body of a retry request.
#[derive(Debug, Deserialize)]
pub struct RetryBody {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct RetryResponse {
    pub success: bool,
    pub redirect_url: String,
}

fn query_error(e: &QueryRejection) -> AppError {
    AppError::BadRequest(e.body_text())
}

/// Poll the status of an order after returning from the payment page.
#[instrument(skip(state, params))]
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: std::result::Result<Query<StatusParams>, QueryRejection>,
) -> Result<Json<StatusResponse>> {
    let order_id = parse_order_id(&id)?;
    let Query(params) = params.map_err(|e| query_error(&e))?;

    let summary = state
        .checkout()
        .get_order_status(order_id, &params.key)
        .await?;
    let poll = (summary.status == OrderStatus::Pending)
        .then(|| state.poll_schedule().hint(params.attempt));

    Ok(Json(StatusResponse {
        success: true,
        summary,
        poll,
    }))
}

/// Order contents for the confirmation page.
#[instrument(skip(state, params))]
pub async fn details(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: std::result::Result<Query<KeyParams>, QueryRejection>,
) -> Result<Json<DetailsResponse>> {
    let order_id = parse_order_id(&id)?;
    let Query(params) = params.map_err(|e| query_error(&e))?;

    let order = state
        .checkout()
        .get_order_details(order_id, &params.key)
        .await?;

    Ok(Json(DetailsResponse {
        success: true,
        order,
    }))
}

/// Start a new payment for an order whose payment failed.
#[instrument(skip(state, body))]
pub async fn retry_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<RetryBody>, JsonRejection>,
) -> Result<Json<RetryResponse>> {
    let order_id = parse_order_id(&id)?;
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    add_breadcrumb("checkout", "Payment retry", &[("order_id", &id)]);
    let redirect_url = state.checkout().retry_payment(order_id, &body.key).await?;

    Ok(Json(RetryResponse {
        success: true,
        redirect_url,
    }))
}
