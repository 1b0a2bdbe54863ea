//! Payment provider webhook.
//!
//! The provider only sends the payment id; the payment itself is re-read
//! from the provider's API before anything changes. The response is always
//! `200 OK` so the provider never retries into a loop on our failures.

use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
};
use haardhout_core::PaymentId;
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::state::AppState;

/// Form body posted by the payment provider.
#[derive(Debug, Deserialize)]
pub struct WebhookForm {
    #[serde(default)]
    pub id: String,
}

/// Handle a payment status webhook.
#[instrument(skip(state, form))]
pub async fn payment(
    State(state): State<AppState>,
    form: Result<Form<WebhookForm>, FormRejection>,
) -> StatusCode {
    let id = match form {
        Ok(Form(form)) => form.id.trim().to_string(),
        Err(e) => {
            warn!(error = %e, "Unreadable payment webhook body");
            return StatusCode::OK;
        }
    };

    if id.is_empty() {
        warn!("Payment webhook without payment id");
        return StatusCode::OK;
    }

    state
        .checkout()
        .handle_payment_webhook(&PaymentId::new(id))
        .await;
    StatusCode::OK
}
