//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response has the same JSON shape:
//!
//! ```json
//! { "success": false, "error": "message", "fields": { "customer.email": "..." } }
//! ```
//!
//! `fields` is only present for validation errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::payments::PaymentError;
use crate::services::{CheckoutError, FieldErrors};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Checkout or order operation failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a FieldErrors>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Checkout(err) => match err {
                CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
                CheckoutError::UnsupportedDestination => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::OrderNotFound => StatusCode::NOT_FOUND,
                CheckoutError::AlreadyPaid | CheckoutError::NotFailed(_) => StatusCode::CONFLICT,
                CheckoutError::MissingCheckoutUrl
                | CheckoutError::Commerce(_)
                | CheckoutError::Payment(_) => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the customer.
    fn public_message(&self) -> String {
        match self {
            Self::Checkout(err) => match err {
                CheckoutError::Validation(_) => "Please correct the highlighted fields".to_string(),
                CheckoutError::UnsupportedDestination => {
                    "No delivery rate for this postal code, please contact us for a quote"
                        .to_string()
                }
                CheckoutError::OrderNotFound => "Order not found".to_string(),
                CheckoutError::AlreadyPaid => "This order has already been paid".to_string(),
                CheckoutError::NotFailed(_) => {
                    "This order has no failed payment to retry".to_string()
                }
                // Provider validation messages (e.g. amount below minimum) help the customer
                CheckoutError::Payment(PaymentError::Api { status, message })
                    if (400..500).contains(status) && !message.trim_start().starts_with('<') =>
                {
                    message.clone()
                }
                CheckoutError::MissingCheckoutUrl | CheckoutError::Payment(_) => {
                    "Payment could not be started, please try again".to_string()
                }
                CheckoutError::Commerce(_) => "External service error".to_string(),
            },
            Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let fields = match &self {
            Self::Checkout(CheckoutError::Validation(fields)) => Some(fields),
            _ => None,
        };
        let body = ErrorBody {
            success: false,
            error: self.public_message(),
            fields,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for checkout steps.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use haardhout_core::OrderStatus;

    use super::*;
    use crate::commerce::CommerceError;

    fn get_status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    async fn body_json(err: AppError) -> serde_json::Value {
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 12".to_string());
        assert_eq!(err.to_string(), "Not found: order 12");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(CheckoutError::Validation(FieldErrors::new())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CheckoutError::UnsupportedDestination),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(get_status(CheckoutError::OrderNotFound), StatusCode::NOT_FOUND);
        assert_eq!(get_status(CheckoutError::AlreadyPaid), StatusCode::CONFLICT);
        assert_eq!(
            get_status(CheckoutError::NotFailed(OrderStatus::Pending)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CheckoutError::Commerce(CommerceError::Parse("x".to_string()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(CheckoutError::MissingCheckoutUrl),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let mut fields = FieldErrors::new();
        fields.insert("customer.email".to_string(), "invalid".to_string());
        let body = body_json(CheckoutError::Validation(fields).into()).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["fields"]["customer.email"], "invalid");
    }

    #[tokio::test]
    async fn test_upstream_details_are_hidden() {
        let err = CheckoutError::Commerce(CommerceError::Api {
            status: 500,
            message: "SQLSTATE[HY000] database gone".to_string(),
        });
        let body = body_json(err.into()).await;
        assert_eq!(body["error"], "External service error");
        assert!(body.get("fields").is_none());
    }

    #[tokio::test]
    async fn test_payment_validation_message_is_relayed() {
        let err = CheckoutError::Payment(PaymentError::Api {
            status: 422,
            message: "The amount is lower than the minimum".to_string(),
        });
        let body = body_json(err.into()).await;
        assert_eq!(body["error"], "The amount is lower than the minimum");
    }
}
