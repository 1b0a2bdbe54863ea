//! HTTP API tests through the full router.
//!
//! Requests go through `tower::ServiceExt::oneshot`, so status codes,
//! response shapes and middleware are exercised without a listening socket.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use haardhout_core::{OrderStatus, PaymentStatus};
use haardhout_integration_tests::{OAK, TestContext, checkout_body, get, post_form};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn place_order(ctx: &TestContext, payment_method: &str) -> Value {
    let (status, body) = ctx
        .post_json(
            "/api/checkout",
            &checkout_body(payment_method, "1011 AB", &[(OAK.as_u64(), 2)]),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

fn order_path(body: &Value, suffix: &str) -> String {
    format!(
        "/api/orders/{}{suffix}?key={}",
        body["order_id"],
        body["order_key"].as_str().unwrap()
    )
}

// ============================================================================
// Health and middleware
// ============================================================================

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();
    let (status, _) = ctx.get("/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let ctx = TestContext::new();
    let response = ctx.router().oneshot(get("/health")).await.unwrap();

    let headers = response.headers();
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["cache-control"], "no-store, max-age=0");
}

#[tokio::test]
async fn test_upstream_request_id_is_echoed() {
    let ctx = TestContext::new();
    let mut request = get("/health");
    request
        .headers_mut()
        .insert("x-request-id", "lb-1234".parse().unwrap());

    let response = ctx.router().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "lb-1234");
}

// ============================================================================
// Shipping quote
// ============================================================================

#[tokio::test]
async fn test_quote() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .get("/api/shipping/quote?postcode=1011%20AB&volume=2")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "supported": true, "price": "81.42", "is_fixed": false})
    );
}

#[tokio::test]
async fn test_quote_fixed_rate_zone() {
    let ctx = TestContext::new();
    let (_, body) = ctx
        .get("/api/shipping/quote?postcode=3811ab&volume=10")
        .await;

    assert_eq!(body["price"], "45.00");
    assert_eq!(body["is_fixed"], true);
}

#[tokio::test]
async fn test_quote_unsupported_destination() {
    let ctx = TestContext::new();
    for uri in [
        "/api/shipping/quote?postcode=8881AA&volume=1",
        "/api/shipping/quote?postcode=10&volume=1",
        "/api/shipping/quote?postcode=1011AB&volume=0.5",
    ] {
        let (status, body) = ctx.get(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["supported"], false, "{uri}");
        assert!(body.get("price").is_none());
    }
}

#[tokio::test]
async fn test_quote_requires_numeric_volume() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .get("/api/shipping/quote?postcode=1011AB&volume=lots")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_pay_online() {
    let ctx = TestContext::new();
    let body = place_order(&ctx, "ideal").await;

    assert_eq!(body["success"], true);
    assert_eq!(body["order_id"], 1001);
    assert_eq!(body["order_key"], "wc_order_test1001");
    assert_eq!(body["redirect_url"], "https://pay.example/checkout/tr_test1");
    assert!(body.get("checkout_ref").is_none());
}

#[tokio::test]
async fn test_checkout_pay_on_delivery() {
    let ctx = TestContext::new();
    let body = place_order(&ctx, "cod").await;

    let redirect = body["redirect_url"].as_str().unwrap();
    assert!(redirect.starts_with("/checkout/confirmation?order_id=1001&key="));
}

#[tokio::test]
async fn test_checkout_validation_lists_fields() {
    let ctx = TestContext::new();
    let mut request = checkout_body("cod", "1011AB", &[(OAK.as_u64(), 0)]);
    request["customer"]["email"] = json!("not-an-email");

    let (status, body) = ctx.post_json("/api/checkout", &request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["fields"]["customer.email"].is_string());
    assert!(body["fields"]["items[0].quantity"].is_string());
}

#[tokio::test]
async fn test_checkout_unsupported_destination() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .post_json(
            "/api/checkout",
            &checkout_body("ideal", "8881 AA", &[(OAK.as_u64(), 1)]),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(ctx.commerce.order_count(), 0);
}

#[tokio::test]
async fn test_checkout_malformed_json() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .post_json("/api/checkout", &json!({"items": "none"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// ============================================================================
// Webhook
// ============================================================================

#[tokio::test]
async fn test_webhook_always_acknowledges() {
    let ctx = TestContext::new();
    for form in ["", "id=", "id=tr_unknown", "garbage=%%%"] {
        let (status, _) = ctx.post_webhook(form).await;
        assert_eq!(status, StatusCode::OK, "{form:?}");
    }

    // Wrong content type is acknowledged as well
    let (status, _) = ctx
        .post_json("/api/webhooks/payment", &json!({"id": "tr_test1"}))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_updates_order() {
    let ctx = TestContext::new();
    let body = place_order(&ctx, "ideal").await;
    let payment_id = ctx.payments.last_payment_id().unwrap();
    ctx.payments.set_status(&payment_id, PaymentStatus::Paid);

    let response = ctx
        .router()
        .oneshot(post_form(
            "/api/webhooks/payment",
            &format!("id={payment_id}"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, status) = ctx.get(&order_path(&body, "/status")).await;
    assert_eq!(status["status"], "processing");
    assert_eq!(status["paid"], true);
    assert!(status.get("poll").is_none());
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_status_of_pending_order_includes_poll_hint() {
    let ctx = TestContext::new();
    let body = place_order(&ctx, "ideal").await;

    let (status, first) = ctx.get(&order_path(&body, "/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "pending");
    assert_eq!(first["paid"], false);
    assert_eq!(first["total"], "339.42");
    assert_eq!(first["currency"], "EUR");
    assert_eq!(first["poll"], "retry_after");
    assert_eq!(first["retry_after_ms"], 1000);

    let (_, later) = ctx
        .get(&format!("{}&attempt=2", order_path(&body, "/status")))
        .await;
    assert_eq!(later["retry_after_ms"], 2250);

    let (_, last) = ctx
        .get(&format!("{}&attempt=7", order_path(&body, "/status")))
        .await;
    assert_eq!(last["poll"], "still_processing");
}

#[tokio::test]
async fn test_order_details() {
    let ctx = TestContext::new();
    let body = place_order(&ctx, "cod").await;

    let (status, details) = ctx.get(&order_path(&body, "")).await;

    assert_eq!(status, StatusCode::OK);
    let order = &details["order"];
    assert_eq!(order["status"], "processing");
    assert_eq!(order["payment_method"], "cod");
    assert_eq!(order["shipping_total"], "81.42");
    assert_eq!(order["line_items"][0]["quantity"], 2);
    assert_eq!(order["billing"]["postcode"], "1011 AB");
}

#[tokio::test]
async fn test_wrong_key_and_bad_id_are_not_found() {
    let ctx = TestContext::new();
    let body = place_order(&ctx, "ideal").await;

    for uri in [
        format!("/api/orders/{}/status?key=wc_order_guessed", body["order_id"]),
        format!("/api/orders/{}?key=wc_order_guessed", body["order_id"]),
        "/api/orders/9999/status?key=wc_order_test1001".to_string(),
        "/api/orders/not-a-number/status?key=wc_order_test1001".to_string(),
    ] {
        let (status, response) = ctx.get(&uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(response["success"], false);
    }
}

#[tokio::test]
async fn test_retry_payment_flow() {
    let ctx = TestContext::new();
    let body = place_order(&ctx, "ideal").await;
    let retry_uri = format!("/api/orders/{}/retry-payment", body["order_id"]);
    let key = json!({"key": body["order_key"]});

    // Pending orders cannot be retried
    let (status, _) = ctx.post_json(&retry_uri, &key).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let first = ctx.payments.last_payment_id().unwrap();
    ctx.payments.set_status(&first, PaymentStatus::Failed);
    let (status, _) = ctx.post_webhook(&format!("id={first}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, retried) = ctx.post_json(&retry_uri, &key).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(retried["success"], true);
    assert_eq!(retried["redirect_url"], "https://pay.example/checkout/tr_test2");

    let order = ctx
        .commerce
        .order(haardhout_core::OrderId::new(1001))
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    // Wrong key on retry is a 404, not a 409
    let (status, _) = ctx
        .post_json(&retry_uri, &json!({"key": "wc_order_guessed"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Address lookup
// ============================================================================

#[tokio::test]
async fn test_address_lookup_degrades_to_not_found() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .get("/api/address/lookup?postcode=1011AB&number=12")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "found": false}));
}

#[tokio::test]
async fn test_address_lookup_rejects_bad_postcode() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .get("/api/address/lookup?postcode=ABCD&number=12")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
