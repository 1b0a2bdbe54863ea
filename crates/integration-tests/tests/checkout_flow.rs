//! Checkout orchestration against in-memory backends.
//!
//! Covers order creation, server-side shipping prices and how each payment
//! method leaves the order.

#![allow(clippy::unwrap_used)]

use haardhout_core::{OrderStatus, PaymentMethod};
use haardhout_integration_tests::{BIRCH, KINDLING, OAK, TestContext, checkout_body};
use haardhout_storefront::services::{CheckoutError, CheckoutRequest};
use rust_decimal::Decimal;
use serde_json::json;

fn request(payment_method: &str, postal_code: &str, items: &[(u64, u32)]) -> CheckoutRequest {
    serde_json::from_value(checkout_body(payment_method, postal_code, items)).unwrap()
}

fn eur(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

// ============================================================================
// Shipping integrity
// ============================================================================

#[tokio::test]
async fn test_order_total_uses_server_shipping_price() {
    let ctx = TestContext::new();
    let mut req = request("cod", "1011 AB", &[(OAK.as_u64(), 2)]);
    req.shipping_cost = Some(Decimal::ZERO);

    let outcome = ctx.checkout().submit_checkout(req).await.unwrap();

    let order = ctx.commerce.order(outcome.order_id).unwrap();
    assert_eq!(order.shipping_total, eur(8142));
    assert_eq!(order.total, eur(25800) + eur(8142));
}

#[tokio::test]
async fn test_volume_is_summed_over_products() {
    let ctx = TestContext::new();
    // 1 m³ oak + 2 × 0.5 m³ birch = 2 m³
    let req = request("cod", "1011AB", &[(OAK.as_u64(), 1), (BIRCH.as_u64(), 2)]);

    let outcome = ctx.checkout().submit_checkout(req).await.unwrap();

    let order = ctx.commerce.order(outcome.order_id).unwrap();
    assert_eq!(order.shipping_total, eur(8142));
}

#[tokio::test]
async fn test_fixed_rate_zone_ignores_volume() {
    let ctx = TestContext::new();
    let req = request("cod", "3811 AB", &[(OAK.as_u64(), 6), (KINDLING.as_u64(), 1)]);

    let outcome = ctx.checkout().submit_checkout(req).await.unwrap();

    let order = ctx.commerce.order(outcome.order_id).unwrap();
    assert_eq!(order.shipping_total, eur(4500));
}

#[tokio::test]
async fn test_unsupported_destination_creates_no_order() {
    let ctx = TestContext::new();
    let req = request("ideal", "8881 AA", &[(OAK.as_u64(), 1)]);

    let err = ctx.checkout().submit_checkout(req).await.unwrap_err();

    assert!(matches!(err, CheckoutError::UnsupportedDestination));
    assert_eq!(ctx.commerce.order_count(), 0);
    assert!(ctx.payments.created().is_empty());
}

#[tokio::test]
async fn test_unknown_product_is_a_field_error() {
    let ctx = TestContext::new();
    let req = request("cod", "1011AB", &[(OAK.as_u64(), 1), (999, 1)]);

    let err = ctx.checkout().submit_checkout(req).await.unwrap_err();

    let CheckoutError::Validation(fields) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(fields.contains_key("items[1].product_id"));
    assert_eq!(ctx.commerce.order_count(), 0);
}

#[tokio::test]
async fn test_invalid_form_creates_no_order() {
    let ctx = TestContext::new();
    let mut body = checkout_body("cod", "1011AB", &[(OAK.as_u64(), 1)]);
    body["terms_accepted"] = json!(false);
    body["customer"]["phone"] = json!("123");
    let req: CheckoutRequest = serde_json::from_value(body).unwrap();

    let err = ctx.checkout().submit_checkout(req).await.unwrap_err();

    let CheckoutError::Validation(fields) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(fields.contains_key("terms_accepted"));
    assert!(fields.contains_key("customer.phone"));
    assert_eq!(ctx.commerce.order_count(), 0);
}

// ============================================================================
// Pay on delivery
// ============================================================================

#[tokio::test]
async fn test_pay_on_delivery_is_processing_before_response() {
    let ctx = TestContext::new();
    let req = request("cod", "1011AB", &[(OAK.as_u64(), 2)]);

    let outcome = ctx.checkout().submit_checkout(req).await.unwrap();

    let order = ctx.commerce.order(outcome.order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.payment_method, Some(PaymentMethod::PayOnDelivery));
    assert!(ctx.payments.created().is_empty());
    assert!(
        outcome
            .redirect_url
            .starts_with("/checkout/confirmation?order_id=1001&key=wc_order_test1001&ref=")
    );
    assert!(outcome.redirect_url.ends_with(&outcome.checkout_ref.to_string()));
}

#[tokio::test]
async fn test_pay_on_delivery_tracks_purchase() {
    let ctx = TestContext::new();
    let req = request("cod", "1011AB", &[(OAK.as_u64(), 2)]);

    let outcome = ctx.checkout().submit_checkout(req).await.unwrap();

    let events = ctx.sink.wait_for(1).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_id, outcome.checkout_ref.to_string());
    assert_eq!(events[0].order_id, outcome.order_id);
    assert_eq!(events[0].value.amount, eur(33942));
    assert_eq!(
        events[0].email.as_ref().map(ToString::to_string).as_deref(),
        Some("Sanne@example.nl")
    );
}

// ============================================================================
// Pay online
// ============================================================================

#[tokio::test]
async fn test_pay_online_stays_pending() {
    let ctx = TestContext::new();
    let req = request("ideal", "1011AB", &[(OAK.as_u64(), 2)]);

    let outcome = ctx.checkout().submit_checkout(req).await.unwrap();

    let order = ctx.commerce.order(outcome.order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(outcome.redirect_url, "https://pay.example/checkout/tr_test1");
    assert_eq!(order.payment_id, ctx.payments.last_payment_id());
    assert!(ctx.sink.events().is_empty());
}

#[tokio::test]
async fn test_payment_carries_order_total_and_urls() {
    let ctx = TestContext::new();
    let req = request("ideal", "1011AB", &[(OAK.as_u64(), 2)]);

    let outcome = ctx.checkout().submit_checkout(req).await.unwrap();

    let created = ctx.payments.created();
    assert_eq!(created.len(), 1);
    let payment = &created[0];
    assert_eq!(payment.amount.amount, eur(33942));
    assert_eq!(payment.order_id, outcome.order_id);
    assert!(payment.order_key.matches(outcome.order_key.expose()));
    assert_eq!(
        payment.webhook_url.as_deref(),
        Some("https://haardhout.example/api/webhooks/payment")
    );
    assert_eq!(
        payment.redirect_url,
        format!(
            "https://haardhout.example/checkout/confirmation?order_id={}&key=wc_order_test1001&ref={}",
            outcome.order_id, outcome.checkout_ref
        )
    );
}

#[tokio::test]
async fn test_webhook_url_omitted_for_localhost() {
    let ctx = TestContext::with_base_url("http://localhost:3000");
    let req = request("ideal", "1011AB", &[(OAK.as_u64(), 1)]);

    ctx.checkout().submit_checkout(req).await.unwrap();

    let created = ctx.payments.created();
    assert_eq!(created[0].webhook_url, None);
    assert!(
        created[0]
            .redirect_url
            .starts_with("http://localhost:3000/checkout/confirmation?")
    );
}

#[tokio::test]
async fn test_missing_checkout_url_leaves_order_pending() {
    let ctx = TestContext::new();
    ctx.payments.omit_checkout_url();
    let req = request("ideal", "1011AB", &[(OAK.as_u64(), 1)]);

    let err = ctx.checkout().submit_checkout(req).await.unwrap_err();

    assert!(matches!(err, CheckoutError::MissingCheckoutUrl));
    assert_eq!(ctx.commerce.order_count(), 1);
    let order = ctx.commerce.order(haardhout_core::OrderId::new(1001)).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_failed_attach_does_not_fail_checkout() {
    let ctx = TestContext::new();
    ctx.commerce.fail_attach();
    let req = request("ideal", "1011AB", &[(OAK.as_u64(), 1)]);

    let outcome = ctx.checkout().submit_checkout(req).await.unwrap();

    assert_eq!(outcome.redirect_url, "https://pay.example/checkout/tr_test1");
    assert_eq!(ctx.commerce.order(outcome.order_id).unwrap().payment_id, None);
}
