// Handler tests for the Promotional Service API
// Run against the full router on in-memory stores seeded with the default catalog

use super::*;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

// ============================================================================
// Test Helpers
// ============================================================================

/// Seeded app: 1 CART_VALUE, 2 WELCOME10, 3 PRODUCTMIN, 4 QTY3, 5 MINCART50
async fn create_test_app() -> TestServer {
    let state = AppState::in_memory();
    state
        .promotions
        .seed_defaults()
        .await
        .expect("Failed to seed default promotions");

    TestServer::new(create_router(state)).unwrap()
}

fn apply_payload(user_id: i32, cart_total: f64, product_count: i32, code: Option<&str>) -> Value {
    let mut payload = json!({
        "user_id": user_id,
        "cart_total": cart_total,
        "product_count": product_count,
    });
    if let Some(code) = code {
        payload["code"] = json!(code);
    }
    payload
}

fn applied_ids(body: &Value) -> Vec<i64> {
    body["applied_promos"]
        .as_array()
        .expect("applied_promos array")
        .iter()
        .map(|p| p["id"].as_i64().expect("promotion id"))
        .collect()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let server = create_test_app().await;

    let response = server.get("/").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "Promotional Service running!");
}

// ============================================================================
// Admin endpoints
// ============================================================================

#[tokio::test]
async fn test_create_promotion_success() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions")
        .json(&json!({
            "type": "COUPON",
            "code": "SUMMER25",
            "description": "Summer sale",
            "discount_type": "PERCENTAGE",
            "discount_value": 25,
            "max_usage_per_user": 2
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["id"], 6);
    assert_eq!(body["code"], "SUMMER25");
    assert_eq!(body["user_restriction"], "ALL");
    assert_eq!(body["min_cart_value"].as_f64(), Some(0.0));
    assert_eq!(body["active"], true);
}

#[tokio::test]
async fn test_create_promotion_invalid_input() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions")
        .json(&json!({
            "type": "COUPON",
            "code": "SUMMER25",
            "discount_type": "PERCENTAGE",
            "discount_value": 25,
            "max_usage_per_user": 0
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    assert!(!body["details"]["max_usage_per_user"].is_null());
}

#[tokio::test]
async fn test_create_promotion_duplicate_code() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions")
        .json(&json!({
            "type": "COUPON",
            "code": "WELCOME10",
            "discount_type": "PERCENTAGE",
            "discount_value": 5
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("WELCOME10"));
}

#[tokio::test]
async fn test_list_and_deactivate_promotion() {
    let server = create_test_app().await;

    let response = server
        .patch("/promotions/2")
        .json(&json!({ "active": false }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["active"], false);

    // Admin listing still shows the inactive promotion
    let all: Value = server.get("/promotions").await.json();
    assert_eq!(all.as_array().unwrap().len(), 5);
    assert_eq!(all[1]["active"], false);

    let response = server
        .post("/promotions/validate")
        .json(&json!({ "user_id": 1, "code": "WELCOME10", "cart_total": 1000, "product_count": 1 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deactivate_unknown_promotion() {
    let server = create_test_app().await;

    let response = server
        .patch("/promotions/99")
        .json(&json!({ "active": false }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Available promotions (GET /promotions/available)
// ============================================================================

#[tokio::test]
async fn test_available_promotions() {
    let server = create_test_app().await;

    let response = server
        .get("/promotions/available")
        .add_query_param("user_id", 1)
        .add_query_param("cart_total", 100000)
        .add_query_param("product_count", 3)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_available_promotions_rejects_negative_cart_total() {
    let server = create_test_app().await;

    let response = server
        .get("/promotions/available")
        .add_query_param("user_id", 1)
        .add_query_param("cart_total", -5)
        .add_query_param("product_count", 1)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Coupon validation (POST /promotions/validate)
// ============================================================================

#[tokio::test]
async fn test_validate_coupon_success() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions/validate")
        .json(&json!({ "user_id": 7, "code": "WELCOME10", "cart_total": 500, "product_count": 1 }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["valid"], true);
    assert_eq!(body["promotion"]["code"], "WELCOME10");
    assert_eq!(body["promotion"]["type"], "COUPON");
}

#[tokio::test]
async fn test_validate_coupon_unknown_code() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions/validate")
        .json(&json!({ "user_id": 7, "code": "NOPE", "cart_total": 500, "product_count": 1 }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid or expired coupon");
}

#[tokio::test]
async fn test_validate_coupon_reports_reason() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions/validate")
        .json(&json!({ "user_id": 7, "code": "PRODUCTMIN", "cart_total": 500, "product_count": 1 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "Minimum product count not met");
}

// ============================================================================
// Apply (POST /promotions/apply)
// ============================================================================

#[tokio::test]
async fn test_apply_welcome_coupon_once() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions/apply")
        .json(&apply_payload(999, 100000.0, 1, Some("WELCOME10")))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total"].as_f64(), Some(100000.0));
    assert_eq!(body["total_discount"].as_f64(), Some(10000.0));
    assert_eq!(body["final_amount"].as_f64(), Some(90000.0));
    assert_eq!(applied_ids(&body), vec![2]);

    let response = server
        .post("/promotions/apply")
        .json(&apply_payload(999, 100000.0, 1, Some("WELCOME10")))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().to_lowercase().contains("usage limit"));
}

#[tokio::test]
async fn test_apply_coupon_below_minimum_cart_value() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions/apply")
        .json(&apply_payload(4000, 0.0, 1, Some("MINCART50")))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().to_lowercase().contains("minimum cart value"));
}

#[tokio::test]
async fn test_apply_unknown_coupon() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions/apply")
        .json(&apply_payload(1, 120000.0, 1, Some("INVALID")))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid coupon code");
    assert_eq!(body["error_code"], "INVALID_COUPON");
}

#[tokio::test]
async fn test_apply_automatic_promotions() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions/apply")
        .json(&apply_payload(1, 120000.0, 3, None))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(applied_ids(&body), vec![1, 4]);
    assert_eq!(body["total_discount"].as_f64(), Some(36000.0));
    assert_eq!(body["final_amount"].as_f64(), Some(84000.0));

    // Automatic application records no usage, so the user is still new
    let response = server
        .post("/promotions/apply")
        .json(&apply_payload(1, 1000.0, 1, Some("WELCOME10")))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_apply_without_qualifying_promotions() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions/apply")
        .json(&apply_payload(1, 1234.56, 1, None))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total_discount"].as_f64(), Some(0.0));
    assert_eq!(body["final_amount"].as_f64(), Some(1234.56));
    assert!(applied_ids(&body).is_empty());
}

#[tokio::test]
async fn test_apply_rejects_malformed_body() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions/apply")
        .json(&json!({ "user_id": 1, "product_count": 1 }))
        .await;

    assert!(response.status_code().is_client_error());
}

// ============================================================================
// Metrics
// ============================================================================

#[tokio::test]
async fn test_metrics_count_operations() {
    let server = create_test_app().await;

    server
        .post("/promotions/apply")
        .json(&apply_payload(999, 100000.0, 1, Some("WELCOME10")))
        .await
        .assert_status_ok();
    server
        .post("/promotions/apply")
        .json(&apply_payload(999, 100000.0, 1, Some("WELCOME10")))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let body: Value = server.get("/promotions/metrics").await.json();
    assert_eq!(body["apply"]["calls"], 2);
    assert_eq!(body["redemptions"], 1);
    assert_eq!(body["rejections"], 1);
    assert_eq!(body["availability"]["calls"], 0);
}

// ============================================================================
// Amount bounds and exact code matching
// ============================================================================

#[tokio::test]
async fn test_apply_rejects_cart_total_beyond_range() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions/apply")
        .json(&json!({
            "user_id": 1,
            "cart_total": "79228162514264337593543950335",
            "product_count": 1
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    assert!(!body["details"]["cart_total"].is_null());
}

#[tokio::test]
async fn test_apply_padded_coupon_code() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions/apply")
        .json(&apply_payload(999, 100000.0, 1, Some(" WELCOME10 ")))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid coupon code");
}

#[tokio::test]
async fn test_create_promotion_amount_precision() {
    let server = create_test_app().await;

    let response = server
        .post("/promotions")
        .json(&json!({
            "type": "COUPON",
            "code": "BIGFLAT",
            "discount_type": "FLAT",
            "discount_value": 250000
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let response = server
        .post("/promotions")
        .json(&json!({
            "type": "COUPON",
            "code": "FINE",
            "discount_type": "PERCENTAGE",
            "discount_value": "12.505"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(!body["details"]["discount_value"].is_null());
}
