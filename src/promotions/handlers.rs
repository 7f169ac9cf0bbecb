// HTTP handlers for the promotion endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::error::{ApiError, ErrorResponse};
use crate::promotions::{
    ApplyPromotionsRequest, ApplyPromotionsResponse, CartContext, MetricsSummary, NewPromotion,
    Promotion, SetActiveRequest, ValidateCouponRequest, ValidateCouponResponse,
};
use crate::AppState;

/// Handler for POST /promotions
/// Creates a promotion (admin)
#[utoipa::path(
    post,
    path = "/promotions",
    request_body = NewPromotion,
    responses(
        (status = 201, description = "Promotion created", body = Promotion),
        (status = 400, description = "Invalid promotion definition", body = ErrorResponse),
        (status = 409, description = "Coupon code already in use", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "promotions"
)]
pub async fn create_promotion(
    State(state): State<AppState>,
    Json(payload): Json<NewPromotion>,
) -> Result<(StatusCode, Json<Promotion>), ApiError> {
    tracing::debug!("Creating promotion of type {}", payload.promotion_type);
    payload.validate()?;

    let promotion = state.promotions.create_promotion(payload).await?;
    Ok((StatusCode::CREATED, Json(promotion)))
}

/// Handler for GET /promotions
/// Lists every promotion, including inactive and expired ones (admin)
#[utoipa::path(
    get,
    path = "/promotions",
    responses(
        (status = 200, description = "All promotions in creation order", body = Vec<Promotion>),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "promotions"
)]
pub async fn list_promotions(State(state): State<AppState>) -> Result<Json<Vec<Promotion>>, ApiError> {
    let promotions = state.promotions.list_promotions().await?;
    tracing::debug!("Retrieved {} promotions", promotions.len());
    Ok(Json(promotions))
}

/// Handler for PATCH /promotions/:id
/// Activates or deactivates a promotion (admin)
#[utoipa::path(
    patch,
    path = "/promotions/{id}",
    params(
        ("id" = i32, Path, description = "Promotion ID")
    ),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Promotion updated", body = Promotion),
        (status = 404, description = "Promotion not found", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "promotions"
)]
pub async fn set_promotion_active(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<Json<Promotion>, ApiError> {
    let promotion = state.promotions.set_promotion_active(id, payload.active).await?;
    Ok(Json(promotion))
}

/// Handler for GET /promotions/available
/// Lists the promotions the user could redeem with this cart
#[utoipa::path(
    get,
    path = "/promotions/available",
    params(CartContext),
    responses(
        (status = 200, description = "Eligible promotions", body = Vec<Promotion>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "promotions"
)]
pub async fn available_promotions(
    State(state): State<AppState>,
    Query(cart): Query<CartContext>,
) -> Result<Json<Vec<Promotion>>, ApiError> {
    cart.validate()?;

    let promotions = state.promotions.available_promotions(&cart).await?;
    Ok(Json(promotions))
}

/// Handler for POST /promotions/validate
/// Checks a coupon against a cart without redeeming it
#[utoipa::path(
    post,
    path = "/promotions/validate",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Coupon applies", body = ValidateCouponResponse),
        (status = 400, description = "Coupon does not apply; message gives the reason", body = ErrorResponse),
        (status = 404, description = "Invalid or expired coupon", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "promotions"
)]
pub async fn validate_coupon(
    State(state): State<AppState>,
    Json(payload): Json<ValidateCouponRequest>,
) -> Result<Json<ValidateCouponResponse>, ApiError> {
    payload.validate()?;

    let promotion = state
        .promotions
        .validate_coupon(&payload.code, &payload.cart())
        .await?;

    Ok(Json(ValidateCouponResponse {
        valid: true,
        promotion,
    }))
}

/// Handler for POST /promotions/apply
/// Applies a coupon, or every eligible automatic promotion when no code is given
#[utoipa::path(
    post,
    path = "/promotions/apply",
    request_body = ApplyPromotionsRequest,
    responses(
        (status = 200, description = "Discounts applied", body = ApplyPromotionsResponse),
        (status = 400, description = "Invalid coupon code or coupon does not apply", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "promotions"
)]
pub async fn apply_promotions(
    State(state): State<AppState>,
    Json(payload): Json<ApplyPromotionsRequest>,
) -> Result<Json<ApplyPromotionsResponse>, ApiError> {
    payload.validate()?;

    let result = state.promotions.apply_promotions(&payload).await?;
    Ok(Json(result))
}

/// Handler for GET /promotions/metrics
/// Call counts, latencies, redemptions and rejections since startup
#[utoipa::path(
    get,
    path = "/promotions/metrics",
    responses(
        (status = 200, description = "Engine metrics", body = MetricsSummary)
    ),
    tag = "promotions"
)]
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSummary> {
    Json(state.promotions.metrics().summary())
}

/// Handler for GET /
pub async fn health() -> &'static str {
    "Promotional Service running!"
}
