// Promotional Service
//
// HTTP service that evaluates stored discount rules against caller-supplied
// carts and records coupon redemptions.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod promotions;
pub mod validation;

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use promotions::{
    handlers, InMemoryPromotionStore, InMemoryUsageLedger, PgPromotionStore, PgUsageLedger,
    PromotionService,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_promotion,
        handlers::list_promotions,
        handlers::set_promotion_active,
        handlers::available_promotions,
        handlers::validate_coupon,
        handlers::apply_promotions,
        handlers::metrics,
    ),
    components(
        schemas(
            promotions::Promotion,
            promotions::NewPromotion,
            promotions::SetActiveRequest,
            promotions::PromotionType,
            promotions::DiscountType,
            promotions::UserRestriction,
            promotions::ValidateCouponRequest,
            promotions::ValidateCouponResponse,
            promotions::ApplyPromotionsRequest,
            promotions::ApplyPromotionsResponse,
            promotions::MetricsSummary,
            promotions::OperationSummary,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "promotions", description = "Promotion rules, coupon validation and discount application")
    ),
    info(
        title = "Promotional Service API",
        version = "1.0.0",
        description = "Evaluates promotions and coupons against shopping carts"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub promotions: PromotionService,
}

impl AppState {
    pub fn new(promotions: PromotionService) -> Self {
        Self { promotions }
    }

    /// State backed by Postgres
    pub fn postgres(pool: db::DbPool) -> Self {
        Self::new(PromotionService::new(
            Arc::new(PgPromotionStore::new(pool.clone())),
            Arc::new(PgUsageLedger::new(pool)),
        ))
    }

    /// State backed by process memory; nothing survives a restart
    pub fn in_memory() -> Self {
        Self::new(PromotionService::new(
            Arc::new(InMemoryPromotionStore::new()),
            Arc::new(InMemoryUsageLedger::new()),
        ))
    }
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
pub fn create_router(state: AppState) -> Router {
    // Allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(handlers::health))
        .route(
            "/promotions",
            post(handlers::create_promotion).get(handlers::list_promotions),
        )
        .route("/promotions/available", get(handlers::available_promotions))
        .route("/promotions/validate", post(handlers::validate_coupon))
        .route("/promotions/apply", post(handlers::apply_promotions))
        .route("/promotions/metrics", get(handlers::metrics))
        .route("/promotions/:id", patch(handlers::set_promotion_active))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests;
