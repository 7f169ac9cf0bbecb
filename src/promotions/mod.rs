// Promotion Engine Module
//
// Evaluates stored discount rules against a caller-supplied cart. It covers:
// - Rule management: create, list and (de)activate promotions
// - Availability: which promotions a user could redeem right now
// - Coupon validation: side-effect free eligibility check for one code
// - Application: redeem a coupon or stack every eligible automatic promotion

pub mod discount;
pub mod eligibility;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod seed;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use discount::DiscountCalculator;
pub use eligibility::{EligibilityContext, Rejection};
pub use error::{PromoError, PromoResult};
pub use metrics::{MetricsSummary, OperationSummary, PromoMetrics};
pub use models::{
    ApplyPromotionsRequest,
    ApplyPromotionsResponse,
    CartContext,
    NewPromotion,
    Promotion,
    SetActiveRequest,
    UsageRecord,
    ValidateCouponRequest,
    ValidateCouponResponse,
};
pub use service::PromotionService;
pub use store::{
    InMemoryPromotionStore,
    InMemoryUsageLedger,
    PgPromotionStore,
    PgUsageLedger,
    PromotionStore,
    StoreError,
    UsageLedger,
};
pub use types::{DiscountType, PromotionType, UserRestriction};
