use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::promotions::{DiscountType, PromotionType, UserRestriction};
use crate::validation::{validate_amount, validate_coupon_code, validate_stored_amount};

/// A stored discount rule
///
/// A promotion without a `code` is automatic: it is evaluated purely from the
/// cart context. A promotion with a `code` is a coupon and only applies when
/// the code is supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Promotion {
    #[schema(example = 2)]
    pub id: i32,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub promotion_type: PromotionType,
    #[schema(example = "WELCOME10")]
    pub code: Option<String>,
    #[schema(example = "10% off for new users")]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// Percentage points or flat amount depending on `discount_type`
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 10.0)]
    pub discount_value: Decimal,
    /// Zero means unconstrained
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 0.0)]
    pub min_cart_value: Decimal,
    /// Zero means unconstrained
    pub min_product_count: i32,
    pub user_restriction: UserRestriction,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[schema(example = 1, minimum = 1)]
    pub max_usage_per_user: i32,
    pub active: bool,
}

impl Promotion {
    /// Active and inside its validity window (open ends are unbounded)
    pub fn is_currently_valid(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.start_date.map_or(true, |start| start <= now)
            && self.end_date.map_or(true, |end| end >= now)
    }

    /// Builds the stored record for `input` under the given id
    pub fn from_new(id: i32, input: NewPromotion) -> Self {
        Self {
            id,
            promotion_type: input.promotion_type,
            code: input.code,
            description: input.description,
            discount_type: input.discount_type,
            discount_value: input.discount_value,
            min_cart_value: input.min_cart_value,
            min_product_count: input.min_product_count,
            user_restriction: input.user_restriction,
            start_date: input.start_date,
            end_date: input.end_date,
            max_usage_per_user: input.max_usage_per_user,
            active: input.active,
        }
    }
}

fn default_max_usage_per_user() -> i32 {
    1
}

fn default_active() -> bool {
    true
}

/// Data needed to create a promotion (POST /promotions)
///
/// Omitted constraints default to unconstrained, `user_restriction` to `ALL`
/// and `max_usage_per_user` to 1. An omitted `active` creates a live
/// promotion rather than a disabled one; send `"active": false` to stage it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "crate::validation::validate_new_promotion"))]
pub struct NewPromotion {
    #[serde(rename = "type")]
    pub promotion_type: PromotionType,
    #[validate(length(min = 1, max = 50), custom = "validate_coupon_code")]
    #[schema(example = "WELCOME10")]
    pub code: Option<String>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    #[validate(custom = "validate_stored_amount")]
    #[schema(value_type = f64, example = 10.0)]
    pub discount_value: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_stored_amount")]
    #[schema(value_type = f64, example = 0.0)]
    pub min_cart_value: Decimal,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub min_product_count: i32,
    #[serde(default)]
    pub user_restriction: UserRestriction,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_max_usage_per_user")]
    #[validate(range(min = 1))]
    pub max_usage_per_user: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Body of PATCH /promotions/{id}
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// One redemption of one promotion by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UsageRecord {
    pub id: i64,
    pub user_id: i32,
    pub promotion_id: i32,
    pub used_at: DateTime<Utc>,
}

/// Caller-supplied cart snapshot (GET /promotions/available query)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CartContext {
    #[param(example = 1)]
    pub user_id: i32,
    #[validate(custom = "validate_amount")]
    #[param(value_type = f64, example = 100000.0)]
    pub cart_total: Decimal,
    #[validate(range(min = 0))]
    #[param(example = 1)]
    pub product_count: i32,
}

/// Body of POST /promotions/validate
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ValidateCouponRequest {
    pub user_id: i32,
    #[validate(length(min = 1, max = 50))]
    #[schema(example = "WELCOME10")]
    pub code: String,
    #[validate(custom = "validate_amount")]
    #[schema(value_type = f64, example = 100000.0)]
    pub cart_total: Decimal,
    #[validate(range(min = 0))]
    pub product_count: i32,
}

impl ValidateCouponRequest {
    pub fn cart(&self) -> CartContext {
        CartContext {
            user_id: self.user_id,
            cart_total: self.cart_total,
            product_count: self.product_count,
        }
    }
}

/// Successful coupon validation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateCouponResponse {
    pub valid: bool,
    pub promotion: Promotion,
}

/// Body of POST /promotions/apply
///
/// The presence of `code` selects coupon mode; without it automatic
/// promotions are evaluated.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ApplyPromotionsRequest {
    pub user_id: i32,
    #[validate(custom = "validate_amount")]
    #[schema(value_type = f64, example = 100000.0)]
    pub cart_total: Decimal,
    #[validate(range(min = 0))]
    pub product_count: i32,
    #[serde(default)]
    #[schema(example = "WELCOME10")]
    pub code: Option<String>,
}

impl ApplyPromotionsRequest {
    /// The supplied coupon code, matched exactly; blank codes count as absent
    pub fn coupon_code(&self) -> Option<&str> {
        self.code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
    }

    pub fn cart(&self) -> CartContext {
        CartContext {
            user_id: self.user_id,
            cart_total: self.cart_total,
            product_count: self.product_count,
        }
    }
}

/// Result of applying promotions to a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplyPromotionsResponse {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 100000.0)]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 10000.0)]
    pub total_discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 90000.0)]
    pub final_amount: Decimal,
    pub applied_promos: Vec<Promotion>,
}

impl ApplyPromotionsResponse {
    /// The cart total unchanged, nothing applied
    pub fn full_price(total: Decimal) -> Self {
        Self {
            total,
            total_discount: Decimal::ZERO,
            final_amount: total,
            applied_promos: Vec::new(),
        }
    }
}
