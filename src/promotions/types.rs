// Domain type definitions for the promotion engine
// Shared enums stored as VARCHAR columns and exchanged as SCREAMING_SNAKE_CASE strings

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Classification of a promotion
///
/// The type does not gate applicability by itself, except that automatic
/// application only considers `CartValue` and `ProductQuantity` promotions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionType {
    /// Triggered by the cart value
    CartValue,

    /// Reachable through an explicit code
    Coupon,

    /// Triggered by the number of products in the cart
    ProductQuantity,
}

impl PromotionType {
    /// Promotion types evaluated when no code is supplied
    pub const AUTOMATIC: [PromotionType; 2] =
        [PromotionType::CartValue, PromotionType::ProductQuantity];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionType::CartValue => "CART_VALUE",
            PromotionType::Coupon => "COUPON",
            PromotionType::ProductQuantity => "PRODUCT_QUANTITY",
        }
    }
}

impl fmt::Display for PromotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PromotionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CART_VALUE" => Ok(PromotionType::CartValue),
            "COUPON" => Ok(PromotionType::Coupon),
            "PRODUCT_QUANTITY" => Ok(PromotionType::ProductQuantity),
            _ => Err(format!("Invalid promotion type: {}", s)),
        }
    }
}

/// How `discount_value` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// Percentage points off the cart total (e.g., 10 = 10% off)
    Percentage,

    /// Percentage of the cart total returned to the customer
    Cashback,

    /// Fixed amount; accepted and stored but never produces a discount
    Flat,
}

impl DiscountType {
    /// Whether this discount type contributes to the applied discount total
    pub fn is_percentage_based(&self) -> bool {
        matches!(self, DiscountType::Percentage | DiscountType::Cashback)
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "PERCENTAGE"),
            DiscountType::Cashback => write!(f, "CASHBACK"),
            DiscountType::Flat => write!(f, "FLAT"),
        }
    }
}

/// Which users may redeem a promotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRestriction {
    /// Every user
    #[default]
    All,

    /// Only users without any recorded promotion usage
    NewUser,
}

impl fmt::Display for UserRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRestriction::All => write!(f, "ALL"),
            UserRestriction::NewUser => write!(f, "NEW_USER"),
        }
    }
}
