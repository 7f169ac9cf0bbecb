// Eligibility Evaluator
//
// Pure mapping from (promotion, user/cart context, usage count) to eligible or
// a single rejection reason. Checks run in a fixed order and the first failure wins.

use rust_decimal::Decimal;
use std::fmt;

use crate::promotions::{Promotion, UserRestriction};

/// Why a promotion does not apply
///
/// The `Display` text is surfaced verbatim to end users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NewUsersOnly,
    MinimumCartValue,
    MinimumProductCount,
    UsageLimitReached,
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::NewUsersOnly => "Coupon for new users only",
            Rejection::MinimumCartValue => "Minimum cart value not met",
            Rejection::MinimumProductCount => "Minimum product count not met",
            Rejection::UsageLimitReached => "Usage limit reached",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Everything the evaluator needs besides the promotion itself
#[derive(Debug, Clone, Copy)]
pub struct EligibilityContext {
    pub user_id: i32,
    pub cart_total: Decimal,
    pub product_count: i32,
    /// The user has no recorded usage of any promotion
    pub is_new_user: bool,
    /// Recorded usages of this promotion by this user
    pub usage_count: i64,
}

/// Evaluates `promotion` against `ctx`
///
/// Order: new-user restriction, minimum cart value, minimum product count,
/// per-user usage limit. Zero minimums are unconstrained.
pub fn evaluate(promotion: &Promotion, ctx: &EligibilityContext) -> Result<(), Rejection> {
    if promotion.user_restriction == UserRestriction::NewUser && !ctx.is_new_user {
        return Err(Rejection::NewUsersOnly);
    }

    if promotion.min_cart_value > Decimal::ZERO && ctx.cart_total < promotion.min_cart_value {
        return Err(Rejection::MinimumCartValue);
    }

    if promotion.min_product_count > 0 && ctx.product_count < promotion.min_product_count {
        return Err(Rejection::MinimumProductCount);
    }

    if ctx.usage_count >= i64::from(promotion.max_usage_per_user) {
        return Err(Rejection::UsageLimitReached);
    }

    Ok(())
}
