// Validation utilities module
// Provides custom validation functions for promotion requests

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;
use validator::ValidationError;

use crate::promotions::NewPromotion;

/// Coupon codes: letters, digits, dash and underscore
fn coupon_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid coupon code pattern"))
}

/// Validates that a coupon code only uses the accepted characters
pub fn validate_coupon_code(code: &str) -> Result<(), ValidationError> {
    if coupon_code_pattern().is_match(code) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_coupon_code"))
    }
}

/// Largest amount accepted anywhere; fits NUMERIC(12, 2)
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Validates that an amount lies within 0..=MAX_AMOUNT
pub fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::new("amount_must_not_be_negative"));
    }
    if *amount > MAX_AMOUNT {
        return Err(ValidationError::new("amount_too_large"));
    }
    Ok(())
}

/// Like [`validate_amount`], and at most two decimal places
pub fn validate_stored_amount(amount: &Decimal) -> Result<(), ValidationError> {
    validate_amount(amount)?;
    if amount.normalize().scale() > 2 {
        return Err(ValidationError::new("too_many_decimal_places"));
    }
    Ok(())
}

/// Cross-field checks for a new promotion
///
/// - percentage-based discounts must lie within 0..=100
/// - the validity window must not end before it starts
pub fn validate_new_promotion(promotion: &NewPromotion) -> Result<(), ValidationError> {
    if promotion.discount_type.is_percentage_based()
        && promotion.discount_value > Decimal::ONE_HUNDRED
    {
        return Err(ValidationError::new("percentage_above_one_hundred"));
    }

    if let (Some(start), Some(end)) = (promotion.start_date, promotion.end_date) {
        if end < start {
            return Err(ValidationError::new("end_date_before_start_date"));
        }
    }

    Ok(())
}
