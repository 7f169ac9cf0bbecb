use rust_decimal::{Decimal, RoundingStrategy};

use crate::promotions::Promotion;

/// Computes discount amounts and final prices for applied promotions
pub struct DiscountCalculator;

impl DiscountCalculator {
    /// Discount granted by a single promotion on `cart_total`
    ///
    /// Percentage and cashback promotions grant `cart_total * discount_value / 100`.
    /// Any other discount type grants nothing. `None` when the product does
    /// not fit in a `Decimal`.
    pub fn discount_for(promotion: &Promotion, cart_total: Decimal) -> Option<Decimal> {
        if !promotion.discount_type.is_percentage_based() {
            return Some(Decimal::ZERO);
        }

        cart_total
            .checked_mul(promotion.discount_value)?
            .checked_div(Decimal::ONE_HUNDRED)
    }

    /// Final amount after subtracting the stacked discount, rounded to two
    /// decimals with halves rounded away from zero
    pub fn final_amount(cart_total: Decimal, total_discount: Decimal) -> Decimal {
        (cart_total - total_discount).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}
