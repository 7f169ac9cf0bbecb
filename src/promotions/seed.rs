// Default promotion catalog inserted at startup

use rust_decimal::Decimal;

use crate::promotions::{DiscountType, NewPromotion, Promotion, PromotionType, UserRestriction};

fn percentage(
    promotion_type: PromotionType,
    code: Option<&str>,
    description: &str,
    value: Decimal,
    min_cart_value: Decimal,
    min_product_count: i32,
    user_restriction: UserRestriction,
) -> NewPromotion {
    NewPromotion {
        promotion_type,
        code: code.map(str::to_string),
        description: Some(description.to_string()),
        discount_type: DiscountType::Percentage,
        discount_value: value,
        min_cart_value,
        min_product_count,
        user_restriction,
        start_date: None,
        end_date: None,
        max_usage_per_user: 1,
        active: true,
    }
}

/// The catalog every fresh deployment starts with
pub fn default_promotions() -> Vec<NewPromotion> {
    vec![
        percentage(
            PromotionType::CartValue,
            None,
            "Flat 20% off on orders above 1L",
            Decimal::from(20),
            Decimal::from(100_000),
            0,
            UserRestriction::All,
        ),
        percentage(
            PromotionType::Coupon,
            Some("WELCOME10"),
            "10% off for new users",
            Decimal::from(10),
            Decimal::ZERO,
            0,
            UserRestriction::NewUser,
        ),
        percentage(
            PromotionType::Coupon,
            Some("PRODUCTMIN"),
            "Needs 3 products",
            Decimal::from(10),
            Decimal::ZERO,
            3,
            UserRestriction::All,
        ),
        percentage(
            PromotionType::ProductQuantity,
            Some("QTY3"),
            "Needs 3 products for discount",
            Decimal::from(10),
            Decimal::ZERO,
            3,
            UserRestriction::All,
        ),
        percentage(
            PromotionType::Coupon,
            Some("MINCART50"),
            "Min cart value 50000",
            Decimal::from(10),
            Decimal::from(50_000),
            0,
            UserRestriction::All,
        ),
    ]
}

/// Whether `existing` already represents the catalog entry `candidate`
pub fn is_same_entry(existing: &Promotion, candidate: &NewPromotion) -> bool {
    existing.description == candidate.description
        && existing.promotion_type == candidate.promotion_type
        && existing.discount_value == candidate.discount_value
        && existing.min_cart_value == candidate.min_cart_value
        && existing.min_product_count == candidate.min_product_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = default_promotions();
        assert_eq!(catalog.len(), 5);

        for promotion in &catalog {
            assert!(promotion.validate().is_ok(), "{:?}", promotion.description);
            assert_eq!(promotion.max_usage_per_user, 1);
            assert!(promotion.active);
        }
    }

    #[test]
    fn test_only_cart_value_entry_is_codeless() {
        let codeless: Vec<_> = default_promotions()
            .into_iter()
            .filter(|p| p.code.is_none())
            .collect();

        assert_eq!(codeless.len(), 1);
        assert_eq!(codeless[0].promotion_type, PromotionType::CartValue);
    }

    #[test]
    fn test_is_same_entry_ignores_id_and_active_flag() {
        let candidate = default_promotions().remove(1);
        let mut existing = Promotion::from_new(42, candidate.clone());
        existing.active = false;
        assert!(is_same_entry(&existing, &candidate));

        existing.discount_value = Decimal::from(15);
        assert!(!is_same_entry(&existing, &candidate));
    }
}
