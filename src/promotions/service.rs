use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::promotions::eligibility::{self, EligibilityContext, Rejection};
use crate::promotions::seed;
use crate::promotions::store::{PromotionStore, UsageLedger};
use crate::promotions::{
    ApplyPromotionsRequest, ApplyPromotionsResponse, CartContext, DiscountCalculator,
    NewPromotion, PromoError, PromoMetrics, PromoResult, Promotion, PromotionType,
};

/// Service for promotion business logic
///
/// Owns no state besides its injected stores; every call reads the rule store
/// and usage ledger afresh.
#[derive(Clone)]
pub struct PromotionService {
    promotions: Arc<dyn PromotionStore>,
    usage: Arc<dyn UsageLedger>,
    metrics: PromoMetrics,
}

impl PromotionService {
    /// Create a new PromotionService
    pub fn new(promotions: Arc<dyn PromotionStore>, usage: Arc<dyn UsageLedger>) -> Self {
        Self {
            promotions,
            usage,
            metrics: PromoMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &PromoMetrics {
        &self.metrics
    }

    /// Create a promotion (admin)
    pub async fn create_promotion(&self, input: NewPromotion) -> PromoResult<Promotion> {
        let promotion = self.promotions.create(input).await?;

        tracing::info!(
            "Created promotion {} ({}, code: {:?})",
            promotion.id,
            promotion.promotion_type,
            promotion.code
        );
        Ok(promotion)
    }

    /// Insert the default catalog entries that are not stored yet
    ///
    /// Returns how many promotions were inserted.
    pub async fn seed_defaults(&self) -> PromoResult<usize> {
        let existing = self.promotions.list_all().await?;
        let mut inserted = 0;

        for candidate in seed::default_promotions() {
            if existing.iter().any(|p| seed::is_same_entry(p, &candidate)) {
                continue;
            }
            self.promotions.create(candidate).await?;
            inserted += 1;
        }

        if inserted > 0 {
            tracing::info!("Seeded {} default promotions", inserted);
        } else {
            tracing::debug!("Default promotions already present");
        }
        Ok(inserted)
    }

    /// Every stored promotion, including inactive and expired ones
    pub async fn list_promotions(&self) -> PromoResult<Vec<Promotion>> {
        Ok(self.promotions.list_all().await?)
    }

    /// Activate or deactivate a promotion
    pub async fn set_promotion_active(&self, id: i32, active: bool) -> PromoResult<Promotion> {
        let promotion = self
            .promotions
            .set_active(id, active)
            .await?
            .ok_or(PromoError::PromotionNotFound(id))?;

        tracing::info!("Promotion {} active flag set to {}", id, active);
        Ok(promotion)
    }

    /// A user is new while they have no recorded usage of any promotion
    pub async fn is_new_user(&self, user_id: i32) -> PromoResult<bool> {
        Ok(self.usage.count_for_user(user_id).await? == 0)
    }

    async fn check(
        &self,
        promotion: &Promotion,
        cart: &CartContext,
        is_new_user: bool,
    ) -> PromoResult<Result<(), Rejection>> {
        let usage_count = self.usage.count(cart.user_id, promotion.id).await?;

        let ctx = EligibilityContext {
            user_id: cart.user_id,
            cart_total: cart.cart_total,
            product_count: cart.product_count,
            is_new_user,
            usage_count,
        };

        Ok(eligibility::evaluate(promotion, &ctx))
    }

    /// Currently valid promotions the user could redeem with this cart
    ///
    /// Read-only. Storage order is preserved. Any storage failure aborts the
    /// whole query; no partial list is returned.
    pub async fn available_promotions(&self, cart: &CartContext) -> PromoResult<Vec<Promotion>> {
        let _timer = self.metrics.start_availability_query();
        tracing::debug!("Listing available promotions for user {}", cart.user_id);

        let candidates = self.promotions.list_valid(Utc::now()).await?;
        let is_new_user = self.is_new_user(cart.user_id).await?;

        let mut available = Vec::new();
        for promotion in candidates {
            if self.check(&promotion, cart, is_new_user).await?.is_ok() {
                available.push(promotion);
            }
        }

        tracing::debug!(
            "{} promotions available for user {}",
            available.len(),
            cart.user_id
        );
        Ok(available)
    }

    /// Validate a coupon code against a cart without redeeming it
    pub async fn validate_coupon(&self, code: &str, cart: &CartContext) -> PromoResult<Promotion> {
        let _timer = self.metrics.start_coupon_validation();
        tracing::debug!("Validating coupon {} for user {}", code, cart.user_id);

        let promotion = self
            .promotions
            .find_valid_by_code(code, Utc::now())
            .await?
            .ok_or(PromoError::CouponNotFound)?;

        let is_new_user = self.is_new_user(cart.user_id).await?;
        if let Err(rejection) = self.check(&promotion, cart, is_new_user).await? {
            return Err(self.reject(rejection, cart.user_id, promotion.id));
        }

        Ok(promotion)
    }

    /// Apply promotions to a cart
    ///
    /// With a code only that coupon is considered and its redemption is
    /// recorded; a missing or ineligible coupon never falls back to automatic
    /// promotions. Without a code every eligible automatic promotion stacks and
    /// no usage is recorded.
    pub async fn apply_promotions(
        &self,
        request: &ApplyPromotionsRequest,
    ) -> PromoResult<ApplyPromotionsResponse> {
        let _timer = self.metrics.start_apply();
        let cart = request.cart();

        match request.coupon_code() {
            Some(code) => self.apply_coupon(code, &cart).await,
            None => self.apply_automatic(&cart).await,
        }
    }

    async fn apply_coupon(&self, code: &str, cart: &CartContext) -> PromoResult<ApplyPromotionsResponse> {
        let promotion = self
            .promotions
            .find_valid_by_code(code, Utc::now())
            .await?
            .ok_or_else(|| {
                tracing::debug!("Coupon {} not found for user {}", code, cart.user_id);
                PromoError::InvalidCouponCode
            })?;

        let is_new_user = self.is_new_user(cart.user_id).await?;
        if let Err(rejection) = self.check(&promotion, cart, is_new_user).await? {
            return Err(self.reject(rejection, cart.user_id, promotion.id));
        }

        // Priced before the usage write so an unpriceable cart redeems nothing
        let total_discount = Self::discount(&promotion, cart)?;

        // Commit usage before answering; a concurrent redemption may have
        // taken the last slot since the check above
        let record = self
            .usage
            .record_within_limit(cart.user_id, promotion.id, promotion.max_usage_per_user)
            .await
            .map_err(|err| {
                tracing::error!(
                    "Failed to record usage of promotion {} by user {}: {}",
                    promotion.id,
                    cart.user_id,
                    err
                );
                PromoError::from(err)
            })?;

        if record.is_none() {
            return Err(self.reject(Rejection::UsageLimitReached, cart.user_id, promotion.id));
        }

        self.metrics.record_redemption();
        tracing::info!(
            "User {} redeemed coupon {} (promotion {}), discount {}",
            cart.user_id,
            code,
            promotion.id,
            total_discount
        );

        Ok(Self::priced(cart.cart_total, total_discount, vec![promotion]))
    }

    async fn apply_automatic(&self, cart: &CartContext) -> PromoResult<ApplyPromotionsResponse> {
        let candidates = self
            .promotions
            .list_valid_of_types(&PromotionType::AUTOMATIC, Utc::now())
            .await?;
        let is_new_user = self.is_new_user(cart.user_id).await?;

        let mut total_discount = Decimal::ZERO;
        let mut applied_promos = Vec::new();

        for promotion in candidates {
            if self.check(&promotion, cart, is_new_user).await?.is_err() {
                continue;
            }

            if promotion.discount_type.is_percentage_based() {
                total_discount = total_discount
                    .checked_add(Self::discount(&promotion, cart)?)
                    .ok_or(PromoError::AmountOutOfRange)?;
                applied_promos.push(promotion);
            }
        }

        tracing::debug!(
            "Applied {} automatic promotions for user {}, discount {}",
            applied_promos.len(),
            cart.user_id,
            total_discount
        );
        Ok(Self::priced(cart.cart_total, total_discount, applied_promos))
    }

    fn discount(promotion: &Promotion, cart: &CartContext) -> PromoResult<Decimal> {
        DiscountCalculator::discount_for(promotion, cart.cart_total).ok_or_else(|| {
            tracing::warn!(
                "Discount of promotion {} overflows for cart total {} (user {})",
                promotion.id,
                cart.cart_total,
                cart.user_id
            );
            PromoError::AmountOutOfRange
        })
    }

    fn priced(
        total: Decimal,
        total_discount: Decimal,
        applied_promos: Vec<Promotion>,
    ) -> ApplyPromotionsResponse {
        ApplyPromotionsResponse {
            total,
            total_discount,
            final_amount: DiscountCalculator::final_amount(total, total_discount),
            applied_promos,
        }
    }

    fn reject(&self, rejection: Rejection, user_id: i32, promotion_id: i32) -> PromoError {
        self.metrics.record_rejection();
        tracing::warn!(
            "Promotion {} rejected for user {}: {}",
            promotion_id,
            user_id,
            rejection
        );
        PromoError::Rejected(rejection)
    }
}
