// Error types for the promotion engine

use thiserror::Error;

use crate::promotions::eligibility::Rejection;
use crate::promotions::store::StoreError;

/// Main error type for promotion operations
///
/// Business-rule outcomes (`Rejected`, `CouponNotFound`, `InvalidCouponCode`)
/// are recoverable and carry user-facing text. `Storage` is a server-side failure.
#[derive(Debug, Error)]
pub enum PromoError {
    /// The promotion exists but does not apply to this user/cart
    #[error("{0}")]
    Rejected(Rejection),

    /// Validation lookup found no currently valid promotion with this code
    #[error("Invalid or expired coupon")]
    CouponNotFound,

    /// Apply lookup found no currently valid promotion with this code
    #[error("Invalid coupon code")]
    InvalidCouponCode,

    /// The discount on this cart total cannot be represented
    #[error("Cart total is out of range")]
    AmountOutOfRange,

    #[error("Promotion {0} not found")]
    PromotionNotFound(i32),

    #[error("A promotion with code '{0}' already exists")]
    DuplicateCode(String),

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for PromoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateCode(code) => PromoError::DuplicateCode(code),
            other => PromoError::Storage(other),
        }
    }
}

impl From<Rejection> for PromoError {
    fn from(rejection: Rejection) -> Self {
        PromoError::Rejected(rejection)
    }
}

/// Result type alias for promotion operations
pub type PromoResult<T> = Result<T, PromoError>;
