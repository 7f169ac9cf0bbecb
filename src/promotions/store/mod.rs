// Storage seams for the promotion engine
//
// The rule store and the usage ledger are injected as trait objects so the
// service runs unchanged against Postgres in production and in memory in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::promotions::{NewPromotion, Promotion, PromotionType, UsageRecord};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryPromotionStore, InMemoryUsageLedger};
pub use postgres::{PgPromotionStore, PgUsageLedger};

/// Failures of the underlying store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("a promotion with code '{0}' already exists")]
    DuplicateCode(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persisted promotion definitions
///
/// Listings are returned in insertion order. The `now`-taking queries only
/// return promotions for which [`Promotion::is_currently_valid`] holds.
#[async_trait]
pub trait PromotionStore: Send + Sync {
    async fn create(&self, input: NewPromotion) -> Result<Promotion, StoreError>;

    async fn list_all(&self) -> Result<Vec<Promotion>, StoreError>;

    async fn list_valid(&self, now: DateTime<Utc>) -> Result<Vec<Promotion>, StoreError>;

    async fn find_valid_by_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Promotion>, StoreError>;

    async fn list_valid_of_types(
        &self,
        types: &[PromotionType],
        now: DateTime<Utc>,
    ) -> Result<Vec<Promotion>, StoreError>;

    /// Returns `None` when no promotion has this id
    async fn set_active(&self, id: i32, active: bool) -> Result<Option<Promotion>, StoreError>;
}

/// Per-user redemption history
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Usages of any promotion by this user
    async fn count_for_user(&self, user_id: i32) -> Result<i64, StoreError>;

    async fn count(&self, user_id: i32, promotion_id: i32) -> Result<i64, StoreError>;

    async fn record(&self, user_id: i32, promotion_id: i32) -> Result<UsageRecord, StoreError>;

    /// Records a usage only if the user has fewer than `limit` usages of the
    /// promotion, as one atomic step. Returns `None` when the limit is reached.
    async fn record_within_limit(
        &self,
        user_id: i32,
        promotion_id: i32,
        limit: i32,
    ) -> Result<Option<UsageRecord>, StoreError>;
}
