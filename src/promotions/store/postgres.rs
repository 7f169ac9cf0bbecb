use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::promotions::{NewPromotion, Promotion, PromotionType, UsageRecord};

use super::{PromotionStore, StoreError, UsageLedger};

const PROMOTION_COLUMNS: &str = "id, type, code, description, discount_type, discount_value, \
     min_cart_value, min_product_count, user_restriction, start_date, end_date, \
     max_usage_per_user, active";

/// Name of the partial unique index on promotions.code
const CODE_UNIQUE_INDEX: &str = "promotions_code_key";

/// Repository for promotion definitions
#[derive(Clone)]
pub struct PgPromotionStore {
    pool: PgPool,
}

impl PgPromotionStore {
    /// Create a new PgPromotionStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_duplicate_code(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(CODE_UNIQUE_INDEX),
        _ => false,
    }
}

#[async_trait::async_trait]
impl PromotionStore for PgPromotionStore {
    async fn create(&self, input: NewPromotion) -> Result<Promotion, StoreError> {
        let code = input.code.clone();

        let result = sqlx::query_as::<_, Promotion>(&format!(
            r#"
            INSERT INTO promotions
                (type, code, description, discount_type, discount_value, min_cart_value,
                 min_product_count, user_restriction, start_date, end_date, max_usage_per_user, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {PROMOTION_COLUMNS}
            "#
        ))
        .bind(input.promotion_type)
        .bind(&input.code)
        .bind(&input.description)
        .bind(input.discount_type)
        .bind(input.discount_value)
        .bind(input.min_cart_value)
        .bind(input.min_product_count)
        .bind(input.user_restriction)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.max_usage_per_user)
        .bind(input.active)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(promotion) => Ok(promotion),
            Err(err) if is_duplicate_code(&err) => {
                Err(StoreError::DuplicateCode(code.unwrap_or_default()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn list_all(&self) -> Result<Vec<Promotion>, StoreError> {
        let promotions = sqlx::query_as::<_, Promotion>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(promotions)
    }

    async fn list_valid(&self, now: DateTime<Utc>) -> Result<Vec<Promotion>, StoreError> {
        let promotions = sqlx::query_as::<_, Promotion>(&format!(
            r#"
            SELECT {PROMOTION_COLUMNS}
            FROM promotions
            WHERE active = TRUE
              AND (start_date IS NULL OR start_date <= $1)
              AND (end_date IS NULL OR end_date >= $1)
            ORDER BY id
            "#
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(promotions)
    }

    async fn find_valid_by_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Promotion>, StoreError> {
        let promotion = sqlx::query_as::<_, Promotion>(&format!(
            r#"
            SELECT {PROMOTION_COLUMNS}
            FROM promotions
            WHERE code = $1
              AND active = TRUE
              AND (start_date IS NULL OR start_date <= $2)
              AND (end_date IS NULL OR end_date >= $2)
            ORDER BY id
            LIMIT 1
            "#
        ))
        .bind(code)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(promotion)
    }

    async fn list_valid_of_types(
        &self,
        types: &[PromotionType],
        now: DateTime<Utc>,
    ) -> Result<Vec<Promotion>, StoreError> {
        let type_names: Vec<String> = types.iter().map(|t| t.as_str().to_string()).collect();

        let promotions = sqlx::query_as::<_, Promotion>(&format!(
            r#"
            SELECT {PROMOTION_COLUMNS}
            FROM promotions
            WHERE active = TRUE
              AND type = ANY($1)
              AND (start_date IS NULL OR start_date <= $2)
              AND (end_date IS NULL OR end_date >= $2)
            ORDER BY id
            "#
        ))
        .bind(&type_names)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(promotions)
    }

    async fn set_active(&self, id: i32, active: bool) -> Result<Option<Promotion>, StoreError> {
        let promotion = sqlx::query_as::<_, Promotion>(&format!(
            "UPDATE promotions SET active = $1 WHERE id = $2 RETURNING {PROMOTION_COLUMNS}"
        ))
        .bind(active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(promotion)
    }
}

/// Repository for promotion usage records
#[derive(Clone)]
pub struct PgUsageLedger {
    pool: PgPool,
}

impl PgUsageLedger {
    /// Create a new PgUsageLedger
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UsageLedger for PgUsageLedger {
    async fn count_for_user(&self, user_id: i32) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM promotion_usages WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count(&self, user_id: i32, promotion_id: i32) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM promotion_usages WHERE user_id = $1 AND promotion_id = $2",
        )
        .bind(user_id)
        .bind(promotion_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn record(&self, user_id: i32, promotion_id: i32) -> Result<UsageRecord, StoreError> {
        let record = sqlx::query_as::<_, UsageRecord>(
            r#"
            INSERT INTO promotion_usages (user_id, promotion_id)
            VALUES ($1, $2)
            RETURNING id, user_id, promotion_id, used_at
            "#,
        )
        .bind(user_id)
        .bind(promotion_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn record_within_limit(
        &self,
        user_id: i32,
        promotion_id: i32,
        limit: i32,
    ) -> Result<Option<UsageRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Serializes redemptions of the same (user, promotion) pair until commit
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(user_id)
            .bind(promotion_id)
            .execute(&mut *tx)
            .await?;

        let used: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM promotion_usages WHERE user_id = $1 AND promotion_id = $2",
        )
        .bind(user_id)
        .bind(promotion_id)
        .fetch_one(&mut *tx)
        .await?;

        if used >= i64::from(limit) {
            // Dropping the transaction rolls back and releases the lock
            return Ok(None);
        }

        let record = sqlx::query_as::<_, UsageRecord>(
            r#"
            INSERT INTO promotion_usages (user_id, promotion_id)
            VALUES ($1, $2)
            RETURNING id, user_id, promotion_id, used_at
            "#,
        )
        .bind(user_id)
        .bind(promotion_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(record))
    }
}
