use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::promotions::{NewPromotion, Promotion, PromotionType, UsageRecord};

use super::{PromotionStore, StoreError, UsageLedger};

#[derive(Default)]
pub struct InMemoryPromotionStore {
    promotions: RwLock<Vec<Promotion>>,
}

impl InMemoryPromotionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PromotionStore for InMemoryPromotionStore {
    async fn create(&self, input: NewPromotion) -> Result<Promotion, StoreError> {
        let mut promotions = self.promotions.write().await;

        if let Some(code) = input.code.as_deref() {
            if promotions.iter().any(|p| p.code.as_deref() == Some(code)) {
                return Err(StoreError::DuplicateCode(code.to_string()));
            }
        }

        let id = promotions.last().map_or(1, |p| p.id + 1);
        let promotion = Promotion::from_new(id, input);
        promotions.push(promotion.clone());
        Ok(promotion)
    }

    async fn list_all(&self) -> Result<Vec<Promotion>, StoreError> {
        let promotions = self.promotions.read().await;
        Ok(promotions.clone())
    }

    async fn list_valid(&self, now: DateTime<Utc>) -> Result<Vec<Promotion>, StoreError> {
        let promotions = self.promotions.read().await;
        Ok(promotions
            .iter()
            .filter(|p| p.is_currently_valid(now))
            .cloned()
            .collect())
    }

    async fn find_valid_by_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Promotion>, StoreError> {
        let promotions = self.promotions.read().await;
        Ok(promotions
            .iter()
            .find(|p| p.code.as_deref() == Some(code) && p.is_currently_valid(now))
            .cloned())
    }

    async fn list_valid_of_types(
        &self,
        types: &[PromotionType],
        now: DateTime<Utc>,
    ) -> Result<Vec<Promotion>, StoreError> {
        let promotions = self.promotions.read().await;
        Ok(promotions
            .iter()
            .filter(|p| types.contains(&p.promotion_type) && p.is_currently_valid(now))
            .cloned()
            .collect())
    }

    async fn set_active(&self, id: i32, active: bool) -> Result<Option<Promotion>, StoreError> {
        let mut promotions = self.promotions.write().await;
        Ok(promotions.iter_mut().find(|p| p.id == id).map(|promotion| {
            promotion.active = active;
            promotion.clone()
        }))
    }
}

#[derive(Default)]
pub struct InMemoryUsageLedger {
    records: RwLock<Vec<UsageRecord>>,
}

impl InMemoryUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(records: &mut Vec<UsageRecord>, user_id: i32, promotion_id: i32) -> UsageRecord {
        let record = UsageRecord {
            id: records.len() as i64 + 1,
            user_id,
            promotion_id,
            used_at: Utc::now(),
        };
        records.push(record.clone());
        record
    }
}

#[async_trait::async_trait]
impl UsageLedger for InMemoryUsageLedger {
    async fn count_for_user(&self, user_id: i32) -> Result<i64, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| r.user_id == user_id).count() as i64)
    }

    async fn count(&self, user_id: i32, promotion_id: i32) -> Result<i64, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id && r.promotion_id == promotion_id)
            .count() as i64)
    }

    async fn record(&self, user_id: i32, promotion_id: i32) -> Result<UsageRecord, StoreError> {
        let mut records = self.records.write().await;
        Ok(Self::push(&mut records, user_id, promotion_id))
    }

    async fn record_within_limit(
        &self,
        user_id: i32,
        promotion_id: i32,
        limit: i32,
    ) -> Result<Option<UsageRecord>, StoreError> {
        // Count and insert under one write guard
        let mut records = self.records.write().await;
        let used = records
            .iter()
            .filter(|r| r.user_id == user_id && r.promotion_id == promotion_id)
            .count() as i64;

        if used >= i64::from(limit) {
            return Ok(None);
        }

        Ok(Some(Self::push(&mut records, user_id, promotion_id)))
    }
}
