use async_trait::async_trait;

use crate::types::{MealRecord, MealType, NutrientVector, RawSignal};

/// Black-box image capability: a local captioning model or a remote vision API.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Short name used in logs and status lines.
    fn name(&self) -> &str;
    async fn analyze(&self, image: &[u8]) -> anyhow::Result<RawSignal>;
}

/// Per-user meal history. The store assigns the record timestamp.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn put(&self, user_id: &str, meal_type: MealType, nutrients: NutrientVector) -> anyhow::Result<MealRecord>;
    async fn list_all(&self, user_id: &str) -> anyhow::Result<Vec<MealRecord>>;
}
