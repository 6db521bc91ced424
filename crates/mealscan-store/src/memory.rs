use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

use mealscan_core::error::Error;
use mealscan_core::traits::RecordStore;
use mealscan_core::types::{MealRecord, MealType, NutrientVector};

/// Process-local store; records are lost on exit.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<String, Vec<MealRecord>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put(&self, user_id: &str, meal_type: MealType, nutrients: NutrientVector) -> Result<MealRecord> {
        let record = MealRecord { meal_type, nutrients, created_at: Utc::now() };
        let mut records = self.records.lock().map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        records.entry(user_id.to_string()).or_default().push(record.clone());
        Ok(record)
    }

    async fn list_all(&self, user_id: &str) -> Result<Vec<MealRecord>> {
        let records = self.records.lock().map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        Ok(records.get(user_id).cloned().unwrap_or_default())
    }
}
