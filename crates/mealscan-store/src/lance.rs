//! Meal records in a LanceDB table.
//!
//! One row per saved meal. Rows are append-only; history reduction to the
//! newest record per meal type happens in the caller.
use anyhow::{anyhow, Result};
use arrow_array::{Float64Array, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Connection;
use std::sync::Arc;
use tracing::{info, warn};

use mealscan_core::error::Error;
use mealscan_core::traits::RecordStore;
use mealscan_core::types::{MealRecord, MealType, NutrientVector};

use crate::schema::build_record_schema;
use crate::table::{ensure_table, open_db};

pub struct LanceRecordStore {
    conn: Connection,
    table: String,
}

impl LanceRecordStore {
    pub async fn open(uri: &str, table: &str) -> Result<Self> {
        let conn = open_db(uri).await?;
        ensure_table(&conn, table, build_record_schema()).await?;
        info!(uri, table, "record store connected");
        Ok(Self { conn, table: table.to_string() })
    }

    fn to_record_batch(user_id: &str, record: &MealRecord) -> Result<RecordBatch> {
        let n = record.nutrients;
        Ok(RecordBatch::try_new(
            build_record_schema(),
            vec![
                Arc::new(StringArray::from(vec![user_id.to_string()])),
                Arc::new(StringArray::from(vec![record.meal_type.label().to_string()])),
                Arc::new(Float64Array::from(vec![n.calories])),
                Arc::new(Float64Array::from(vec![n.protein])),
                Arc::new(Float64Array::from(vec![n.fat])),
                Arc::new(Float64Array::from(vec![n.carbohydrates])),
                Arc::new(TimestampMillisecondArray::from(vec![record.created_at.timestamp_millis()])),
            ],
        )?)
    }

    fn read_batch(batch: &RecordBatch, out: &mut Vec<MealRecord>) -> Result<()> {
        let strings = |name: &str| {
            batch
                .column_by_name(name)
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| anyhow!("records.{name} column missing"))
        };
        let floats = |name: &str| {
            batch
                .column_by_name(name)
                .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
                .ok_or_else(|| anyhow!("records.{name} column missing"))
        };
        let meal_col = strings("meal_type")?;
        let (kcal, protein, fat, carbs) = (floats("calories")?, floats("protein")?, floats("fat")?, floats("carbohydrates")?);
        let created_col = batch
            .column_by_name("created_at")
            .and_then(|c| c.as_any().downcast_ref::<TimestampMillisecondArray>())
            .ok_or_else(|| anyhow!("records.created_at column missing"))?;

        for i in 0..batch.num_rows() {
            let Ok(meal_type) = meal_col.value(i).parse::<MealType>() else {
                warn!(meal_type = meal_col.value(i), "skipping record with unknown meal type");
                continue;
            };
            let Some(created_at) = DateTime::<Utc>::from_timestamp_millis(created_col.value(i)) else {
                warn!("skipping record with out-of-range timestamp");
                continue;
            };
            out.push(MealRecord {
                meal_type,
                nutrients: NutrientVector::new(kcal.value(i), protein.value(i), fat.value(i), carbs.value(i)),
                created_at,
            });
        }
        Ok(())
    }

    async fn append(&self, user_id: &str, record: &MealRecord) -> Result<()> {
        let rb = Self::to_record_batch(user_id, record)?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), build_record_schema()));
        let t = self.conn.open_table(&self.table).execute().await?;
        t.add(reader).execute().await?;
        Ok(())
    }

    async fn scan_user(&self, user_id: &str) -> Result<Vec<MealRecord>> {
        let t = self.conn.open_table(&self.table).execute().await?;
        let filter = format!("user_id = '{}'", user_id.replace('\'', "''"));
        let mut stream = t.query().only_if(filter).execute().await?;
        let mut out = Vec::new();
        while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
            Self::read_batch(&batch, &mut out)?;
        }
        Ok(out)
    }
}

fn store_error(action: &str, table: &str, e: anyhow::Error) -> anyhow::Error {
    Error::Store(format!("{action} {table}: {e:#}")).into()
}

#[async_trait]
impl RecordStore for LanceRecordStore {
    async fn put(&self, user_id: &str, meal_type: MealType, nutrients: NutrientVector) -> Result<MealRecord> {
        let record = MealRecord { meal_type, nutrients, created_at: Utc::now() };
        self.append(user_id, &record).await.map_err(|e| store_error("append to", &self.table, e))?;
        Ok(record)
    }

    async fn list_all(&self, user_id: &str) -> Result<Vec<MealRecord>> {
        self.scan_user(user_id).await.map_err(|e| store_error("read from", &self.table, e))
    }
}
