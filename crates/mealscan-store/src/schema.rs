use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

pub fn build_record_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("user_id", DataType::Utf8, false),
        Field::new("meal_type", DataType::Utf8, false),
        Field::new("calories", DataType::Float64, false),
        Field::new("protein", DataType::Float64, false),
        Field::new("fat", DataType::Float64, false),
        Field::new("carbohydrates", DataType::Float64, false),
        Field::new("created_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
    ]))
}
