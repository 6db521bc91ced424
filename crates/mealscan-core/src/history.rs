use std::collections::BTreeMap;

use crate::types::{MealRecord, MealType};

/// Reduce stored records to the newest one per meal type.
pub fn latest_per_meal_type<I: IntoIterator<Item = MealRecord>>(records: I) -> BTreeMap<MealType, MealRecord> {
    let mut out: BTreeMap<MealType, MealRecord> = BTreeMap::new();
    for record in records {
        match out.get(&record.meal_type) {
            Some(existing) if existing.created_at >= record.created_at => {}
            _ => { out.insert(record.meal_type, record); }
        }
    }
    out
}
