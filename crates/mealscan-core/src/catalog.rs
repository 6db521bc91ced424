//! Nutrient reference table.
//!
//! The table is a CSV with the header `food,calories,protein,fat,carbohydrates`.
//! Rows that repeat an identifier override earlier ones ("last wins"), while the
//! identifier keeps the position of its first row. Loading never
//! fails: an unreadable or malformed source is replaced by a small built-in
//! catalog and reported through [`CatalogSource::Builtin`].
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::{FoodEntry, FoodId, NutrientVector};

#[derive(Debug, Deserialize)]
struct CatalogRow {
    food: String,
    calories: f64,
    protein: f64,
    fat: f64,
    carbohydrates: f64,
}

/// Where the active catalog came from.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogSource {
    File(PathBuf),
    Builtin { reason: String },
}

#[derive(Debug, Clone)]
pub struct FoodCatalog {
    entries: HashMap<FoodId, FoodEntry>,
    ids: Vec<FoodId>,
    source: CatalogSource,
}

impl FoodCatalog {
    /// Load from a CSV file, falling back to [`FoodCatalog::builtin`].
    pub fn load(path: &Path) -> Self {
        match std::fs::File::open(path).map_err(|e| Error::Catalog(format!("{}: {e}", path.display()))).and_then(Self::parse) {
            Ok(entries) => {
                let catalog = Self::from_entries(entries, CatalogSource::File(path.to_path_buf()));
                info!(path = %path.display(), foods = catalog.len(), "food catalog loaded");
                catalog
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "using built-in food catalog");
                Self::builtin(e.to_string())
            }
        }
    }

    /// Parse CSV rows without deduplicating. Any unparsable row or negative
    /// nutrient makes the whole source unusable.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<FoodEntry>> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut out = Vec::new();
        for (line, row) in rdr.deserialize::<CatalogRow>().enumerate() {
            let row = row.map_err(|e| Error::Catalog(format!("row {}: {e}", line + 1)))?;
            let nutrients = NutrientVector::new(row.calories, row.protein, row.fat, row.carbohydrates);
            if row.food.is_empty() || !nutrients.is_valid() {
                return Err(Error::Catalog(format!("row {}: invalid entry for '{}'", line + 1, row.food)));
            }
            out.push(FoodEntry { id: row.food, nutrients });
        }
        if out.is_empty() { return Err(Error::Catalog("no rows".to_string())); }
        Ok(out)
    }

    /// Build a catalog where a repeated identifier keeps its first position
    /// and takes the values of its last row.
    pub fn from_entries<I: IntoIterator<Item = FoodEntry>>(entries: I, source: CatalogSource) -> Self {
        let mut ids = Vec::new();
        let mut map: HashMap<FoodId, FoodEntry> = HashMap::new();
        for entry in entries {
            if !map.contains_key(&entry.id) {
                ids.push(entry.id.clone());
            }
            map.insert(entry.id.clone(), entry);
        }
        Self { entries: map, ids, source }
    }

    pub fn builtin(reason: impl Into<String>) -> Self {
        let rows = [
            ("ごはん", 168.0, 2.5, 0.3, 37.1),
            ("鶏肉", 145.0, 23.0, 3.5, 0.0),
            ("ブロッコリー", 33.0, 4.3, 0.3, 5.2),
            ("ゆで卵", 76.0, 6.3, 5.3, 0.2),
            ("リンゴ", 54.0, 0.2, 0.1, 14.1),
        ];
        let entries = rows.into_iter().map(|(id, kcal, p, f, c)| FoodEntry { id: id.to_string(), nutrients: NutrientVector::new(kcal, p, f, c) });
        Self::from_entries(entries, CatalogSource::Builtin { reason: reason.into() })
    }

    /// Case-sensitive lookup by stored identifier.
    pub fn lookup(&self, id: &str) -> Option<&FoodEntry> { self.entries.get(id) }
    pub fn contains(&self, id: &str) -> bool { self.entries.contains_key(id) }
    pub fn all_identifiers(&self) -> &[FoodId] { &self.ids }
    pub fn len(&self) -> usize { self.ids.len() }
    pub fn is_empty(&self) -> bool { self.ids.is_empty() }
    pub fn source(&self) -> &CatalogSource { &self.source }
    pub fn is_fallback(&self) -> bool { matches!(self.source, CatalogSource::Builtin { .. }) }
}
