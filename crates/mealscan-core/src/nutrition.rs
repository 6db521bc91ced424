//! Meal and day totals.
use crate::catalog::FoodCatalog;
use crate::types::NutrientVector;

/// Sum the nutrients of every identifier present in `catalog`.
/// Unknown identifiers are skipped; the catalog may have changed since detection.
pub fn sum_foods<S: AsRef<str>>(ids: &[S], catalog: &FoodCatalog) -> NutrientVector {
    ids.iter().filter_map(|id| catalog.lookup(id.as_ref())).map(|e| e.nutrients).sum()
}

/// Fold a confirmed meal into the running day total.
pub fn accumulate(daily_total: NutrientVector, meal: NutrientVector) -> NutrientVector { daily_total + meal }

/// Drop repeated identifiers, keeping the first occurrence.
pub fn dedup_selection<S: AsRef<str>>(selection: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(selection.len());
    for id in selection {
        let id = id.as_ref().trim();
        if id.is_empty() || out.iter().any(|o| o == id) { continue; }
        out.push(id.to_string());
    }
    out
}
