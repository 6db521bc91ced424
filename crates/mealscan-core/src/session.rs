//! Per-session state as an explicit value.
//!
//! Every transition consumes the context and returns the next one, so the
//! pipeline never mutates shared state. The daily total lives only here and
//! is lost on restart unless rebuilt from stored records.
use serde::{Deserialize, Serialize};

use crate::nutrition::accumulate;
use crate::progress::ViewMode;
use crate::types::{DetectionResult, MealType, NutrientVector};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: String,
    pub daily_total: NutrientVector,
    pub last_meal_type: Option<MealType>,
    pub last_meal: NutrientVector,
    pub view: ViewMode,
    pub detected: DetectionResult,
    /// Set when a calculated meal has not been persisted yet.
    pub pending_save: bool,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            daily_total: NutrientVector::ZERO,
            last_meal_type: None,
            last_meal: NutrientVector::ZERO,
            view: ViewMode::Daily,
            detected: DetectionResult::new(),
            pending_save: false,
        }
    }

    /// Replace the current detection; an empty result means manual selection.
    pub fn with_detection(self, detected: DetectionResult) -> Self { Self { detected, ..self } }

    /// Fold a calculated meal into the day and remember it as the last meal.
    pub fn add_meal(self, meal_type: MealType, nutrients: NutrientVector) -> Self {
        Self {
            daily_total: accumulate(self.daily_total, nutrients),
            last_meal_type: Some(meal_type),
            last_meal: nutrients,
            pending_save: true,
            ..self
        }
    }

    pub fn mark_saved(self) -> Self { Self { pending_save: false, ..self } }

    pub fn toggle_view(self) -> Self {
        let view = match self.view {
            ViewMode::Daily => ViewMode::LastMeal,
            ViewMode::LastMeal => ViewMode::Daily,
        };
        Self { view, ..self }
    }

    /// Clear the day. The user and view mode survive.
    pub fn reset_day(self) -> Self {
        Self { view: self.view, ..Self::new(self.user_id) }
    }

    /// Rebuild the day from previously stored meals.
    pub fn with_restored_total<I: IntoIterator<Item = NutrientVector>>(self, meals: I) -> Self {
        let daily_total = meals.into_iter().fold(NutrientVector::ZERO, accumulate);
        Self { daily_total, ..self }
    }

    /// The meal waiting to be saved, if any.
    pub fn pending_meal(&self) -> Option<(MealType, NutrientVector)> {
        match (self.pending_save, self.last_meal_type) {
            (true, Some(meal)) => Some((meal, self.last_meal)),
            _ => None,
        }
    }

    /// Totals shown by the current view.
    pub fn view_totals(&self) -> NutrientVector {
        match self.view {
            ViewMode::Daily => self.daily_total,
            ViewMode::LastMeal => self.last_meal,
        }
    }
}
