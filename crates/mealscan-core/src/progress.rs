//! Progress against recommended intake.
//!
//! Percentages are `current / target * 100`, 0 where the target is not
//! positive, and clamped to a display ceiling so an exceeded target still
//! plots inside the chart. The advice category is picked by an ordered rule
//! table; the first rule whose predicate holds wins.
use serde::{Deserialize, Serialize};

use crate::types::{MealType, Nutrient, NutrientVector};

pub const DEFAULT_CEILING: f64 = 120.0;

/// Below this share of the target a nutrient is reported as short.
pub const SHORTFALL_RATIO: f64 = 0.5;

pub fn default_daily_target() -> NutrientVector { NutrientVector::new(2000.0, 60.0, 50.0, 300.0) }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceCategory {
    NoDataYet,
    OverTarget,
    ProteinLow,
    CarbohydratesOnTrack,
    Balanced,
}

impl AdviceCategory {
    pub fn message(&self) -> &'static str {
        match self {
            AdviceCategory::NoDataYet => "Log today's meals to get started.",
            AdviceCategory::OverTarget => "A little over today's energy target. Try a lighter, vegetable-forward next meal.",
            AdviceCategory::ProteinLow => "Protein is running low. Add eggs, meat, fish or tofu.",
            AdviceCategory::CarbohydratesOnTrack => "Carbohydrates are well covered. Good fuel for the afternoon.",
            AdviceCategory::Balanced => "Great balance. Keep it up!",
        }
    }
}

pub type AdvicePredicate = fn(&NutrientVector, &NutrientVector) -> bool;

fn no_calories(cur: &NutrientVector, _: &NutrientVector) -> bool { cur.calories == 0.0 }
fn calories_over(cur: &NutrientVector, tgt: &NutrientVector) -> bool { cur.calories > tgt.calories }
fn protein_low(cur: &NutrientVector, tgt: &NutrientVector) -> bool { cur.protein < tgt.protein * 0.5 }
fn carbohydrates_high(cur: &NutrientVector, tgt: &NutrientVector) -> bool { cur.carbohydrates > tgt.carbohydrates * 0.8 }
fn always(_: &NutrientVector, _: &NutrientVector) -> bool { true }

/// Evaluated top to bottom against the daily current/target pair.
pub const ADVICE_RULES: [(AdvicePredicate, AdviceCategory); 5] = [
    (no_calories, AdviceCategory::NoDataYet),
    (calories_over, AdviceCategory::OverTarget),
    (protein_low, AdviceCategory::ProteinLow),
    (carbohydrates_high, AdviceCategory::CarbohydratesOnTrack),
    (always, AdviceCategory::Balanced),
];

pub fn advise(current: &NutrientVector, target: &NutrientVector) -> AdviceCategory {
    ADVICE_RULES
        .iter()
        .find(|(applies, _)| applies(current, target))
        .map_or(AdviceCategory::Balanced, |(_, category)| *category)
}

/// Which totals a chart compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Daily,
    LastMeal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentages {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrates: f64,
}

impl Percentages {
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Fat => self.fat,
            Nutrient::Carbohydrates => self.carbohydrates,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub percentages: Percentages,
    pub advice: AdviceCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortfall {
    pub nutrient: Nutrient,
    pub suggestions: Vec<String>,
}

fn suggestions_for(nutrient: Nutrient) -> &'static [&'static str] {
    match nutrient {
        Nutrient::Calories => &["パン", "ご飯", "麺", "シリアル"],
        Nutrient::Protein => &["肉", "魚", "卵", "豆類"],
        Nutrient::Fat => &["ナッツ", "アボカド", "油"],
        Nutrient::Carbohydrates => &["フルーツ", "全粒穀物", "イモ類"],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvaluator {
    pub daily_target: NutrientVector,
    pub ceiling: f64,
}

impl Default for ProgressEvaluator {
    fn default() -> Self { Self { daily_target: default_daily_target(), ceiling: DEFAULT_CEILING } }
}

impl ProgressEvaluator {
    pub fn new(daily_target: NutrientVector, ceiling: f64) -> Self { Self { daily_target, ceiling } }

    /// Daily target scaled by the meal's share.
    pub fn meal_target(&self, meal_type: MealType) -> NutrientVector { self.daily_target.scale(meal_type.target_ratio()) }

    pub fn target_for(&self, mode: ViewMode, meal_type: Option<MealType>) -> NutrientVector {
        match (mode, meal_type) {
            (ViewMode::LastMeal, Some(meal)) => self.meal_target(meal),
            (ViewMode::LastMeal, None) => self.meal_target(MealType::Breakfast),
            (ViewMode::Daily, _) => self.daily_target,
        }
    }

    pub fn percentages(&self, current: &NutrientVector, target: &NutrientVector) -> Percentages {
        let r = current.ratio(target);
        let clamp = |v: f64| (v * 100.0).min(self.ceiling);
        Percentages {
            calories: clamp(r.calories),
            protein: clamp(r.protein),
            fat: clamp(r.fat),
            carbohydrates: clamp(r.carbohydrates),
        }
    }

    pub fn evaluate(&self, current: &NutrientVector, target: &NutrientVector) -> Evaluation {
        Evaluation { percentages: self.percentages(current, target), advice: advise(current, target) }
    }

    /// Nutrients under half of `target`. Nothing is reported before any food is logged.
    pub fn shortfalls(&self, current: &NutrientVector, target: &NutrientVector) -> Vec<Shortfall> {
        if current.calories == 0.0 { return Vec::new(); }
        Nutrient::ALL
            .into_iter()
            .filter(|n| current.get(*n) < target.get(*n) * SHORTFALL_RATIO)
            .map(|n| Shortfall { nutrient: n, suggestions: suggestions_for(n).iter().map(|s| s.to_string()).collect() })
            .collect()
    }
}
