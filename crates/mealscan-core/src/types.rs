//! Domain types shared by the matcher, the evaluator and the record stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::error::Error;

/// Canonical name of one row in the nutrient reference table.
pub type FoodId = String;

/// The four tracked quantities. Calories are kcal, the rest grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientVector {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrates: f64,
}

impl NutrientVector {
    pub const ZERO: Self = Self { calories: 0.0, protein: 0.0, fat: 0.0, carbohydrates: 0.0 };

    pub fn new(calories: f64, protein: f64, fat: f64, carbohydrates: f64) -> Self {
        Self { calories, protein, fat, carbohydrates }
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Fat => self.fat,
            Nutrient::Carbohydrates => self.carbohydrates,
        }
    }

    /// Multiply every field by `factor`.
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.calories * factor, self.protein * factor, self.fat * factor, self.carbohydrates * factor)
    }

    /// Pointwise `self / other`; a field whose denominator is not positive yields 0.
    pub fn ratio(&self, other: &Self) -> Self {
        let div = |a: f64, b: f64| if b > 0.0 { a / b } else { 0.0 };
        Self::new(
            div(self.calories, other.calories),
            div(self.protein, other.protein),
            div(self.fat, other.fat),
            div(self.carbohydrates, other.carbohydrates),
        )
    }

    /// True when every field is finite and not negative.
    pub fn is_valid(&self) -> bool {
        Nutrient::ALL.iter().all(|n| {
            let v = self.get(*n);
            v.is_finite() && v >= 0.0
        })
    }
}

impl Add for NutrientVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.calories + rhs.calories,
            self.protein + rhs.protein,
            self.fat + rhs.fat,
            self.carbohydrates + rhs.carbohydrates,
        )
    }
}

impl AddAssign for NutrientVector {
    fn add_assign(&mut self, rhs: Self) { *self = *self + rhs; }
}

impl Sum for NutrientVector {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self { iter.fold(Self::ZERO, Add::add) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Calories,
    Protein,
    Fat,
    Carbohydrates,
}

impl Nutrient {
    pub const ALL: [Nutrient; 4] = [Nutrient::Calories, Nutrient::Protein, Nutrient::Fat, Nutrient::Carbohydrates];

    pub fn label(&self) -> &'static str {
        match self {
            Nutrient::Calories => "カロリー",
            Nutrient::Protein => "たんぱく質",
            Nutrient::Fat => "脂質",
            Nutrient::Carbohydrates => "炭水化物",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Nutrient::Calories => "kcal",
            _ => "g",
        }
    }
}

/// One row of the reference table after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: FoodId,
    pub nutrients: NutrientVector,
}

/// Fixed meal enumeration. Doubles as the record grouping key and as the
/// selector for the per-meal share of the daily target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner, MealType::Snack];

    /// Share of the daily target expected from one meal of this type.
    /// The shares are independent multipliers and do not sum to 1.
    pub fn target_ratio(&self) -> f64 {
        match self {
            MealType::Breakfast => 0.25,
            MealType::Lunch => 0.35,
            MealType::Dinner => 0.30,
            MealType::Snack => 0.10,
        }
    }

    /// Display label, also the value persisted in record stores.
    pub fn label(&self) -> &'static str {
        match self {
            MealType::Breakfast => "朝食",
            MealType::Lunch => "昼食",
            MealType::Dinner => "夕食",
            MealType::Snack => "おやつ",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

impl FromStr for MealType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        MealType::ALL
            .into_iter()
            .find(|m| m.label() == s || m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidInput(format!("unknown meal type '{s}'")))
    }
}

/// A confirmed meal. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    pub meal_type: MealType,
    pub nutrients: NutrientVector,
    pub created_at: DateTime<Utc>,
}

/// Foods found by one analysis call: ordered, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    foods: Vec<FoodId>,
}

impl DetectionResult {
    pub fn new() -> Self { Self::default() }

    /// Append `id` unless already present. Returns whether it was added.
    pub fn insert(&mut self, id: impl Into<FoodId>) -> bool {
        let id = id.into();
        if self.foods.contains(&id) { return false; }
        self.foods.push(id);
        true
    }

    pub fn contains(&self, id: &str) -> bool { self.foods.iter().any(|f| f == id) }
    pub fn is_empty(&self) -> bool { self.foods.is_empty() }
    pub fn len(&self) -> usize { self.foods.len() }
    pub fn foods(&self) -> &[FoodId] { &self.foods }
    pub fn into_foods(self) -> Vec<FoodId> { self.foods }
}

impl<S: Into<FoodId>> FromIterator<S> for DetectionResult {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut out = Self::new();
        for id in iter { out.insert(id); }
        out
    }
}

/// What an image capability returns: either free text (one caption or
/// several candidates already joined) or a list of controlled keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawSignal {
    Caption(String),
    Keywords(Vec<String>),
}

impl RawSignal {
    /// Join independently generated captions into a single caption so they
    /// are matched in one pass.
    pub fn from_candidates<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = candidates.into_iter().map(|c| c.as_ref().trim().to_string()).collect::<Vec<_>>().join(" ");
        RawSignal::Caption(joined)
    }

    /// Text shown to the user as the analysis hint.
    pub fn hint(&self) -> String {
        match self {
            RawSignal::Caption(text) => text.clone(),
            RawSignal::Keywords(words) => words.join(", "),
        }
    }
}
