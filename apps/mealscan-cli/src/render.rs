//! Plain-text rendering of reports, outcomes and history.
use std::collections::BTreeMap;

use mealscan_core::progress::ViewMode;
use mealscan_core::types::{MealRecord, MealType, Nutrient, NutrientVector};
use mealscan_pipeline::{DetectionOutcome, HistoryOutcome, ProgressReport, SaveOutcome};

const BAR_WIDTH: usize = 40;

pub const NO_CATALOG_FOODS: &str = "None of the selected foods are in the catalog. Nothing was calculated.";

fn amount(nutrient: Nutrient, value: f64) -> String {
    match nutrient {
        Nutrient::Calories => format!("{value:.0} {}", nutrient.unit()),
        _ => format!("{value:.1} {}", nutrient.unit()),
    }
}

pub fn metrics_line(n: &NutrientVector) -> String {
    Nutrient::ALL
        .iter()
        .map(|&k| format!("{} {}", k.label(), amount(k, n.get(k))))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// One bar per nutrient on a 0..ceiling axis with `|` at the 100% mark.
pub fn radar(report: &ProgressReport) -> String {
    let scale = |pct: f64| ((pct / report.ceiling) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64) as usize;
    let mark = scale(100.0);
    let mut out = String::new();
    for nutrient in Nutrient::ALL {
        let pct = report.percentages.get(nutrient);
        let fill = scale(pct);
        let bar: String = (0..=BAR_WIDTH)
            .map(|i| if i == mark { '|' } else if i < fill { '#' } else { '.' })
            .collect();
        out.push_str(&format!("{:<6} {bar} {pct:>5.1}%\n", nutrient.label()));
    }
    out
}

pub fn report(report: &ProgressReport) -> String {
    let heading = match (report.view, report.meal_type) {
        (ViewMode::Daily, _) => "Today's total vs daily target".to_string(),
        (ViewMode::LastMeal, Some(meal)) => format!("Last meal ({meal}) vs meal target"),
        (ViewMode::LastMeal, None) => "Last meal vs meal target".to_string(),
    };
    let mut out = format!("{heading}\n  {}\n\n", metrics_line(&report.current));
    out.push_str(&radar(report));
    out.push_str(&format!("\nAdvice: {}\n", report.advice.message()));
    for shortfall in &report.shortfalls {
        out.push_str(&format!("  {} is low, try: {}\n", shortfall.nutrient.label(), shortfall.suggestions.join(", ")));
    }
    out
}

pub fn detection(outcome: &DetectionOutcome) -> String {
    match outcome {
        DetectionOutcome::Detected { foods, hint } => format!("hint: {hint}\ndetected: {}", foods.join(", ")),
        DetectionOutcome::NoMatch { hint } => {
            format!("hint: {hint}\nNo known dish found. Pick foods manually (/options, /select).")
        }
        DetectionOutcome::Failed { message } => format!("Image analysis failed: {message}\nPick foods manually."),
        DetectionOutcome::Unavailable => "No image analyzer configured. Pick foods manually.".to_string(),
    }
}

pub fn save(outcome: &SaveOutcome) -> String {
    match outcome {
        SaveOutcome::Saved(record) => format!("Saved {} ({:.0} kcal).", record.meal_type, record.nutrients.calories),
        SaveOutcome::Disconnected => "Record store unavailable; the meal stays in this session only.".to_string(),
        SaveOutcome::NothingToSave => "Nothing to save. Calculate a meal first.".to_string(),
        SaveOutcome::Failed { message } => format!("Save failed: {message}\nThe meal is kept; run /save again."),
    }
}

pub fn history(outcome: &HistoryOutcome) -> String {
    match outcome {
        HistoryOutcome::Records(records) if records.is_empty() => "No saved meals yet.".to_string(),
        HistoryOutcome::Records(records) => history_lines(records),
        HistoryOutcome::Disconnected => "Record store unavailable.".to_string(),
        HistoryOutcome::Failed { message } => format!("Could not load history: {message}"),
    }
}

fn history_lines(records: &BTreeMap<MealType, MealRecord>) -> String {
    records
        .values()
        .map(|r| format!("{} {}  {}", r.created_at.format("%Y-%m-%d %H:%M"), r.meal_type, metrics_line(&r.nutrients)))
        .collect::<Vec<_>>()
        .join("\n")
}
