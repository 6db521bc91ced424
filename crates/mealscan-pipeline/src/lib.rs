//! mealscan-pipeline
//!
//! Per-action pipeline: image -> analyzer -> matcher -> selection ->
//! aggregation -> evaluation -> record store. Every operation takes the
//! session by value and hands back the next one with an outcome. Failures at
//! the analyzer or store boundary become outcomes with a message and a safe
//! fallback state; they never abort the session.
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use mealscan_core::catalog::FoodCatalog;
use mealscan_core::categories::manual_options;
use mealscan_core::config::{resolve_with_base, Settings};
use mealscan_core::history::latest_per_meal_type;
use mealscan_core::nutrition::{dedup_selection, sum_foods};
use mealscan_core::progress::{advise, AdviceCategory, Percentages, ProgressEvaluator, Shortfall, ViewMode};
use mealscan_core::session::SessionContext;
use mealscan_core::traits::{ImageAnalyzer, RecordStore};
use mealscan_core::types::{DetectionResult, FoodId, MealRecord, MealType, NutrientVector};
use mealscan_text::FoodMatcher;

#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    Detected { foods: Vec<FoodId>, hint: String },
    /// Nothing recognized; the user picks foods manually.
    NoMatch { hint: String },
    Failed { message: String },
    /// No image analyzer is configured.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(MealRecord),
    Disconnected,
    NothingToSave,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOutcome {
    Records(BTreeMap<MealType, MealRecord>),
    Disconnected,
    Failed { message: String },
}

/// What the chart shows for the current view, plus advice for the whole day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub view: ViewMode,
    pub meal_type: Option<MealType>,
    pub current: NutrientVector,
    pub target: NutrientVector,
    pub percentages: Percentages,
    pub ceiling: f64,
    pub advice: AdviceCategory,
    pub shortfalls: Vec<Shortfall>,
}

pub struct MealPipeline {
    catalog: Arc<FoodCatalog>,
    matcher: FoodMatcher,
    evaluator: ProgressEvaluator,
    analyzer: Option<Box<dyn ImageAnalyzer>>,
    store: Option<Box<dyn RecordStore>>,
}

impl MealPipeline {
    pub fn new(catalog: Arc<FoodCatalog>, matcher: FoodMatcher, evaluator: ProgressEvaluator) -> Self {
        Self { catalog, matcher, evaluator, analyzer: None, store: None }
    }

    pub fn with_analyzer(mut self, analyzer: Box<dyn ImageAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_store(mut self, store: Box<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Load the catalog once and wire the configured analyzer and store.
    /// Relative paths resolve against `base`. An analyzer or store that cannot
    /// be created is left out and the pipeline runs without it.
    pub async fn from_settings(settings: &Settings, base: &Path) -> Self {
        let catalog = Arc::new(FoodCatalog::load(&resolve_with_base(base, &settings.catalog.path)));
        let matcher = FoodMatcher::from_settings(&settings.matcher);
        let evaluator = ProgressEvaluator::new(settings.targets.daily, settings.targets.ceiling);
        let mut pipeline = Self::new(Arc::clone(&catalog), matcher, evaluator);

        match mealscan_vision::get_default_analyzer(&settings.vision, catalog.all_identifiers()) {
            Ok(analyzer) => pipeline = pipeline.with_analyzer(analyzer),
            Err(e) => warn!(error = %e, "image analysis unavailable, manual selection only"),
        }
        if let Some(store) = mealscan_store::open_store(&settings.store).await {
            pipeline = pipeline.with_store(store);
        }
        pipeline
    }

    pub fn catalog(&self) -> &FoodCatalog { &self.catalog }
    pub fn evaluator(&self) -> &ProgressEvaluator { &self.evaluator }
    pub fn analyzer_name(&self) -> Option<&str> { self.analyzer.as_deref().map(|a| a.name()) }
    pub fn is_connected(&self) -> bool { self.store.is_some() }

    /// Foods offered for manual selection, filtered by category.
    pub fn manual_options<S: AsRef<str>>(&self, categories: &[S]) -> Vec<String> {
        manual_options(categories, &self.catalog)
    }

    pub async fn detect(&self, session: SessionContext, image: &[u8]) -> (SessionContext, DetectionOutcome) {
        let Some(analyzer) = self.analyzer.as_deref() else {
            return (session.with_detection(DetectionResult::new()), DetectionOutcome::Unavailable);
        };
        match analyzer.analyze(image).await {
            Ok(signal) => {
                let detected = self.matcher.match_signal(&signal, &self.catalog);
                let hint = signal.hint();
                info!(analyzer = analyzer.name(), foods = detected.len(), "detection finished");
                let outcome = if detected.is_empty() {
                    DetectionOutcome::NoMatch { hint }
                } else {
                    DetectionOutcome::Detected { foods: detected.foods().to_vec(), hint }
                };
                (session.with_detection(detected), outcome)
            }
            Err(e) => {
                warn!(analyzer = analyzer.name(), error = %e, "image analysis failed");
                (session.with_detection(DetectionResult::new()), DetectionOutcome::Failed { message: e.to_string() })
            }
        }
    }

    /// Sum the de-duplicated selection and fold it into the day. A selection
    /// with no catalog food returns `None` and leaves the session as it was.
    pub fn calculate<S: AsRef<str>>(
        &self,
        session: SessionContext,
        selection: &[S],
        meal_type: MealType,
    ) -> (SessionContext, Option<NutrientVector>) {
        let selection = dedup_selection(selection);
        if !selection.iter().any(|id| self.catalog.contains(id)) {
            warn!(meal = %meal_type, foods = selection.len(), "no selected food is in the catalog");
            return (session, None);
        }
        let meal = sum_foods(&selection, &self.catalog);
        info!(meal = %meal_type, foods = selection.len(), calories = meal.calories, "meal calculated");
        (session.add_meal(meal_type, meal), Some(meal))
    }

    /// Persist the pending meal. On failure the meal stays pending so the
    /// caller may retry without recalculating.
    pub async fn save(&self, session: SessionContext) -> (SessionContext, SaveOutcome) {
        let Some((meal_type, nutrients)) = session.pending_meal() else {
            return (session, SaveOutcome::NothingToSave);
        };
        let Some(store) = self.store.as_deref() else {
            return (session, SaveOutcome::Disconnected);
        };
        match store.put(&session.user_id, meal_type, nutrients).await {
            Ok(record) => {
                info!(user = %session.user_id, meal = %meal_type, "meal record saved");
                (session.mark_saved(), SaveOutcome::Saved(record))
            }
            Err(e) => {
                warn!(user = %session.user_id, error = %e, "saving meal record failed");
                (session, SaveOutcome::Failed { message: e.to_string() })
            }
        }
    }

    /// Newest record per meal type for the session's user.
    pub async fn history(&self, session: &SessionContext) -> HistoryOutcome {
        match self.load_records(&session.user_id).await {
            Ok(Some(records)) => HistoryOutcome::Records(latest_per_meal_type(records)),
            Ok(None) => HistoryOutcome::Disconnected,
            Err(message) => HistoryOutcome::Failed { message },
        }
    }

    /// Rebuild the day total from records stored on `day`. The session is
    /// returned unchanged when the store is missing or fails.
    pub async fn restore_day(&self, session: SessionContext, day: NaiveDate) -> (SessionContext, HistoryOutcome) {
        match self.load_records(&session.user_id).await {
            Ok(Some(records)) => {
                let todays: Vec<MealRecord> = records.into_iter().filter(|r| r.created_at.date_naive() == day).collect();
                let session = session.with_restored_total(todays.iter().map(|r| r.nutrients));
                (session, HistoryOutcome::Records(latest_per_meal_type(todays)))
            }
            Ok(None) => (session, HistoryOutcome::Disconnected),
            Err(message) => (session, HistoryOutcome::Failed { message }),
        }
    }

    pub fn report(&self, session: &SessionContext) -> ProgressReport {
        let current = session.view_totals();
        let target = self.evaluator.target_for(session.view, session.last_meal_type);
        ProgressReport {
            view: session.view,
            meal_type: session.last_meal_type,
            current,
            target,
            percentages: self.evaluator.percentages(&current, &target),
            ceiling: self.evaluator.ceiling,
            advice: advise(&session.daily_total, &self.evaluator.daily_target),
            shortfalls: self.evaluator.shortfalls(&current, &target),
        }
    }

    pub fn reset_day(&self, session: SessionContext) -> SessionContext {
        info!(user = %session.user_id, "daily totals reset");
        session.reset_day()
    }

    pub fn toggle_view(&self, session: SessionContext) -> SessionContext { session.toggle_view() }

    async fn load_records(&self, user_id: &str) -> Result<Option<Vec<MealRecord>>, String> {
        let Some(store) = self.store.as_deref() else { return Ok(None) };
        store.list_all(user_id).await.map(Some).map_err(|e| {
            warn!(user = user_id, error = %e, "loading meal records failed");
            e.to_string()
        })
    }
}
