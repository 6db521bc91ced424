use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use mealscan_core::catalog::{CatalogSource, FoodCatalog};
use mealscan_core::progress::{AdviceCategory, ProgressEvaluator, ViewMode};
use mealscan_core::session::SessionContext;
use mealscan_core::traits::{ImageAnalyzer, RecordStore};
use mealscan_core::types::{FoodEntry, MealRecord, MealType, NutrientVector, RawSignal};
use mealscan_pipeline::{DetectionOutcome, HistoryOutcome, MealPipeline, SaveOutcome};
use mealscan_store::MemoryRecordStore;
use mealscan_text::FoodMatcher;

struct StaticAnalyzer(RawSignal);

#[async_trait]
impl ImageAnalyzer for StaticAnalyzer {
    fn name(&self) -> &str { "static" }
    async fn analyze(&self, _image: &[u8]) -> anyhow::Result<RawSignal> { Ok(self.0.clone()) }
}

struct BrokenAnalyzer;

#[async_trait]
impl ImageAnalyzer for BrokenAnalyzer {
    fn name(&self) -> &str { "broken" }
    async fn analyze(&self, _image: &[u8]) -> anyhow::Result<RawSignal> { Err(anyhow::anyhow!("quota exceeded")) }
}

/// Fails the first `fails` writes, then delegates to memory.
#[derive(Default)]
struct FlakyStore {
    fails: AtomicUsize,
    inner: MemoryRecordStore,
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn put(&self, user_id: &str, meal_type: MealType, nutrients: NutrientVector) -> anyhow::Result<MealRecord> {
        if self.fails.load(Ordering::SeqCst) > 0 {
            self.fails.fetch_sub(1, Ordering::SeqCst);
            return Err(anyhow::anyhow!("connection reset"));
        }
        self.inner.put(user_id, meal_type, nutrients).await
    }

    async fn list_all(&self, user_id: &str) -> anyhow::Result<Vec<MealRecord>> { self.inner.list_all(user_id).await }
}

fn catalog() -> Arc<FoodCatalog> {
    let rows = [
        ("ごはん", NutrientVector::new(168.0, 2.5, 0.3, 37.1)),
        ("卵", NutrientVector::new(76.0, 6.2, 5.2, 0.2)),
        ("鶏肉", NutrientVector::new(145.0, 23.0, 3.5, 0.0)),
        ("親子丼", NutrientVector::new(650.0, 28.0, 15.0, 95.0)),
    ];
    let entries = rows.into_iter().map(|(id, n)| FoodEntry { id: id.to_string(), nutrients: n });
    Arc::new(FoodCatalog::from_entries(entries, CatalogSource::Builtin { reason: "test".into() }))
}

fn pipeline() -> MealPipeline { MealPipeline::new(catalog(), FoodMatcher::default(), ProgressEvaluator::default()) }

fn caption(text: &str) -> Box<dyn ImageAnalyzer> { Box::new(StaticAnalyzer(RawSignal::Caption(text.into()))) }

#[tokio::test]
async fn detect_matches_caption_and_stores_detection() {
    let pipeline = pipeline().with_analyzer(caption("a bowl of rice with egg and chicken on top"));

    let (session, outcome) = pipeline.detect(SessionContext::new("u1"), b"jpeg").await;

    match outcome {
        DetectionOutcome::Detected { foods, hint } => {
            assert_eq!(foods, vec!["ごはん", "鶏肉", "卵", "親子丼"]);
            assert!(hint.contains("chicken"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(session.detected.len(), 4);
}

#[tokio::test]
async fn detect_without_match_falls_back_to_manual() {
    let pipeline = pipeline().with_analyzer(caption("a cat sitting on a sofa"));
    let (session, outcome) = pipeline.detect(SessionContext::new("u1"), b"jpeg").await;

    assert!(matches!(outcome, DetectionOutcome::NoMatch { .. }));
    assert!(session.detected.is_empty());
}

#[tokio::test]
async fn detect_failure_becomes_outcome_with_empty_result() {
    let pipeline = pipeline().with_analyzer(Box::new(BrokenAnalyzer));
    let session = SessionContext::new("u1").with_detection(["ごはん"].into_iter().collect());

    let (session, outcome) = pipeline.detect(session, b"jpeg").await;

    assert_eq!(outcome, DetectionOutcome::Failed { message: "quota exceeded".into() });
    assert!(session.detected.is_empty());
}

#[tokio::test]
async fn detect_without_analyzer_is_unavailable() {
    let (_, outcome) = pipeline().detect(SessionContext::new("u1"), b"jpeg").await;
    assert_eq!(outcome, DetectionOutcome::Unavailable);
}

#[tokio::test]
async fn keyword_signal_goes_through_containment_filter() {
    let signal = RawSignal::Keywords(vec!["鶏肉".into(), "カレーライス".into()]);
    let pipeline = pipeline().with_analyzer(Box::new(StaticAnalyzer(signal)));

    let (_, outcome) = pipeline.detect(SessionContext::new("u1"), b"jpeg").await;

    assert!(matches!(outcome, DetectionOutcome::Detected { ref foods, .. } if foods == &vec!["鶏肉".to_string()]));
}

#[test]
fn calculate_then_report_matches_rice_scenario() {
    let pipeline = pipeline();
    let (session, meal) = pipeline.calculate(SessionContext::new("u1"), &["ごはん", "ごはん"], MealType::Breakfast);

    assert_eq!(meal, Some(NutrientVector::new(168.0, 2.5, 0.3, 37.1)));
    assert_eq!(Some(session.daily_total), meal);

    let report = pipeline.report(&session);
    assert_eq!(report.view, ViewMode::Daily);
    assert!((report.percentages.calories - 8.4).abs() < 1e-9);
    assert!((report.percentages.fat - 0.6).abs() < 1e-9);
    assert_eq!(report.advice, AdviceCategory::ProteinLow);
    assert_eq!(report.ceiling, 120.0);
}

#[test]
fn last_meal_view_uses_meal_target_but_daily_advice() {
    let pipeline = pipeline();
    let session = SessionContext::new("u1");
    let (session, _) = pipeline.calculate(session, &["親子丼", "親子丼", "親子丼", "親子丼"], MealType::Lunch);
    let (session, _) = pipeline.calculate(session, &["卵"], MealType::Snack);
    let session = pipeline.toggle_view(session);

    let report = pipeline.report(&session);

    assert_eq!(report.view, ViewMode::LastMeal);
    assert_eq!(report.meal_type, Some(MealType::Snack));
    assert_eq!(report.current.calories, 76.0);
    assert!((report.target.calories - 200.0).abs() < 1e-9);
    // advice still judges the whole day: 726 kcal, 34.2 g protein, 95.2 g carbohydrates
    assert_eq!(report.advice, AdviceCategory::Balanced);
}

#[tokio::test]
async fn save_persists_pending_meal_once() {
    let pipeline = pipeline().with_store(Box::new(MemoryRecordStore::new()));
    let (session, meal) = pipeline.calculate(SessionContext::new("u1"), &["鶏肉"], MealType::Dinner);

    let (session, outcome) = pipeline.save(session).await;
    match outcome {
        SaveOutcome::Saved(record) => {
            assert_eq!(record.meal_type, MealType::Dinner);
            assert_eq!(Some(record.nutrients), meal);
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let (_, again) = pipeline.save(session).await;
    assert_eq!(again, SaveOutcome::NothingToSave);
}

#[tokio::test]
async fn failed_save_keeps_meal_for_retry() {
    let store = FlakyStore { fails: AtomicUsize::new(1), ..FlakyStore::default() };
    let pipeline = pipeline().with_store(Box::new(store));
    let (session, _) = pipeline.calculate(SessionContext::new("u1"), &["ごはん"], MealType::Lunch);

    let (session, outcome) = pipeline.save(session).await;
    assert_eq!(outcome, SaveOutcome::Failed { message: "connection reset".into() });
    assert!(session.pending_meal().is_some(), "meal stays pending");
    assert_eq!(session.daily_total.calories, 168.0, "day total is not rolled back");

    let (session, outcome) = pipeline.save(session).await;
    assert!(matches!(outcome, SaveOutcome::Saved(_)));
    assert!(session.pending_meal().is_none());
}

#[tokio::test]
async fn disconnected_store_reports_and_keeps_state() {
    let pipeline = pipeline();
    let (session, _) = pipeline.calculate(SessionContext::new("u1"), &["ごはん"], MealType::Lunch);

    let (session, outcome) = pipeline.save(session).await;
    assert_eq!(outcome, SaveOutcome::Disconnected);
    assert!(session.pending_meal().is_some());
    assert_eq!(pipeline.history(&session).await, HistoryOutcome::Disconnected);
}

#[tokio::test]
async fn history_shows_latest_record_per_meal_type() {
    let store = MemoryRecordStore::new();
    store.put("u1", MealType::Breakfast, NutrientVector::new(300.0, 0.0, 0.0, 0.0)).await.expect("put");
    store.put("u1", MealType::Breakfast, NutrientVector::new(450.0, 0.0, 0.0, 0.0)).await.expect("put");
    store.put("u1", MealType::Lunch, NutrientVector::new(600.0, 0.0, 0.0, 0.0)).await.expect("put");
    let pipeline = pipeline().with_store(Box::new(store));

    let HistoryOutcome::Records(latest) = pipeline.history(&SessionContext::new("u1")).await else {
        panic!("expected records");
    };
    assert_eq!(latest.len(), 2);
    assert!(latest[&MealType::Breakfast].nutrients.calories >= 300.0);
    assert_eq!(latest[&MealType::Lunch].nutrients.calories, 600.0);
}

#[tokio::test]
async fn restore_day_sums_only_that_days_records() {
    let store = MemoryRecordStore::new();
    store.put("u1", MealType::Breakfast, NutrientVector::new(300.0, 10.0, 5.0, 40.0)).await.expect("put");
    store.put("u1", MealType::Lunch, NutrientVector::new(600.0, 20.0, 15.0, 80.0)).await.expect("put");
    let pipeline = pipeline().with_store(Box::new(store));

    let today = Utc::now().date_naive();
    let (session, _) = pipeline.restore_day(SessionContext::new("u1"), today).await;
    assert_eq!(session.daily_total, NutrientVector::new(900.0, 30.0, 20.0, 120.0));

    let yesterday = today - Duration::days(1);
    let (session, _) = pipeline.restore_day(SessionContext::new("u1"), yesterday).await;
    assert_eq!(session.daily_total, NutrientVector::ZERO);
}

#[tokio::test]
async fn selection_without_catalog_foods_is_not_recorded() {
    let pipeline = pipeline().with_store(Box::new(MemoryRecordStore::new()));
    let (session, _) = pipeline.calculate(SessionContext::new("u1"), &["ごはん"], MealType::Lunch);
    let (session, _) = pipeline.save(session).await;

    let (session, meal) = pipeline.calculate(session, &["foo", "カレーパン"], MealType::Lunch);

    assert_eq!(meal, None);
    assert_eq!(session.daily_total.calories, 168.0);
    assert!(session.pending_meal().is_none(), "nothing waits to be saved");
    let (session, outcome) = pipeline.save(session).await;
    assert_eq!(outcome, SaveOutcome::NothingToSave);

    let HistoryOutcome::Records(latest) = pipeline.history(&session).await else { panic!("expected records") };
    assert_eq!(latest[&MealType::Lunch].nutrients.calories, 168.0, "real lunch is not replaced by zeros");
}

#[test]
fn reset_clears_day_but_keeps_user() {
    let pipeline = pipeline();
    let (session, _) = pipeline.calculate(SessionContext::new("u1"), &["ごはん"], MealType::Lunch);
    let session = pipeline.reset_day(session);

    assert_eq!(session.daily_total, NutrientVector::ZERO);
    assert_eq!(session.user_id, "u1");
    assert_eq!(pipeline.report(&session).advice, AdviceCategory::NoDataYet);
}

#[test]
fn manual_options_come_from_catalog() {
    let options = pipeline().manual_options(&["昼食・夕食"]);
    assert!(options.contains(&"親子丼".to_string()));
    assert!(options.iter().all(|o| pipeline().catalog().contains(o)));
}
