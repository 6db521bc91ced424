use mealscan_core::catalog::{CatalogSource, FoodCatalog};
use mealscan_core::types::{FoodEntry, NutrientVector, RawSignal};
use mealscan_text::{contains_word, CompoundRule, FoodMatcher};

fn catalog(ids: &[&str]) -> FoodCatalog {
    let entries = ids
        .iter()
        .map(|id| FoodEntry { id: id.to_string(), nutrients: NutrientVector::new(100.0, 1.0, 1.0, 1.0) });
    FoodCatalog::from_entries(entries, CatalogSource::Builtin { reason: "test".into() })
}

#[test]
fn caption_scan_is_case_insensitive_and_catalog_bound() {
    let catalog = catalog(&["ごはん", "鶏肉", "ブロッコリー"]);
    let matcher = FoodMatcher::default();

    let result = matcher.match_text("A plate of Rice, grilled CHICKEN and a banana", &catalog);

    // banana maps to バナナ which is absent from this catalog
    assert_eq!(result.foods(), &["ごはん".to_string(), "鶏肉".to_string()]);
}

#[test]
fn no_keyword_yields_empty_result() {
    let catalog = catalog(&["ごはん"]);
    let result = FoodMatcher::default().match_text("a wooden table next to a window", &catalog);
    assert!(result.is_empty());
}

#[test]
fn matching_is_idempotent() {
    let catalog = catalog(&["ごはん", "卵", "鶏肉", "親子丼"]);
    let matcher = FoodMatcher::default();
    let text = "a bowl of rice with egg and chicken on top";
    assert_eq!(matcher.match_text(text, &catalog), matcher.match_text(text, &catalog));
}

#[test]
fn compound_rule_adds_dish_named_by_no_single_keyword() {
    let target = "rice-bowl-with-chicken-and-egg";
    let rule = CompoundRule::new(&[&["rice", "bowl"], &["egg"], &["chicken", "meat"]], target);
    let matcher = FoodMatcher::new(vec![("rice".into(), "rice".into())], vec![rule]);
    let catalog = catalog(&["rice", target]);

    let result = matcher.match_text("a bowl of rice with egg and chicken on top", &catalog);

    assert!(result.contains(target));
    assert!(result.contains("rice"));
    assert_eq!(result.len(), 2);
}

#[test]
fn compound_rule_requires_every_group_and_catalog_presence() {
    let matcher = FoodMatcher::default();

    let with_dish = catalog(&["親子丼", "カツ丼"]);
    let result = matcher.match_text("rice bowl topped with egg and pork cutlet", &with_dish);
    assert!(result.contains("カツ丼"));
    assert!(!result.contains("親子丼"), "no chicken or meat keyword");

    let missing_group = matcher.match_text("a bowl of rice with chicken", &with_dish);
    assert!(missing_group.is_empty(), "egg group unsatisfied");

    let without_dish = catalog(&["ごはん"]);
    let result = matcher.match_text("a bowl of rice with egg and chicken", &without_dish);
    assert!(!result.contains("親子丼"), "dish absent from catalog is never added");
}

#[test]
fn substring_matching_accepts_embedded_keywords() {
    let catalog = catalog(&["卵"]);
    let permissive = FoodMatcher::default();
    assert!(permissive.match_text("roasted eggplant slices", &catalog).contains("卵"));

    let strict = FoodMatcher::default().with_word_boundary(true);
    assert!(strict.match_text("roasted eggplant slices", &catalog).is_empty());
    assert!(strict.match_text("two fried eggs", &catalog).contains("卵"));
}

#[test]
fn word_boundary_helper() {
    assert!(contains_word("a ripe tomato.", "tomato"));
    assert!(contains_word("sliced tomatoes", "tomato"));
    assert!(!contains_word("pineapple", "apple"));
    assert!(contains_word("ice cream cone", "ice cream"));
}

#[test]
fn candidates_are_joined_before_matching() {
    let catalog = catalog(&["ごはん", "卵", "鶏肉", "親子丼"]);
    let matcher = FoodMatcher::default();

    // no single candidate satisfies the compound rule on its own
    let candidates = ["a bowl of rice", "an egg on top", "pieces of chicken"];
    let result = matcher.match_candidates(candidates, &catalog);

    assert!(result.contains("親子丼"));
    assert_eq!(result.len(), 4);
}

#[test]
fn keyword_signal_is_a_containment_filter() {
    let catalog = catalog(&["ごはん", "味噌汁"]);
    let signal = RawSignal::Keywords(vec![" ごはん".into(), "味噌汁 ".into(), "ラーメン".into(), "ごはん".into()]);

    let result = FoodMatcher::default().match_signal(&signal, &catalog);

    assert_eq!(result.foods(), &["ごはん".to_string(), "味噌汁".to_string()]);
}
