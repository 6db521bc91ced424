//! Caption/keyword to catalog identifier matching.
//!
//! Captions go through a permissive scan: a keyword hits when it occurs
//! anywhere in the lower-cased text, so "egg" also fires inside "eggplant".
//! Whole-word matching is available through [`FoodMatcher::with_word_boundary`].
//! Keyword lists from a vocabulary-constrained service are only filtered
//! against the catalog.
use tracing::debug;

use mealscan_core::catalog::FoodCatalog;
use mealscan_core::config::MatcherSettings;
use mealscan_core::types::{DetectionResult, RawSignal};

use crate::keywords::{default_rules, CompoundRule, KEYWORD_TABLE};

#[derive(Debug, Clone)]
pub struct FoodMatcher {
    keywords: Vec<(String, String)>,
    rules: Vec<CompoundRule>,
    word_boundary: bool,
}

impl Default for FoodMatcher {
    fn default() -> Self {
        let keywords = KEYWORD_TABLE.iter().map(|(k, id)| (k.to_string(), id.to_string())).collect();
        Self::new(keywords, default_rules())
    }
}

impl FoodMatcher {
    /// Custom keyword table (keyword, identifier) and compound rules.
    pub fn new(keywords: Vec<(String, String)>, rules: Vec<CompoundRule>) -> Self {
        let keywords = keywords.into_iter().map(|(k, id)| (k.to_lowercase(), id)).collect();
        Self { keywords, rules, word_boundary: false }
    }

    pub fn from_settings(settings: &MatcherSettings) -> Self {
        Self::default().with_word_boundary(settings.word_boundary)
    }

    pub fn with_word_boundary(mut self, enabled: bool) -> Self {
        self.word_boundary = enabled;
        self
    }

    pub fn match_signal(&self, signal: &RawSignal, catalog: &FoodCatalog) -> DetectionResult {
        match signal {
            RawSignal::Caption(text) => self.match_text(text, catalog),
            RawSignal::Keywords(words) => filter_keywords(words, catalog),
        }
    }

    /// Scan one caption, then apply the compound rules.
    pub fn match_text(&self, text: &str, catalog: &FoodCatalog) -> DetectionResult {
        let text = text.to_lowercase();
        let present = |keyword: &str| self.occurs(&text, keyword);
        let mut result = DetectionResult::new();

        for (keyword, id) in &self.keywords {
            if present(keyword) && catalog.contains(id) && result.insert(id.as_str()) {
                debug!(keyword = %keyword, food = %id, "keyword hit");
            }
        }
        for rule in &self.rules {
            if catalog.contains(&rule.target) && rule.applies(present) && result.insert(rule.target.as_str()) {
                debug!(food = %rule.target, "compound rule hit");
            }
        }
        result
    }

    /// Several captions for the same image are joined and scanned once.
    pub fn match_candidates<I, S>(&self, candidates: I, catalog: &FoodCatalog) -> DetectionResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.match_signal(&RawSignal::from_candidates(candidates), catalog)
    }

    fn occurs(&self, text: &str, keyword: &str) -> bool {
        if keyword.is_empty() { return false; }
        if self.word_boundary { contains_word(text, keyword) } else { text.contains(keyword) }
    }
}

/// Keep the words that are catalog identifiers, in the order given.
fn filter_keywords(words: &[String], catalog: &FoodCatalog) -> DetectionResult {
    words.iter().map(|w| w.trim()).filter(|w| catalog.contains(w)).collect()
}

/// Whole-word occurrence. A trailing plural "s" or "es" still counts as the word.
pub fn contains_word(text: &str, keyword: &str) -> bool {
    text.match_indices(keyword).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let rest = &text[start + keyword.len()..];
        let rest = rest.strip_prefix("es").or_else(|| rest.strip_prefix('s')).filter(|r| !starts_with_word_char(r)).unwrap_or(rest);
        !before.is_some_and(char::is_alphanumeric) && !starts_with_word_char(rest)
    })
}

fn starts_with_word_char(s: &str) -> bool { s.chars().next().is_some_and(char::is_alphanumeric) }
