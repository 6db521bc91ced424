//! mealscan-text
//!
//! Turns image-analysis text into catalog identifiers. See `matcher` for the
//! scan and `keywords` for the built-in hint table and compound-dish rules.
pub mod keywords;
pub mod matcher;

pub use keywords::{default_rules, CompoundRule, KEYWORD_TABLE};
pub use matcher::{contains_word, FoodMatcher};
