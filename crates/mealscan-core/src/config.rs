//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys separated by `__`). Provides helpers to
//! expand `~` and `${VAR}` and to resolve relative paths against a base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::progress::{default_daily_target, DEFAULT_CEILING};
use crate::types::NutrientVector;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub catalog: CatalogSettings,
    pub targets: TargetSettings,
    pub matcher: MatcherSettings,
    pub vision: VisionSettings,
    pub store: StoreSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    pub path: String,
}

impl Default for CatalogSettings {
    fn default() -> Self { Self { path: "data/food_nutrition.csv".to_string() } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSettings {
    pub daily: NutrientVector,
    /// Display ceiling for percentages.
    pub ceiling: f64,
}

impl Default for TargetSettings {
    fn default() -> Self { Self { daily: default_daily_target(), ceiling: DEFAULT_CEILING } }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatcherSettings {
    /// Require keywords to stand as whole words instead of plain substrings.
    pub word_boundary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisionBackend {
    Local,
    Remote,
    #[default]
    Fake,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionSettings {
    pub backend: VisionBackend,
    pub model_dir: String,
    /// Number of sampled captions joined per image.
    pub candidates: usize,
    pub max_tokens: usize,
    pub temperature: f64,
    /// Penalty applied to tokens already emitted in a caption.
    pub repeat_penalty: f32,
    pub api_key: Option<String>,
    pub api_model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub retry: RetrySettings,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            backend: VisionBackend::default(),
            model_dir: "models/blip-image-captioning".to_string(),
            candidates: 8,
            max_tokens: 50,
            temperature: 0.9,
            repeat_penalty: 3.5,
            api_key: None,
            api_model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 60,
            retry: RetrySettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self { Self { max_attempts: 3, base_delay_ms: 500, max_delay_ms: 8000 } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Lance,
    Memory,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub uri: String,
    pub table: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { backend: StoreBackend::default(), uri: "data/records".to_string(), table: "meal_records".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    pub user_id: String,
}

impl Default for SessionSettings {
    fn default() -> Self { Self { user_id: "default_user".to_string() } }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self::from_figment(figment);
        config.validate()?;
        Ok(config)
    }

    /// Wrap an already assembled figment; defaults are layered underneath.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment) }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()).into())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let settings = self.settings()?;
        if !settings.targets.daily.is_valid() {
            return Err(Error::InvalidConfig("targets.daily must be finite and non-negative".to_string()).into());
        }
        if !(settings.targets.ceiling.is_finite() && settings.targets.ceiling > 0.0) {
            return Err(Error::InvalidConfig("targets.ceiling must be positive".to_string()).into());
        }
        if settings.vision.candidates == 0 {
            return Err(Error::InvalidConfig("vision.candidates must be at least 1".to_string()).into());
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
