//! Remote vision API returning a vocabulary-constrained keyword list.
//!
//! The request carries the catalog vocabulary in the prompt and the image as
//! inline base64 data (Gemini `generateContent` shape). The model answers with
//! a comma-separated list which is split into [`RawSignal::Keywords`].
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use mealscan_core::config::VisionSettings;
use mealscan_core::traits::ImageAnalyzer;
use mealscan_core::types::RawSignal;

use crate::error::VisionError;
use crate::retry::RetryPolicy;

/// Environment variable consulted when `vision.api_key` is unset.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub struct RemoteAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    vocabulary: Vec<String>,
    policy: RetryPolicy,
}

impl RemoteAnalyzer {
    pub fn new(settings: &VisionSettings, vocabulary: Vec<String>) -> Result<Self, VisionError> {
        let api_key = settings
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or(VisionError::MissingApiKey)?;
        let client = reqwest::Client::builder().timeout(Duration::from_secs(settings.timeout_secs)).build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.api_model.clone(),
            api_key,
            vocabulary,
            policy: RetryPolicy::from_settings(&settings.retry),
        })
    }

    pub fn prompt(&self) -> String {
        format!(
            "Identify the foods in this image.\n\
             Answer with a comma-separated list using only names from the list below.\n\
             Ignore anything that is not in the list.\n\n\
             List: {}",
            self.vocabulary.join(", ")
        )
    }

    fn url(&self) -> String { format!("{}/models/{}:generateContent", self.endpoint, self.model) }

    async fn generate(&self, image: &[u8]) -> Result<String, VisionError> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": self.prompt() },
                    { "inline_data": {
                        "mime_type": sniff_mime(image),
                        "data": base64::engine::general_purpose::STANDARD.encode(image),
                    } }
                ]
            }]
        });
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Status { status: status.as_u16(), body });
        }
        let parsed: GenerateResponse = response.json().await.map_err(|e| VisionError::Malformed(e.to_string()))?;
        parsed.text().ok_or_else(|| VisionError::Malformed("response has no text part".to_string()))
    }
}

#[async_trait]
impl ImageAnalyzer for RemoteAnalyzer {
    fn name(&self) -> &str { &self.model }

    async fn analyze(&self, image: &[u8]) -> anyhow::Result<RawSignal> {
        let text = self.policy.retry(|| self.generate(image)).await?;
        debug!(response = %text, "vision response");
        let keywords = parse_keywords(&text);
        info!(model = %self.model, keywords = keywords.len(), "remote analysis finished");
        Ok(RawSignal::Keywords(keywords))
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text parts of the first candidate, concatenated.
    fn text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

/// Split a comma-separated answer (ASCII `,` or `、`), dropping blanks.
pub fn parse_keywords(text: &str) -> Vec<String> {
    text.split([',', '、', '\n'])
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn sniff_mime(image: &[u8]) -> &'static str {
    match image {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        _ => "image/jpeg",
    }
}
