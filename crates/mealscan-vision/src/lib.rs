//! mealscan-vision
//!
//! Image capability implementations behind [`ImageAnalyzer`]: a local BLIP
//! captioner, a remote keyword vision API with bounded retry, and a fake
//! analyzer for tests and offline runs.
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use mealscan_core::config::{VisionBackend, VisionSettings};
use mealscan_core::traits::ImageAnalyzer;
use mealscan_core::types::RawSignal;

pub mod caption;
pub mod device;
pub mod error;
pub mod remote;
pub mod retry;

pub use caption::{BlipCaptioner, SamplingOptions};
pub use error::VisionError;
pub use remote::RemoteAnalyzer;
pub use retry::RetryPolicy;

/// Reads the "image" as UTF-8 text and returns it as the caption.
pub struct FakeAnalyzer;

#[async_trait]
impl ImageAnalyzer for FakeAnalyzer {
    fn name(&self) -> &str { "fake" }

    async fn analyze(&self, image: &[u8]) -> Result<RawSignal> {
        Ok(RawSignal::Caption(String::from_utf8_lossy(image).trim().to_lowercase()))
    }
}

fn fake_forced() -> bool {
    std::env::var("APP_USE_FAKE_VISION")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the configured analyzer. `vocabulary` is the catalog identifier list
/// offered to vocabulary-constrained backends.
pub fn get_default_analyzer(settings: &VisionSettings, vocabulary: &[String]) -> Result<Box<dyn ImageAnalyzer>> {
    if fake_forced() || settings.backend == VisionBackend::Fake {
        info!("using fake image analyzer");
        return Ok(Box::new(FakeAnalyzer));
    }
    match settings.backend {
        VisionBackend::Local => {
            let dir = caption::resolve_model_dir(settings);
            Ok(Box::new(BlipCaptioner::load(&dir, SamplingOptions::from_settings(settings))?))
        }
        VisionBackend::Remote => {
            info!(model = %settings.api_model, "using remote vision API");
            Ok(Box::new(RemoteAnalyzer::new(settings, vocabulary.to_vec())?))
        }
        VisionBackend::Fake => Ok(Box::new(FakeAnalyzer)),
    }
}
