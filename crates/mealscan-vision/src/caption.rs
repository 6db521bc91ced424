//! Local BLIP image captioning on candle.
//!
//! Expects a model directory with `model.safetensors` and `tokenizer.json` for
//! the large BLIP captioning checkpoint. Each image is captioned several times
//! with temperature sampling, one seed per candidate derived from the image
//! hash, and the candidates are joined into one lower-cased caption.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::blip;
use std::hash::Hasher;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info};
use twox_hash::XxHash64;

use mealscan_core::config::VisionSettings;
use mealscan_core::traits::ImageAnalyzer;
use mealscan_core::types::RawSignal;

use crate::device::select_device;
use crate::error::VisionError;

const IMAGE_SIZE: u32 = 384;
const BOS_TOKEN_ID: u32 = 30522;
const SEP_TOKEN_ID: u32 = 102;
const MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
const STD: [f32; 3] = [0.268_629_54, 0.261_302_6, 0.275_777_1];

#[derive(Debug, Clone)]
pub struct SamplingOptions {
    pub candidates: usize,
    pub max_tokens: usize,
    pub temperature: f64,
    pub repeat_penalty: f32,
}

impl SamplingOptions {
    pub fn from_settings(settings: &VisionSettings) -> Self {
        Self {
            candidates: settings.candidates.max(1),
            max_tokens: settings.max_tokens.max(1),
            temperature: settings.temperature,
            repeat_penalty: settings.repeat_penalty,
        }
    }
}

struct BlipModel {
    model: blip::BlipForConditionalGeneration,
    tokenizer: Tokenizer,
    device: Device,
}

pub struct BlipCaptioner {
    inner: Arc<Mutex<BlipModel>>,
    options: SamplingOptions,
}

impl BlipCaptioner {
    pub fn load(model_dir: &Path, options: SamplingOptions) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading BLIP captioning model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config = blip::Config::image_captioning_large();
        let weights_path = model_dir.join("model.safetensors");
        let weights = candle_core::safetensors::load(&weights_path, &device)
            .with_context(|| format!("Failed to read weights {}", weights_path.display()))?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = blip::BlipForConditionalGeneration::new(&config, vb)?;
        info!("BLIP model ready");

        Ok(Self { inner: Arc::new(Mutex::new(BlipModel { model, tokenizer, device })), options })
    }
}

#[async_trait]
impl ImageAnalyzer for BlipCaptioner {
    fn name(&self) -> &str { "blip" }

    async fn analyze(&self, image: &[u8]) -> Result<RawSignal> {
        let inner = Arc::clone(&self.inner);
        let options = self.options.clone();
        let bytes = image.to_vec();
        let captions = tokio::task::spawn_blocking(move || {
            let mut guard = inner.lock().map_err(|_| anyhow!("captioning model lock poisoned"))?;
            guard.caption_candidates(&bytes, &options)
        })
        .await??;
        Ok(RawSignal::from_candidates(captions))
    }
}

impl BlipModel {
    fn caption_candidates(&mut self, bytes: &[u8], options: &SamplingOptions) -> Result<Vec<String>> {
        let start = Instant::now();
        let pixels = preprocess(bytes)?.to_device(&self.device)?;
        let image_embeds = pixels.unsqueeze(0)?.apply(self.model.vision_model())?;
        let base_seed = image_seed(bytes);

        let mut captions = Vec::with_capacity(options.candidates);
        for index in 0..options.candidates {
            let seed = base_seed.wrapping_add(index as u64);
            let caption = self.sample_caption(&image_embeds, seed, options)?;
            debug!(index, caption = %caption, "caption candidate");
            captions.push(caption);
        }
        info!(candidates = captions.len(), elapsed_ms = start.elapsed().as_millis() as u64, "captioning finished");
        Ok(captions)
    }

    fn sample_caption(&mut self, image_embeds: &Tensor, seed: u64, options: &SamplingOptions) -> Result<String> {
        self.model.reset_kv_cache();
        let mut sampler = LogitsProcessor::new(seed, Some(options.temperature), None);
        let mut tokens = vec![BOS_TOKEN_ID];
        for index in 0..options.max_tokens {
            let context = if index > 0 { 1 } else { tokens.len() };
            let start = tokens.len().saturating_sub(context);
            let input_ids = Tensor::new(&tokens[start..], &self.device)?.unsqueeze(0)?;
            let logits = self.model.text_decoder().forward(&input_ids, image_embeds)?;
            let logits = logits.squeeze(0)?;
            let logits = logits.get(logits.dim(0)? - 1)?;
            let logits = if options.repeat_penalty == 1.0 {
                logits
            } else {
                candle_transformers::utils::apply_repeat_penalty(&logits, options.repeat_penalty, &tokens[1..])?
            };
            let token = sampler.sample(&logits)?;
            if token == SEP_TOKEN_ID { break; }
            tokens.push(token);
        }
        let text = self
            .tokenizer
            .decode(&tokens[1..], true)
            .map_err(|e| anyhow!("Failed to decode caption: {}", e))?;
        Ok(text.trim().to_lowercase())
    }
}

/// Decode, resize to 384x384 and normalize to a CHW f32 tensor.
pub fn preprocess(bytes: &[u8]) -> Result<Tensor, VisionError> {
    let img = image::load_from_memory(bytes)?
        .resize_to_fill(IMAGE_SIZE, IMAGE_SIZE, image::imageops::FilterType::Triangle)
        .to_rgb8();
    let size = IMAGE_SIZE as usize;
    let data = Tensor::from_vec(img.into_raw(), (size, size, 3), &Device::Cpu)?.permute((2, 0, 1))?;
    let mean = Tensor::new(&MEAN, &Device::Cpu)?.reshape((3, 1, 1))?;
    let std = Tensor::new(&STD, &Device::Cpu)?.reshape((3, 1, 1))?;
    let normalized = (data.to_dtype(DType::F32)? / 255.)?.broadcast_sub(&mean)?.broadcast_div(&std)?;
    Ok(normalized)
}

/// Stable per-image seed so the same photo yields the same candidates.
pub fn image_seed(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

/// `vision.model_dir`, or `APP_MODEL_DIR` when set and present.
pub fn resolve_model_dir(settings: &VisionSettings) -> PathBuf {
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() { return p; }
    }
    mealscan_core::config::expand_path(&settings.model_dir)
}
