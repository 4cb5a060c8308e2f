//! Configuration types for a transcription run.
//!
//! All run behaviour is controlled through [`RunConfig`], built via its
//! [`RunConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to thread the same configuration through the renderer, extractor,
//! batcher, and corrector without any ambient global state, and to diff two
//! runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::ShuddhiError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for one document transcription run.
///
/// Built via [`RunConfig::builder()`] or using [`RunConfig::default()`].
///
/// # Example
/// ```rust
/// use shuddhi::{CorrectionProvider, RunConfig};
///
/// let config = RunConfig::builder()
///     .provider(CorrectionProvider::OpenRouter)
///     .max_batch_chars(1500)
///     .max_retries(3)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Directory that receives the rendered page images (`page_NNN.png`).
    /// Created if absent. Default: `pdf_pages`.
    pub image_dir: PathBuf,

    /// Path of the raw-text artifact: per-page OCR output joined by blank
    /// lines, written once after extraction. Default: `raw_ocr.txt`.
    ///
    /// This file is the recovery point between the OCR and correction
    /// stages. A rerun with [`resume`](RunConfigBuilder::resume) enabled
    /// reads it back instead of re-rendering and re-OCRing the document.
    pub raw_text_path: PathBuf,

    /// Path of the corrected-output artifact. Append-only during a run.
    /// Default: `corrected.txt`.
    pub corrected_path: PathBuf,

    /// Which OCR engine extracts text from the page images. Default: Tesseract.
    pub ocr_backend: OcrBackend,

    /// Tesseract language string. Default: `san+hin`.
    ///
    /// Tesseract has no Pali traineddata; Sanskrit plus Hindi covers the
    /// Devanagari glyph inventory these texts actually use.
    pub ocr_languages: String,

    /// API key for the Google Vision backend. Falls back to the
    /// `GOOGLE_VISION_API_KEY` environment variable when unset.
    pub vision_api_key: Option<String>,

    /// Which correction service repairs the OCR output. Default: OpenAI.
    pub provider: CorrectionProvider,

    /// API key for the correction provider. Falls back to
    /// `OPENAI_API_KEY` / `OPENROUTER_API_KEY` when unset.
    pub api_key: Option<String>,

    /// Model identifier sent to the correction provider.
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// Maximum batch size in characters (Unicode scalars, not bytes).
    /// Default: 1500.
    ///
    /// A soft target: paragraphs are never split, so a single paragraph
    /// longer than this is still submitted whole. 1500 chars of Devanagari
    /// keeps each request comfortably inside model context while leaving
    /// the model enough surrounding text to disambiguate conjuncts.
    pub max_batch_chars: usize,

    /// Total correction attempts per batch before it is recorded as failed.
    /// Default: 3.
    pub max_retries: u32,

    /// Fixed wait between attempts on the same batch, in milliseconds.
    /// Default: 2000.
    ///
    /// Fixed rather than exponential: calls are strictly sequential, so
    /// there is no thundering herd to spread out, and the dominant failure
    /// mode (per-key rate limiting) clears on a constant horizon.
    pub retry_delay_ms: u64,

    /// Fixed wait between successive successful batches, in milliseconds.
    /// Default: 1000. Rate-limiting courtesy to the correction service.
    pub request_delay_ms: u64,

    /// Per-attempt timeout on the correction call, in seconds. Default: 30.
    ///
    /// Mandatory: a hung network call must not block the pipeline
    /// indefinitely. The timeout bounds one attempt, not the whole batch.
    pub api_timeout_secs: u64,

    /// Sampling temperature for the correction completion. Default: 0.2.
    ///
    /// Low temperature keeps the model faithful to the scanned text.
    /// Higher values introduce creativity that rewrites rather than repairs.
    pub temperature: f32,

    /// Rendering DPI used when rasterising each page. Range: 72–400.
    /// Default: 300.
    ///
    /// Devanagari conjunct ligatures collapse into blobs below ~200 DPI on
    /// typical scans, so the default is higher than a latin-script pipeline
    /// would pick.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels.
    /// Default: 3000. Caps memory regardless of physical page size.
    pub max_rendered_pixels: u32,

    /// Override of the fixed correction instruction. If None, uses
    /// [`crate::prompts::CORRECTION_INSTRUCTION`].
    pub instruction: Option<String>,

    /// Append-continue behaviour for reruns. Default: true.
    ///
    /// When enabled, a non-empty raw-text artifact skips rendering and OCR,
    /// and batches already present in the output artifact are not
    /// re-corrected (counted via
    /// [`crate::pipeline::correct::completed_batch_count`]). The count
    /// aligns with batch indices only if the previous run had no failed
    /// batches; after failures, disable resume to rebuild the artifact
    /// from scratch.
    pub resume: bool,

    /// Observer for per-page and per-batch events. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("pdf_pages"),
            raw_text_path: PathBuf::from("raw_ocr.txt"),
            corrected_path: PathBuf::from("corrected.txt"),
            ocr_backend: OcrBackend::default(),
            ocr_languages: "san+hin".to_string(),
            vision_api_key: None,
            provider: CorrectionProvider::default(),
            api_key: None,
            model: None,
            max_batch_chars: 1500,
            max_retries: 3,
            retry_delay_ms: 2000,
            request_delay_ms: 1000,
            api_timeout_secs: 30,
            temperature: 0.2,
            dpi: 300,
            max_rendered_pixels: 3000,
            instruction: None,
            resume: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("image_dir", &self.image_dir)
            .field("raw_text_path", &self.raw_text_path)
            .field("corrected_path", &self.corrected_path)
            .field("ocr_backend", &self.ocr_backend)
            .field("ocr_languages", &self.ocr_languages)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("max_batch_chars", &self.max_batch_chars)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("request_delay_ms", &self.request_delay_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("temperature", &self.temperature)
            .field("dpi", &self.dpi)
            .field("resume", &self.resume)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.image_dir = dir.into();
        self
    }

    pub fn raw_text_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.raw_text_path = path.into();
        self
    }

    pub fn corrected_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.corrected_path = path.into();
        self
    }

    pub fn ocr_backend(mut self, backend: OcrBackend) -> Self {
        self.config.ocr_backend = backend;
        self
    }

    pub fn ocr_languages(mut self, langs: impl Into<String>) -> Self {
        self.config.ocr_languages = langs.into();
        self
    }

    pub fn vision_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.vision_api_key = Some(key.into());
        self
    }

    pub fn provider(mut self, provider: CorrectionProvider) -> Self {
        self.config.provider = provider;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn max_batch_chars(mut self, n: usize) -> Self {
        self.config.max_batch_chars = n.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.max(1);
        self
    }

    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry_delay_ms = ms;
        self
    }

    pub fn request_delay_ms(mut self, ms: u64) -> Self {
        self.config.request_delay_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn instruction(mut self, text: impl Into<String>) -> Self {
        self.config.instruction = Some(text.into());
        self
    }

    pub fn resume(mut self, v: bool) -> Self {
        self.config.resume = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, ShuddhiError> {
        let c = &self.config;
        if c.max_batch_chars == 0 {
            return Err(ShuddhiError::InvalidConfig(
                "max_batch_chars must be ≥ 1".into(),
            ));
        }
        if c.max_retries == 0 {
            return Err(ShuddhiError::InvalidConfig(
                "max_retries must be ≥ 1".into(),
            ));
        }
        if c.raw_text_path == c.corrected_path {
            return Err(ShuddhiError::InvalidConfig(format!(
                "raw_text_path and corrected_path must differ, both are '{}'",
                c.raw_text_path.display()
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which OCR engine turns page images into raw text.
///
/// A static configuration choice, not runtime-dynamic dispatch: exactly one
/// backend is constructed per run, behind [`crate::ocr::TextExtractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrBackend {
    /// Local Tesseract binary (`tesseract <img> stdout -l san+hin`). (default)
    #[default]
    Tesseract,
    /// Google Cloud Vision `DOCUMENT_TEXT_DETECTION`.
    GoogleVision,
}

impl OcrBackend {
    /// Stable lowercase name used in logs and error hints.
    pub fn name(&self) -> &'static str {
        match self {
            OcrBackend::Tesseract => "tesseract",
            OcrBackend::GoogleVision => "google-vision",
        }
    }
}

/// Which service corrects a batch of raw OCR text.
///
/// Both providers speak the OpenAI chat-completions wire format; selecting
/// one picks an endpoint, a credential, and a default model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CorrectionProvider {
    /// OpenAI (`gpt-4o` by default). (default)
    #[default]
    OpenAi,
    /// OpenRouter (`deepseek/deepseek-r1-0528:free` by default).
    OpenRouter,
}

impl CorrectionProvider {
    /// Stable lowercase name used in logs and error hints.
    pub fn name(&self) -> &'static str {
        match self {
            CorrectionProvider::OpenAi => "openai",
            CorrectionProvider::OpenRouter => "openrouter",
        }
    }

    /// Model submitted when the config does not name one.
    pub fn default_model(&self) -> &'static str {
        match self {
            CorrectionProvider::OpenAi => "gpt-4o",
            CorrectionProvider::OpenRouter => "deepseek/deepseek-r1-0528:free",
        }
    }

    /// Environment variable consulted when no API key is configured.
    pub fn key_env_var(&self) -> &'static str {
        match self {
            CorrectionProvider::OpenAi => "OPENAI_API_KEY",
            CorrectionProvider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}
