//! Text extraction: turn a rendered page image into raw text.
//!
//! The pipeline only depends on the [`TextExtractor`] contract; which
//! engine actually reads the page is a static configuration choice made
//! once per run by [`build_extractor`]. Keeping the seam here means the
//! extraction loop, the raw-text artifact, and the correction stage never
//! branch on the backend.
//!
//! Two backends exist:
//!
//! * [`tesseract::TesseractExtractor`] — the local `tesseract` binary,
//!   invoked per page image. Free, offline, and good enough for clean
//!   scans.
//! * [`vision::VisionExtractor`] — Google Cloud Vision
//!   `DOCUMENT_TEXT_DETECTION`. Markedly better on degraded scans and
//!   unusual typefaces, at per-page cost.

pub mod tesseract;
pub mod vision;

use crate::config::{OcrBackend, RunConfig};
use crate::error::{OcrError, ShuddhiError};
use async_trait::async_trait;
use std::path::Path;

pub use tesseract::TesseractExtractor;
pub use vision::VisionExtractor;

/// One OCR backend: image in, raw text out.
///
/// A failed call is recoverable at the pipeline level: the page's section
/// in the raw text stays empty and the run continues.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Stable backend name for logs and outcome records.
    fn name(&self) -> &'static str;

    /// Extract the full text of one page image.
    async fn extract_text(&self, image: &Path) -> Result<String, OcrError>;
}

/// Construct the configured OCR backend.
///
/// Fails fast with a [`ShuddhiError::OcrNotConfigured`] hint when the
/// backend cannot possibly work (missing Vision credential), so a
/// misconfigured run dies before rendering a single page.
pub fn build_extractor(config: &RunConfig) -> Result<Box<dyn TextExtractor>, ShuddhiError> {
    match config.ocr_backend {
        OcrBackend::Tesseract => Ok(Box::new(TesseractExtractor::new(
            config.ocr_languages.clone(),
        ))),
        OcrBackend::GoogleVision => {
            let key = config
                .vision_api_key
                .clone()
                .or_else(|| std::env::var("GOOGLE_VISION_API_KEY").ok())
                .filter(|k| !k.is_empty())
                .ok_or_else(|| ShuddhiError::OcrNotConfigured {
                    backend: OcrBackend::GoogleVision.name().to_string(),
                    hint: "Set GOOGLE_VISION_API_KEY or pass vision_api_key in the config."
                        .to_string(),
                })?;
            let extractor = VisionExtractor::new(key).map_err(|e| ShuddhiError::OcrNotConfigured {
                backend: OcrBackend::GoogleVision.name().to_string(),
                hint: format!("HTTP client construction failed: {e}"),
            })?;
            Ok(Box::new(extractor))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;

    #[test]
    fn tesseract_backend_builds_without_credentials() {
        let config = RunConfig::default();
        let extractor = build_extractor(&config).unwrap();
        assert_eq!(extractor.name(), "tesseract");
    }

    #[test]
    fn vision_backend_requires_a_key() {
        // Guard against a key leaking in from the test environment.
        if std::env::var("GOOGLE_VISION_API_KEY").is_ok() {
            return;
        }
        let config = RunConfig::builder()
            .ocr_backend(OcrBackend::GoogleVision)
            .build()
            .unwrap();
        let err = match build_extractor(&config) {
            Ok(_) => panic!("expected build_extractor to fail without credentials"),
            Err(e) => e,
        };
        assert!(matches!(err, ShuddhiError::OcrNotConfigured { .. }));
    }

    #[test]
    fn vision_backend_builds_with_explicit_key() {
        let config = RunConfig::builder()
            .ocr_backend(OcrBackend::GoogleVision)
            .vision_api_key("test-key")
            .build()
            .unwrap();
        let extractor = build_extractor(&config).unwrap();
        assert_eq!(extractor.name(), "google-vision");
    }
}
