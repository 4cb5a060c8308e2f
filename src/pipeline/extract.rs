//! Extraction: drive the OCR backend page by page and persist the raw text.
//!
//! Pages are processed strictly in order, one at a time. A page that fails
//! to OCR contributes an empty section and the run continues; the failure
//! is recorded in its [`PageOutcome`] and surfaced through the progress
//! callback. Sections are joined by the paragraph delimiter so that page
//! boundaries survive into batching and, through it, into the corrected
//! artifact.
//!
//! The assembled text is written to the raw-text artifact exactly once,
//! before batching. That file is the recovery point of the whole pipeline:
//! a rerun can drive the correction stage again without touching the
//! scanner output or the OCR backend.

use crate::batch::PARAGRAPH_DELIMITER;
use crate::config::RunConfig;
use crate::error::{PageError, ShuddhiError};
use crate::ocr::TextExtractor;
use crate::output::PageOutcome;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// OCR every rendered page and assemble the raw text.
///
/// Returns the per-page outcomes and the joined raw text (one section per
/// page, blank-line separated). The caller persists the text via
/// [`write_raw_text`].
pub async fn extract_pages(
    extractor: &dyn TextExtractor,
    pages: &[(usize, PathBuf)],
    config: &RunConfig,
) -> (Vec<PageOutcome>, String) {
    let total = pages.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(total);
    }

    let mut outcomes = Vec::with_capacity(total);
    let mut sections = Vec::with_capacity(total);

    for (idx, image_path) in pages {
        let page_num = idx + 1;
        let start = Instant::now();

        match extractor.extract_text(image_path).await {
            Ok(text) => {
                let text = text.trim().to_string();
                let chars = text.chars().count();
                info!(
                    "page {}/{}: extracted {} chars via {}",
                    page_num,
                    total,
                    chars,
                    extractor.name()
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_extracted(page_num, total, chars);
                }
                outcomes.push(PageOutcome {
                    page_num,
                    chars,
                    duration_ms: start.elapsed().as_millis() as u64,
                    error: None,
                });
                sections.push(text);
            }
            Err(e) => {
                warn!("page {}/{}: OCR failed: {}", page_num, total, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, total, &e.to_string());
                }
                outcomes.push(PageOutcome {
                    page_num,
                    chars: 0,
                    duration_ms: start.elapsed().as_millis() as u64,
                    error: Some(PageError::OcrFailed {
                        page: page_num,
                        detail: e.to_string(),
                    }),
                });
                sections.push(String::new());
            }
        }
    }

    (outcomes, sections.join(PARAGRAPH_DELIMITER))
}

/// Write the raw-text artifact (UTF-8, once per run).
pub async fn write_raw_text(raw_text: &str, config: &RunConfig) -> Result<(), ShuddhiError> {
    if let Some(parent) = config.raw_text_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ShuddhiError::RawTextIo {
                    path: config.raw_text_path.clone(),
                    source: e,
                })?;
        }
    }
    tokio::fs::write(&config.raw_text_path, raw_text)
        .await
        .map_err(|e| ShuddhiError::RawTextIo {
            path: config.raw_text_path.clone(),
            source: e,
        })?;
    info!(
        "raw text written: {} ({} chars)",
        config.raw_text_path.display(),
        raw_text.chars().count()
    );
    Ok(())
}

/// Read the raw-text artifact back, e.g. when resuming a run.
pub async fn read_raw_text(config: &RunConfig) -> Result<String, ShuddhiError> {
    tokio::fs::read_to_string(&config.raw_text_path)
        .await
        .map_err(|e| ShuddhiError::RawTextIo {
            path: config.raw_text_path.clone(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;

    /// Extractor that replays a scripted per-page result sequence.
    struct ScriptedExtractor {
        results: Mutex<Vec<Result<String, OcrError>>>,
    }

    impl ScriptedExtractor {
        fn new(results: Vec<Result<String, OcrError>>) -> Self {
            Self {
                results: Mutex::new(results),
            }
        }
    }

    #[async_trait]
    impl TextExtractor for ScriptedExtractor {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn extract_text(&self, _image: &Path) -> Result<String, OcrError> {
            self.results.lock().unwrap().remove(0)
        }
    }

    fn page_list(n: usize) -> Vec<(usize, PathBuf)> {
        (0..n)
            .map(|i| (i, PathBuf::from(format!("page_{:03}.png", i + 1))))
            .collect()
    }

    #[tokio::test]
    async fn pages_join_with_blank_line_delimiter() {
        let extractor = ScriptedExtractor::new(vec![
            Ok("नमो तस्स".to_string()),
            Ok("भगवतो".to_string()),
        ]);
        let config = RunConfig::default();
        let (outcomes, raw) = extract_pages(&extractor, &page_list(2), &config).await;

        assert_eq!(raw, "नमो तस्स\n\nभगवतो");
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.error.is_none()));
    }

    #[tokio::test]
    async fn failed_page_contributes_empty_section_and_run_continues() {
        let extractor = ScriptedExtractor::new(vec![
            Ok("पढमं".to_string()),
            Err(OcrError::EngineFailed {
                detail: "crashed".into(),
            }),
            Ok("ततियं".to_string()),
        ]);
        let config = RunConfig::default();
        let (outcomes, raw) = extract_pages(&extractor, &page_list(3), &config).await;

        assert_eq!(raw, "पढमं\n\n\n\nततियं");
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[1].error.is_some());
        assert_eq!(outcomes[1].chars, 0);
    }

    #[tokio::test]
    async fn raw_text_round_trips_through_the_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::builder()
            .raw_text_path(dir.path().join("raw.txt"))
            .corrected_path(dir.path().join("out.txt"))
            .build()
            .unwrap();

        write_raw_text("पढमं\n\nदुतियं", &config).await.unwrap();
        let back = read_raw_text(&config).await.unwrap();
        assert_eq!(back, "पढमं\n\nदुतियं");
    }
}
