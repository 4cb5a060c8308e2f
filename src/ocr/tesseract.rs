//! Local OCR via the `tesseract` command-line binary.
//!
//! Invoking the binary per page (`tesseract <image> stdout -l <langs>`)
//! avoids linking libtesseract and works with whatever traineddata the
//! host has installed. Page images arrive one at a time from the
//! sequential extraction loop, so process-spawn overhead is irrelevant
//! next to the recognition time itself.

use crate::error::OcrError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::TextExtractor;

/// OCR backend that shells out to the `tesseract` binary.
pub struct TesseractExtractor {
    /// Language string passed via `-l`, e.g. `san+hin`.
    languages: String,
}

impl TesseractExtractor {
    pub fn new(languages: String) -> Self {
        Self { languages }
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn extract_text(&self, image: &Path) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.languages])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OcrError::EngineUnavailable {
                        detail: "tesseract binary not found on PATH; install tesseract-ocr \
                                 with the san and hin traineddata"
                            .to_string(),
                    }
                } else {
                    OcrError::EngineFailed {
                        detail: format!("failed to spawn tesseract: {e}"),
                    }
                }
            })?;

        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                detail: format!(
                    "tesseract exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(
            "tesseract read {} chars from {}",
            text.chars().count(),
            image.display()
        );
        Ok(text)
    }
}
