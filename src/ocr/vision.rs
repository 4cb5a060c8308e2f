//! Cloud OCR via the Google Cloud Vision REST API.
//!
//! One `images:annotate` request per page, with the PNG content inlined as
//! base64 and `DOCUMENT_TEXT_DETECTION` requested. The dense-text detector
//! is the right feature for book pages; plain `TEXT_DETECTION` is tuned
//! for text in photographs and fragments paragraphs.
//!
//! Authentication uses an API key in the query string. Service-account
//! OAuth flows are deliberately out of scope; a key is the lowest-friction
//! credential for a batch transcription tool and matches how the other
//! correction backends authenticate.

use crate::error::OcrError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::TextExtractor;

const VISION_API_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Hints passed with every request. Vision has no Pali model either;
/// Sanskrit and Hindi cover the script.
const LANGUAGE_HINTS: [&str; 2] = ["sa", "hi"];

/// OCR backend that calls Google Cloud Vision `DOCUMENT_TEXT_DETECTION`.
pub struct VisionExtractor {
    http_client: reqwest::Client,
    api_key: String,
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
    image_context: ImageContext,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    /// Base64-encoded image bytes.
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    r#type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext {
    language_hints: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<PageAnnotation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageAnnotation {
    full_text_annotation: Option<TextAnnotation>,
    error: Option<VisionStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    text: String,
}

#[derive(Debug, Deserialize)]
struct VisionStatus {
    code: i32,
    message: String,
}

impl VisionExtractor {
    /// Create a Vision client with a 60 s request timeout.
    pub fn new(api_key: String) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http_client,
            api_key,
        })
    }
}

#[async_trait]
impl TextExtractor for VisionExtractor {
    fn name(&self) -> &'static str {
        "google-vision"
    }

    async fn extract_text(&self, image: &Path) -> Result<String, OcrError> {
        let bytes = tokio::fs::read(image).await.map_err(|e| OcrError::ImageRead {
            path: image.to_path_buf(),
            source: e,
        })?;

        let request = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(&bytes),
                },
                features: vec![Feature {
                    r#type: "DOCUMENT_TEXT_DETECTION".to_string(),
                }],
                image_context: ImageContext {
                    language_hints: LANGUAGE_HINTS.iter().map(|s| s.to_string()).collect(),
                },
            }],
        };

        let response = self
            .http_client
            .post(VISION_API_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let parsed: AnnotateResponse = response.json().await.map_err(|e| OcrError::Malformed {
            detail: format!("invalid JSON body: {e}"),
        })?;

        let page = parsed.responses.into_iter().next().ok_or(OcrError::Malformed {
            detail: "empty responses array".to_string(),
        })?;

        if let Some(err) = page.error {
            return Err(OcrError::EngineFailed {
                detail: format!("Vision error {}: {}", err.code, err.message),
            });
        }

        // A blank page legitimately has no annotation; treat it as empty text.
        let text = page
            .full_text_annotation
            .map(|a| a.text.trim().to_string())
            .unwrap_or_default();
        debug!(
            "vision read {} chars from {}",
            text.chars().count(),
            image.display()
        );
        Ok(text)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}…")
    }
}
