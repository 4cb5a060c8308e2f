//! Error types for the shuddhi library.
//!
//! Two distinct error levels reflect two distinct failure modes:
//!
//! * [`ShuddhiError`] — **Fatal**: the run cannot proceed at all (missing
//!   document, zero pages rendered, backend not configured). Returned as
//!   `Err(ShuddhiError)` from the top-level `run*` functions.
//!
//! * [`PageError`] / [`BatchError`] — **Non-fatal**: a single page failed to
//!   OCR, or a single batch exhausted its correction retries. Stored inside
//!   [`crate::output::PageOutcome`] and [`crate::output::BatchOutcome`] so
//!   callers can inspect partial success rather than losing a whole book to
//!   one bad page or one flaky API call.
//!
//! Below the run level, [`OcrError`] and [`ServiceError`] express what a
//! single extractor or correction-service call can report. The Corrector
//! treats every [`ServiceError`] variant as retryable; the distinction
//! matters only for logs and the final outcome record.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the shuddhi library.
///
/// Page-level and batch-level failures use [`PageError`] / [`BatchError`]
/// and are stored in the run's outcome records rather than propagated here.
#[derive(Debug, Error)]
pub enum ShuddhiError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input document was not found at the given path.
    #[error("document not found: '{path}'\nCheck the path exists and is readable.")]
    DocumentNotFound { path: PathBuf },

    /// Process does not have read permission on the document.
    #[error("permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("file is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Render errors ─────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Rendering produced no page images at all; there is nothing to OCR.
    #[error("no pages could be rendered from '{path}'")]
    NoPages { path: PathBuf },

    /// Could not create or write into the page-image directory.
    #[error("failed to write page images under '{dir}': {source}")]
    ImageDirFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not bind to a pdfium library.
    #[error(
        "failed to bind to pdfium library: {0}\n\
         Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Backend configuration errors ──────────────────────────────────────
    /// The selected OCR backend is unusable (missing binary or credential).
    #[error("OCR backend '{backend}' is not available.\n{hint}")]
    OcrNotConfigured { backend: String, hint: String },

    /// The selected correction provider is missing its API key.
    #[error("correction provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Artifact I/O errors ───────────────────────────────────────────────
    /// Could not read or write the raw-text artifact.
    #[error("failed to access raw-text artifact '{path}': {source}")]
    RawTextIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not append to or truncate the corrected-output artifact.
    #[error("failed to write output artifact '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored in [`crate::output::PageOutcome`] when a page fails. The page
/// contributes an empty section to the raw text and the run continues; only
/// zero rendered pages aborts the run.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// OCR extraction failed on a rendered page. Pages that fail to
    /// rasterise never reach the extractor; the renderer logs and skips
    /// them.
    #[error("page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },
}

/// A non-fatal error for a single batch.
///
/// Stored in [`crate::output::BatchOutcome`] after the Corrector exhausts
/// its retry budget. Nothing is written to the output artifact for a failed
/// batch, so downstream consumers only ever see corrected text.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum BatchError {
    /// Every correction attempt failed.
    #[error("batch {batch}: correction failed after {attempts} attempts: {detail}")]
    Exhausted {
        batch: usize,
        attempts: u32,
        detail: String,
    },
}

/// Failures a single OCR extraction call can report.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The OCR engine binary could not be spawned.
    #[error("OCR engine unavailable: {detail}")]
    EngineUnavailable { detail: String },

    /// The OCR engine ran but reported an error.
    #[error("OCR engine failed: {detail}")]
    EngineFailed { detail: String },

    /// The page image could not be read from disk.
    #[error("failed to read page image '{path}': {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Network-level failure talking to a cloud OCR service.
    #[error("OCR transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The cloud OCR service answered with a non-success status.
    #[error("OCR service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The cloud OCR response did not have the expected shape.
    #[error("malformed OCR response: {detail}")]
    Malformed { detail: String },
}

/// Failures a single correction-service call can report.
///
/// Every variant is retryable from the Corrector's point of view; the
/// per-batch retry budget, not the variant, decides when to give up.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Network-level failure (DNS, connect, TLS, mid-body disconnect).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status.
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The attempt exceeded the configured per-call timeout.
    #[error("correction call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The response body did not have the expected shape (no choices, bad JSON).
    #[error("malformed service response: {detail}")]
    Malformed { detail: String },

    /// The response was empty after trimming. Empty output would silently
    /// drop a batch of source text, so it is rejected and retried.
    #[error("service returned an empty correction")]
    EmptyResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_not_found_display() {
        let e = ShuddhiError::DocumentNotFound {
            path: PathBuf::from("missing.pdf"),
        };
        let msg = e.to_string();
        assert!(msg.contains("missing.pdf"), "got: {msg}");
    }

    #[test]
    fn provider_not_configured_display() {
        let e = ShuddhiError::ProviderNotConfigured {
            provider: "openrouter".into(),
            hint: "Set OPENROUTER_API_KEY.".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("openrouter"));
        assert!(msg.contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn batch_exhausted_display() {
        let e = BatchError::Exhausted {
            batch: 7,
            attempts: 3,
            detail: "HTTP 429".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("batch 7"));
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("429"));
    }

    #[test]
    fn service_timeout_display() {
        let e = ServiceError::Timeout { secs: 30 };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn page_error_roundtrips_through_serde() {
        let e = PageError::OcrFailed {
            page: 4,
            detail: "engine crashed".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: PageError = serde_json::from_str(&json).unwrap();
        assert!(back.to_string().contains("page 4"));
    }
}
