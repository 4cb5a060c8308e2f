//! # shuddhi
//!
//! Turn scanned Pali/Sanskrit/Hindi books into clean Devanagari
//! transcripts: rasterise pages, OCR them, then repair the recognition
//! errors with an LLM correction pass.
//!
//! ## Why this crate?
//!
//! OCR engines are trained on well-resourced scripts; on Devanagari book
//! scans they confuse conjunct ligatures, drop vowel signs, and mangle
//! punctuation badly enough that the raw output is unusable as a
//! transcript. A language model that has seen the canonical texts can
//! repair most of those errors from context. This crate is the
//! orchestration around that idea: it batches the raw text, feeds each
//! batch to a correction service under a bounded retry policy, and
//! reassembles the output deterministically and resumably.
//!
//! ## Pipeline Overview
//!
//! ```text
//! scanned PDF
//!  │
//!  ├─ 1. Input    validate the document path
//!  ├─ 2. Render   rasterise pages to PNG via pdfium (spawn_blocking)
//!  ├─ 3. Extract  OCR each page (tesseract / Google Vision), write raw text
//!  ├─ 4. Batch    greedy size-bounded paragraph packing (pure)
//!  ├─ 5. Correct  sequential LLM calls with retries, append-only output
//!  └─ 6. Report   per-page / per-batch outcomes + run stats
//! ```
//!
//! The raw-text file written after step 3 is the recovery point: a rerun
//! resumes the correction stage from it without re-rendering or re-OCRing
//! anything, and batches already present in the output artifact are not
//! re-corrected.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shuddhi::{run, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Correction key from OPENAI_API_KEY; tesseract on PATH for OCR.
//!     let config = RunConfig::default();
//!     let output = run("scans/dhammapada.pdf", &config).await?;
//!     eprintln!(
//!         "{}/{} batches corrected, {} failed",
//!         output.stats.corrected_batches,
//!         output.stats.total_batches,
//!         output.stats.failed_batches,
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `shuddhi` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! shuddhi = { version = "0.4", default-features = false }
//! ```
//!
//! ## Choosing backends
//!
//! | OCR | Cost | Notes |
//! |-----|------|-------|
//! | `tesseract` (default) | free | needs the binary plus `san`/`hin` traineddata |
//! | `google-vision` | per page | much better on faded or skewed scans |
//!
//! | Correction | Default model | Notes |
//! |------------|---------------|-------|
//! | `openai` (default) | `gpt-4o` | strongest corrections |
//! | `openrouter` | `deepseek/deepseek-r1-0528:free` | free tier, slower |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod run;
pub mod service;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{batch, PARAGRAPH_DELIMITER};
pub use config::{CorrectionProvider, OcrBackend, RunConfig, RunConfigBuilder};
pub use error::{BatchError, OcrError, PageError, ServiceError, ShuddhiError};
pub use ocr::TextExtractor;
pub use output::{BatchOutcome, PageOutcome, RunOutput, RunStats};
pub use progress::{ProgressCallback, RunProgressCallback};
pub use run::{extract_text, run, run_sync};
pub use service::CorrectionService;
