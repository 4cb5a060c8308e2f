//! Output types: per-page and per-batch outcomes plus run statistics.
//!
//! A run returns [`RunOutput`] even when some pages or batches failed; the
//! caller inspects [`RunStats::failed_batches`] and the outcome vectors to
//! decide how much failure to tolerate. Everything here derives `Serialize`
//! so the CLI can emit the whole report as JSON.

use crate::error::{BatchError, PageError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of a full transcription run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    /// Where the raw OCR text was written (one section per page).
    pub raw_text_path: PathBuf,
    /// Where the corrected text was appended (one section per batch).
    pub corrected_path: PathBuf,
    /// Per-page extraction outcomes, in page order. Empty when the run
    /// resumed from an existing raw-text artifact.
    pub pages: Vec<PageOutcome>,
    /// Per-batch correction outcomes, in batch order. Batches skipped by
    /// resume are not listed.
    pub batches: Vec<BatchOutcome>,
    /// Aggregate counters and timings.
    pub stats: RunStats,
}

/// Outcome of extracting one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageOutcome {
    /// 1-based page ordinal.
    pub page_num: usize,
    /// Characters of extracted text (0 on failure).
    pub chars: usize,
    /// Wall-clock time for this page's OCR call.
    pub duration_ms: u64,
    /// Set when the page failed to OCR; its section is empty.
    pub error: Option<PageError>,
}

/// Outcome of correcting one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// 1-based position in the batch sequence.
    pub batch_num: usize,
    /// Characters submitted for correction.
    pub input_chars: usize,
    /// Characters appended to the artifact (0 on failure).
    pub output_chars: usize,
    /// Failed attempts before the final attempt (0 on first-try success).
    pub retries: u32,
    /// Wall-clock time across all attempts, including retry waits.
    pub duration_ms: u64,
    /// Set when the batch exhausted its retry budget; nothing was written.
    pub error: Option<BatchError>,
}

impl BatchOutcome {
    /// True when corrected text for this batch reached the artifact.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate statistics for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Pages the renderer produced images for.
    pub total_pages: usize,
    /// Pages whose text was extracted without error.
    pub extracted_pages: usize,
    /// Pages whose OCR failed (their sections are empty).
    pub failed_pages: usize,
    /// Batches produced by the batcher.
    pub total_batches: usize,
    /// Batches corrected and appended to the artifact this run.
    pub corrected_batches: usize,
    /// Batches that exhausted their retry budget.
    pub failed_batches: usize,
    /// Leading batches skipped because the artifact already contained them.
    pub resumed_batches: usize,
    /// Characters in the raw-text artifact.
    pub raw_chars: usize,
    /// Characters appended to the corrected artifact this run.
    pub corrected_chars: usize,
    /// End-to-end wall-clock time.
    pub total_duration_ms: u64,
    /// Time spent rasterising pages.
    pub render_duration_ms: u64,
    /// Time spent in OCR calls.
    pub ocr_duration_ms: u64,
    /// Time spent in the correction stage, including delays.
    pub correction_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BatchError;

    #[test]
    fn batch_outcome_succeeded() {
        let ok = BatchOutcome {
            batch_num: 1,
            input_chars: 100,
            output_chars: 98,
            retries: 1,
            duration_ms: 1200,
            error: None,
        };
        assert!(ok.succeeded());

        let failed = BatchOutcome {
            error: Some(BatchError::Exhausted {
                batch: 2,
                attempts: 3,
                detail: "timeout".into(),
            }),
            output_chars: 0,
            ..ok
        };
        assert!(!failed.succeeded());
    }

    #[test]
    fn run_stats_serialises_to_json() {
        let stats = RunStats {
            total_batches: 4,
            corrected_batches: 3,
            failed_batches: 1,
            ..RunStats::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"failed_batches\":1"));
    }
}
