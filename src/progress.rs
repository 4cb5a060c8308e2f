//! Progress-callback trait for per-page and per-batch pipeline events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive events
//! as the pipeline extracts each page and corrects each batch.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a terminal progress bar, a log file, or a database
//! record without the library knowing anything about how the host
//! application communicates. The trait is `Send + Sync` so the same
//! implementation works from the blocking `run_sync` wrapper.
//!
//! # Example
//!
//! ```rust
//! use shuddhi::{RunConfig, RunProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     corrected: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_batch_complete(&self, batch_num: usize, total: usize, chars: usize, retries: u32) {
//!         let done = self.corrected.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("batch {batch_num}/{total} done ({chars} chars, {retries} retries, {done} total)");
//!     }
//! }
//!
//! let config = RunConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback {
//!         corrected: AtomicUsize::new(0),
//!     }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Shared handle to a progress observer.
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

/// Called by the pipeline as it processes each page and batch.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline is sequential, so calls arrive in
/// order and never overlap; implementations still must be `Send + Sync`
/// because the run may execute on a different thread than the caller's.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after rendering, before any OCR work.
    ///
    /// # Arguments
    /// * `total_pages` — number of page images that will be extracted
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after a page's text was extracted successfully.
    fn on_page_extracted(&self, page_num: usize, total_pages: usize, chars: usize) {
        let _ = (page_num, total_pages, chars);
    }

    /// Called when a page failed to OCR. The run continues.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once before the first correction call, after batching.
    ///
    /// # Arguments
    /// * `total_batches` — number of batches the Corrector will process
    /// * `resumed` — leading batches skipped because the output artifact
    ///   already contains them
    fn on_correction_start(&self, total_batches: usize, resumed: usize) {
        let _ = (total_batches, resumed);
    }

    /// Called before the first attempt on a batch.
    fn on_batch_start(&self, batch_num: usize, total_batches: usize) {
        let _ = (batch_num, total_batches);
    }

    /// Called after a batch was corrected and appended to the artifact.
    ///
    /// `retries` is the number of failed attempts before the success (0 on
    /// a first-try success).
    fn on_batch_complete(&self, batch_num: usize, total_batches: usize, chars: usize, retries: u32) {
        let _ = (batch_num, total_batches, chars, retries);
    }

    /// Called when a batch exhausted its retry budget. The run continues.
    fn on_batch_error(&self, batch_num: usize, total_batches: usize, error: &str) {
        let _ = (batch_num, total_batches, error);
    }

    /// Called once when the run finishes, fatal errors aside.
    fn on_run_complete(&self, total_batches: usize, corrected: usize, failed: usize) {
        let _ = (total_batches, corrected, failed);
    }
}
