//! Run entry points: the driver that sequences the four stages.
//!
//! The driver is deliberately thin. It resolves the document, constructs
//! both backends up front (so a missing credential fails before any
//! rendering work), then hands off to the stage modules:
//! render → extract → batch → correct. Only two conditions abort a run
//! once it has started: a document that yields zero page images, and
//! artifact I/O failure. Everything else — a page that will not OCR, a
//! batch that exhausts its retries — is recorded and the run completes
//! with a summary.

use crate::batch::{batch, PARAGRAPH_DELIMITER};
use crate::config::RunConfig;
use crate::error::ShuddhiError;
use crate::output::{RunOutput, RunStats};
use crate::pipeline::{correct, extract, input, render};
use crate::service;
use std::time::Instant;
use tracing::{debug, info};

/// Transcribe a scanned document end to end.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `document` — path to the scanned PDF
/// * `config` — run configuration
///
/// # Returns
/// `Ok(RunOutput)` on completion, even if some pages or batches failed
/// (check `output.stats.failed_batches`).
///
/// # Errors
/// Returns `Err(ShuddhiError)` only for fatal conditions: document
/// missing or unreadable, zero pages rendered, a backend without its
/// credential, or artifact I/O failure.
pub async fn run(document: impl AsRef<str>, config: &RunConfig) -> Result<RunOutput, ShuddhiError> {
    let total_start = Instant::now();
    let document = document.as_ref();
    info!("starting transcription: {}", document);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let document_path = input::resolve_document(document)?;

    // ── Step 2: Build both backends, failing fast on configuration ───────
    let extractor = crate::ocr::build_extractor(config)?;
    let corrector = service::build_service(config)?;
    debug!(
        "backends: ocr={}, correction={} ({})",
        extractor.name(),
        corrector.name(),
        corrector.model()
    );

    // ── Step 3: Obtain raw text, from the artifact or by render + OCR ────
    let mut stats = RunStats::default();
    let mut pages = Vec::new();

    let raw_text = if config.resume && artifact_has_content(config).await {
        info!(
            "resuming from raw-text artifact {}, skipping render and OCR",
            config.raw_text_path.display()
        );
        extract::read_raw_text(config).await?
    } else {
        let render_start = Instant::now();
        let rendered = render::render_pages(&document_path, config).await?;
        stats.render_duration_ms = render_start.elapsed().as_millis() as u64;
        stats.total_pages = rendered.len();
        info!(
            "rendered {} pages in {}ms",
            rendered.len(),
            stats.render_duration_ms
        );

        let ocr_start = Instant::now();
        let (page_outcomes, raw) = extract::extract_pages(extractor.as_ref(), &rendered, config).await;
        stats.ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
        pages = page_outcomes;

        extract::write_raw_text(&raw, config).await?;
        raw
    };

    stats.extracted_pages = pages.iter().filter(|p| p.error.is_none()).count();
    stats.failed_pages = pages.iter().filter(|p| p.error.is_some()).count();
    stats.raw_chars = raw_text.chars().count();

    // ── Step 4: Batch ────────────────────────────────────────────────────
    let batches = batch(&raw_text, config.max_batch_chars);
    stats.total_batches = batches.len();
    info!(
        "prepared {} batches (≤ {} chars each)",
        batches.len(),
        config.max_batch_chars
    );

    // ── Step 5: Correct ──────────────────────────────────────────────────
    let correction_start = Instant::now();
    let outcomes = correct::correct_batches(&corrector, &batches, config).await?;
    stats.correction_duration_ms = correction_start.elapsed().as_millis() as u64;

    // ── Step 6: Assemble stats and summarise ─────────────────────────────
    stats.corrected_batches = outcomes.iter().filter(|b| b.succeeded()).count();
    stats.failed_batches = outcomes.iter().filter(|b| !b.succeeded()).count();
    stats.resumed_batches = stats
        .total_batches
        .saturating_sub(outcomes.len());
    stats.corrected_chars = outcomes.iter().map(|b| b.output_chars).sum();
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "transcription complete: {} batches, {} corrected, {} failed, {} resumed, {}ms total",
        stats.total_batches,
        stats.corrected_batches,
        stats.failed_batches,
        stats.resumed_batches,
        stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(
            stats.total_batches,
            stats.corrected_batches,
            stats.failed_batches,
        );
    }

    Ok(RunOutput {
        raw_text_path: config.raw_text_path.clone(),
        corrected_path: config.corrected_path.clone(),
        pages,
        batches: outcomes,
        stats,
    })
}

/// Run the OCR stage only: render, extract, and persist the raw-text
/// artifact without contacting the correction service.
///
/// Useful for inspecting raw OCR quality before spending correction
/// credits, and for preparing the artifact a later `run` will resume from.
pub async fn extract_text(
    document: impl AsRef<str>,
    config: &RunConfig,
) -> Result<String, ShuddhiError> {
    let document_path = input::resolve_document(document.as_ref())?;
    let extractor = crate::ocr::build_extractor(config)?;

    let rendered = render::render_pages(&document_path, config).await?;
    let (_, raw) = extract::extract_pages(extractor.as_ref(), &rendered, config).await;
    extract::write_raw_text(&raw, config).await?;
    Ok(raw)
}

/// Synchronous wrapper around [`run`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_sync(document: impl AsRef<str>, config: &RunConfig) -> Result<RunOutput, ShuddhiError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ShuddhiError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(run(document, config))
}

/// True when the raw-text artifact exists and holds at least one
/// non-blank section.
async fn artifact_has_content(config: &RunConfig) -> bool {
    match tokio::fs::read_to_string(&config.raw_text_path).await {
        Ok(content) => content
            .split(PARAGRAPH_DELIMITER)
            .any(|s| !s.trim().is_empty()),
        Err(_) => false,
    }
}
