//! Correction: drive the correction service batch by batch.
//!
//! Each batch moves through a small state machine, independent of every
//! other batch:
//!
//! ```text
//! Pending ──▶ Attempting ──▶ Succeeded (append + flush, delay, next batch)
//!    │            │ ▲
//!    │            ▼ │ fixed retry delay, while attempts < max_retries
//!    │         Retrying
//!    │            │
//!    ▼            ▼
//!  Skipped      Failed (nothing written, recorded, next batch)
//! ```
//!
//! Batches are processed strictly in order and never in parallel: the
//! output artifact must preserve source paragraph order even when some
//! batches fail, and the correction services rate-limit per key, so
//! concurrent calls would only trade throughput for 429s. Every attempt
//! runs under a timeout; a hung call costs one attempt, not the run.
//!
//! The artifact is append-only within a run and flushed after every
//! success, which is what makes interruption between batches safe: a rerun
//! counts the sections already present and continues from the first
//! unprocessed batch.

use crate::batch::PARAGRAPH_DELIMITER;
use crate::config::RunConfig;
use crate::error::{BatchError, ServiceError, ShuddhiError};
use crate::output::BatchOutcome;
use crate::service::CorrectionService;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

use super::postprocess;

/// Correct `batches` in order, appending each success to the output
/// artifact.
///
/// Returns one [`BatchOutcome`] per batch processed this run; batches
/// skipped by resume are not listed. Per-batch failures never abort the
/// run; only artifact I/O errors do.
pub async fn correct_batches(
    service: &Arc<dyn CorrectionService>,
    batches: &[String],
    config: &RunConfig,
) -> Result<Vec<BatchOutcome>, ShuddhiError> {
    let total = batches.len();

    // Resume bookkeeping: count what a previous run already wrote, or
    // start the artifact over.
    let resumed = if config.resume {
        let n = completed_batch_count(&config.corrected_path).await?;
        if n > 0 {
            info!(
                "output artifact already holds {} batches, continuing from batch {}",
                n,
                n + 1
            );
        }
        n.min(total)
    } else {
        truncate_artifact(&config.corrected_path).await?;
        0
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_correction_start(total, resumed);
    }

    let mut file = open_append(&config.corrected_path).await?;
    let mut outcomes = Vec::with_capacity(total.saturating_sub(resumed));

    for (i, batch) in batches.iter().enumerate().skip(resumed) {
        let batch_num = i + 1;

        // The batcher never emits blank batches; guard anyway so a
        // hand-fed batch list cannot waste a service call.
        if batch.trim().is_empty() {
            info!("batch {}/{}: empty, skipping", batch_num, total);
            continue;
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_batch_start(batch_num, total);
        }
        info!(
            "batch {}/{}: submitting {} chars to {}",
            batch_num,
            total,
            batch.chars().count(),
            service.name()
        );

        let start = Instant::now();
        let mut attempt: u32 = 0;
        let result = loop {
            attempt += 1;
            if attempt > 1 {
                sleep(Duration::from_millis(config.retry_delay_ms)).await;
            }

            match attempt_correction(service, batch, config.api_timeout_secs).await {
                Ok(corrected) => break Ok(corrected),
                Err(e) => {
                    if attempt >= config.max_retries {
                        break Err(e);
                    }
                    warn!(
                        "batch {}/{}: attempt {}/{} failed ({}), retrying",
                        batch_num, total, attempt, config.max_retries, e
                    );
                }
            }
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(corrected) => {
                append_section(&mut file, &config.corrected_path, &corrected).await?;
                debug!(
                    "batch {}/{}: corrected in {}ms ({} attempts)",
                    batch_num, total, duration_ms, attempt
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_batch_complete(batch_num, total, corrected.chars().count(), attempt - 1);
                }
                outcomes.push(BatchOutcome {
                    batch_num,
                    input_chars: batch.chars().count(),
                    output_chars: corrected.chars().count(),
                    retries: attempt - 1,
                    duration_ms,
                    error: None,
                });

                // Rate-limiting courtesy between successive successful
                // batches; pointless after the last one.
                if batch_num < total {
                    sleep(Duration::from_millis(config.request_delay_ms)).await;
                }
            }
            Err(e) => {
                let detail = e.to_string();
                warn!(
                    "batch {}/{}: failed after {} attempts: {}",
                    batch_num, total, attempt, detail
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_batch_error(batch_num, total, &detail);
                }
                outcomes.push(BatchOutcome {
                    batch_num,
                    input_chars: batch.chars().count(),
                    output_chars: 0,
                    retries: attempt - 1,
                    duration_ms,
                    error: Some(BatchError::Exhausted {
                        batch: batch_num,
                        attempts: attempt,
                        detail,
                    }),
                });
            }
        }
    }

    Ok(outcomes)
}

/// One attempt: timeout-bounded service call plus response acceptance.
///
/// The response is sanitised before acceptance; a response that is empty
/// after cleanup (e.g. a bare code fence) counts as a failure so the
/// retry budget, not silence, decides the batch's fate.
async fn attempt_correction(
    service: &Arc<dyn CorrectionService>,
    batch: &str,
    timeout_secs: u64,
) -> Result<String, ServiceError> {
    let corrected = timeout(Duration::from_secs(timeout_secs), service.correct(batch))
        .await
        .map_err(|_| ServiceError::Timeout { secs: timeout_secs })??;

    let cleaned = postprocess::sanitize_correction(&corrected);
    if cleaned.is_empty() {
        return Err(ServiceError::EmptyResponse);
    }
    Ok(cleaned)
}

/// Count batches already present in the output artifact.
///
/// Sections are delimiter-separated; blank segments (including the
/// trailing one after the final delimiter) do not count. A missing
/// artifact counts as zero, so a fresh run needs no special case.
pub async fn completed_batch_count(path: &Path) -> Result<usize, ShuddhiError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content
            .split(PARAGRAPH_DELIMITER)
            .filter(|s| !s.trim().is_empty())
            .count()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(ShuddhiError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

async fn open_append(path: &Path) -> Result<tokio::fs::File, ShuddhiError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ShuddhiError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }
    tokio::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .await
        .map_err(|e| ShuddhiError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

async fn truncate_artifact(path: &Path) -> Result<(), ShuddhiError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ShuddhiError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Append one corrected section plus the delimiter and flush, so an
/// interruption after this point never loses the batch.
async fn append_section(
    file: &mut tokio::fs::File,
    path: &Path,
    corrected: &str,
) -> Result<(), ShuddhiError> {
    let io_err = |e| ShuddhiError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    file.write_all(corrected.as_bytes()).await.map_err(io_err)?;
    file.write_all(PARAGRAPH_DELIMITER.as_bytes())
        .await
        .map_err(io_err)?;
    file.flush().await.map_err(io_err)?;
    Ok(())
}
