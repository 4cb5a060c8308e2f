//! Integration tests for the batching and correction pipeline.
//!
//! The Corrector is driven against scripted in-process correction services
//! so every retry/failure path is exercised without a network. Live
//! end-to-end tests (real PDF, real OCR, real correction API) are gated
//! behind the `E2E_ENABLED` environment variable so they never run in CI
//! unless explicitly requested.
//!
//! Run with:
//!   cargo test --test pipeline
//!
//! Live run:
//!   E2E_ENABLED=1 OPENAI_API_KEY=sk-... cargo test --test pipeline -- --nocapture

use async_trait::async_trait;
use shuddhi::pipeline::correct::{completed_batch_count, correct_batches};
use shuddhi::{CorrectionService, RunConfig, ServiceError, PARAGRAPH_DELIMITER};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Correction service that replays a scripted response sequence and counts
/// how many calls it received.
struct ScriptedService {
    responses: Mutex<VecDeque<Result<String, ServiceError>>>,
    calls: AtomicUsize,
}

impl ScriptedService {
    fn new(responses: Vec<Result<String, ServiceError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CorrectionService for ScriptedService {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn correct(&self, _text: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ServiceError::EmptyResponse))
    }
}

/// Correction service that never answers within any sane timeout.
struct HangingService;

#[async_trait]
impl CorrectionService for HangingService {
    fn name(&self) -> &'static str {
        "hanging"
    }

    fn model(&self) -> &str {
        "hanging-model"
    }

    async fn correct(&self, _text: &str) -> Result<String, ServiceError> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok("too late".to_string())
    }
}

fn transport_failure() -> Result<String, ServiceError> {
    Err(ServiceError::Status {
        status: 503,
        body: "upstream overloaded".into(),
    })
}

/// Config with zeroed delays and artifacts inside `dir`.
fn test_config(dir: &Path) -> RunConfig {
    RunConfig::builder()
        .raw_text_path(dir.join("raw.txt"))
        .corrected_path(dir.join("corrected.txt"))
        .retry_delay_ms(0)
        .request_delay_ms(0)
        .max_retries(3)
        .build()
        .unwrap()
}

async fn read_artifact(config: &RunConfig) -> String {
    tokio::fs::read_to_string(&config.corrected_path)
        .await
        .unwrap_or_default()
}

fn batches(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|s| s.to_string()).collect()
}

// ── Corrector state-machine tests ────────────────────────────────────────────

#[tokio::test]
async fn first_try_success_appends_one_section() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let service = ScriptedService::new(vec![Ok("धम्मपदं".to_string())]);

    let svc: Arc<dyn CorrectionService> = service.clone();
    let outcomes = correct_batches(&svc, &batches(&["dhammapadam"]), &config)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].succeeded());
    assert_eq!(outcomes[0].retries, 0);
    assert_eq!(service.calls(), 1);
    assert_eq!(read_artifact(&config).await, format!("धम्मपदं{PARAGRAPH_DELIMITER}"));
}

// A service that fails exactly max_retries - 1 times then succeeds must
// write the successful result exactly once.
#[tokio::test]
async fn retries_then_success_writes_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let service = ScriptedService::new(vec![
        transport_failure(),
        transport_failure(),
        Ok("सुद्धं वचनं".to_string()),
    ]);

    let svc: Arc<dyn CorrectionService> = service.clone();
    let outcomes = correct_batches(&svc, &batches(&["suddham vacanam"]), &config)
        .await
        .unwrap();

    assert_eq!(service.calls(), 3, "two failures plus the success");
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].succeeded());
    assert_eq!(outcomes[0].retries, 2);

    let artifact = read_artifact(&config).await;
    assert_eq!(artifact, format!("सुद्धं वचनं{PARAGRAPH_DELIMITER}"));
    assert_eq!(artifact.matches("सुद्धं वचनं").count(), 1, "no duplicate write");
}

// A batch that always fails is absent from the artifact, counted as
// failed, and does not abort the remaining batches.
#[tokio::test]
async fn exhausted_batch_is_omitted_and_order_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let service = ScriptedService::new(vec![
        Ok("पढमो गाथा".to_string()),
        transport_failure(),
        transport_failure(),
        transport_failure(),
        Ok("ततियो गाथा".to_string()),
    ]);

    let svc: Arc<dyn CorrectionService> = service.clone();
    let outcomes = correct_batches(
        &svc,
        &batches(&["first", "doomed", "third"]),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].succeeded());
    assert!(!outcomes[1].succeeded());
    assert!(outcomes[2].succeeded());
    assert_eq!(outcomes.iter().filter(|o| !o.succeeded()).count(), 1);

    // The failed batch left no trace; the survivors kept their order.
    let artifact = read_artifact(&config).await;
    assert_eq!(
        artifact,
        format!("पढमो गाथा{PARAGRAPH_DELIMITER}ततियो गाथा{PARAGRAPH_DELIMITER}")
    );
}

#[tokio::test]
async fn empty_batch_sequence_processes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let service = ScriptedService::new(vec![]);

    let svc: Arc<dyn CorrectionService> = service.clone();
    let outcomes = correct_batches(&svc, &[], &config).await.unwrap();

    assert!(outcomes.is_empty());
    assert_eq!(service.calls(), 0);
    assert_eq!(read_artifact(&config).await, "");
}

#[tokio::test]
async fn whitespace_batch_is_skipped_without_a_call() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let service = ScriptedService::new(vec![]);

    let svc: Arc<dyn CorrectionService> = service.clone();
    let outcomes = correct_batches(&svc, &batches(&["   \n  "]), &config)
        .await
        .unwrap();

    assert!(outcomes.is_empty());
    assert_eq!(service.calls(), 0, "no request for a blank batch");
}

// An empty (or fence-only) response is a retryable failure, not silent
// data loss.
#[tokio::test]
async fn empty_response_is_retried_then_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let service = ScriptedService::new(vec![
        Ok("   ".to_string()),
        Ok("```\n\n```".to_string()),
        Ok("निब्बानं परमं सुखं".to_string()),
    ]);

    let svc: Arc<dyn CorrectionService> = service.clone();
    let outcomes = correct_batches(&svc, &batches(&["nibbanam"]), &config)
        .await
        .unwrap();

    assert_eq!(service.calls(), 3);
    assert!(outcomes[0].succeeded());
    assert_eq!(outcomes[0].retries, 2);
    assert_eq!(
        read_artifact(&config).await,
        format!("निब्बानं परमं सुखं{PARAGRAPH_DELIMITER}")
    );
}

// Code fences around an otherwise good response are stripped before the
// text reaches the artifact.
#[tokio::test]
async fn fenced_response_is_sanitised_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let service = ScriptedService::new(vec![Ok("```\nअप्पमादो अमतपदं\n```".to_string())]);

    let svc: Arc<dyn CorrectionService> = service.clone();
    let outcomes = correct_batches(&svc, &batches(&["appamado"]), &config)
        .await
        .unwrap();

    assert!(outcomes[0].succeeded());
    assert_eq!(
        read_artifact(&config).await,
        format!("अप्पमादो अमतपदं{PARAGRAPH_DELIMITER}")
    );
}

#[tokio::test(start_paused = true)]
async fn hung_attempt_is_bounded_by_the_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::builder()
        .raw_text_path(dir.path().join("raw.txt"))
        .corrected_path(dir.path().join("corrected.txt"))
        .retry_delay_ms(0)
        .request_delay_ms(0)
        .max_retries(1)
        .api_timeout_secs(1)
        .build()
        .unwrap();

    let svc: Arc<dyn CorrectionService> = Arc::new(HangingService);
    let outcomes = correct_batches(&svc, &batches(&["stuck"]), &config)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    let err = outcomes[0].error.as_ref().expect("batch must fail");
    assert!(err.to_string().contains("timed out"), "got: {err}");
    assert_eq!(read_artifact(&config).await, "");
}

// ── Resume tests ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn resume_continues_after_already_written_batches() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    // A previous run corrected the first two batches.
    tokio::fs::write(
        &config.corrected_path,
        format!("एकं{PARAGRAPH_DELIMITER}द्वे{PARAGRAPH_DELIMITER}"),
    )
    .await
    .unwrap();

    let service = ScriptedService::new(vec![Ok("त्रीणि".to_string())]);
    let svc: Arc<dyn CorrectionService> = service.clone();
    let outcomes = correct_batches(&svc, &batches(&["one", "two", "three"]), &config)
        .await
        .unwrap();

    assert_eq!(service.calls(), 1, "only the third batch is submitted");
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].batch_num, 3);
    assert_eq!(
        read_artifact(&config).await,
        format!("एकं{PARAGRAPH_DELIMITER}द्वे{PARAGRAPH_DELIMITER}त्रीणि{PARAGRAPH_DELIMITER}")
    );
}

#[tokio::test]
async fn resume_with_complete_artifact_submits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    tokio::fs::write(
        &config.corrected_path,
        format!("एकं{PARAGRAPH_DELIMITER}द्वे{PARAGRAPH_DELIMITER}"),
    )
    .await
    .unwrap();

    let service = ScriptedService::new(vec![]);
    let svc: Arc<dyn CorrectionService> = service.clone();
    let outcomes = correct_batches(&svc, &batches(&["one", "two"]), &config)
        .await
        .unwrap();

    assert!(outcomes.is_empty());
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn no_resume_rebuilds_the_artifact_from_scratch() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::builder()
        .raw_text_path(dir.path().join("raw.txt"))
        .corrected_path(dir.path().join("corrected.txt"))
        .retry_delay_ms(0)
        .request_delay_ms(0)
        .resume(false)
        .build()
        .unwrap();

    tokio::fs::write(&config.corrected_path, "stale content from a failed run\n\n")
        .await
        .unwrap();

    let service = ScriptedService::new(vec![Ok("नवं".to_string())]);
    let svc: Arc<dyn CorrectionService> = service.clone();
    correct_batches(&svc, &batches(&["fresh"]), &config)
        .await
        .unwrap();

    assert_eq!(read_artifact(&config).await, format!("नवं{PARAGRAPH_DELIMITER}"));
}

#[tokio::test]
async fn completed_batch_count_ignores_blank_segments() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("artifact.txt");

    assert_eq!(completed_batch_count(&path).await.unwrap(), 0, "missing file");

    tokio::fs::write(&path, "एकं\n\nद्वे\n\n").await.unwrap();
    assert_eq!(completed_batch_count(&path).await.unwrap(), 2);

    tokio::fs::write(&path, "एकं\n\n\n\nद्वे\n\n   \n\n").await.unwrap();
    assert_eq!(completed_batch_count(&path).await.unwrap(), 2);
}

// ── Batch → correct round trip ───────────────────────────────────────────────

// Order preservation end to end: raw text through the batcher and a
// partially failing corrector still yields artifact sections in source
// order.
#[tokio::test]
async fn batcher_and_corrector_preserve_source_order_under_partial_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::builder()
        .raw_text_path(dir.path().join("raw.txt"))
        .corrected_path(dir.path().join("corrected.txt"))
        .retry_delay_ms(0)
        .request_delay_ms(0)
        .max_retries(1)
        .max_batch_chars(12)
        .build()
        .unwrap();

    let raw = "page one\n\npage two\n\npage three";
    let batched = shuddhi::batch(raw, config.max_batch_chars);
    assert_eq!(batched, vec!["page one", "page two", "page three"]);

    // Middle batch fails its single attempt.
    let service = ScriptedService::new(vec![
        Ok("PAGE ONE".to_string()),
        transport_failure(),
        Ok("PAGE THREE".to_string()),
    ]);
    let svc: Arc<dyn CorrectionService> = service.clone();
    let outcomes = correct_batches(&svc, &batched, &config).await.unwrap();

    assert_eq!(outcomes.iter().filter(|o| !o.succeeded()).count(), 1);
    let artifact = read_artifact(&config).await;
    let sections: Vec<&str> = artifact
        .split(PARAGRAPH_DELIMITER)
        .filter(|s| !s.trim().is_empty())
        .collect();
    assert_eq!(sections, vec!["PAGE ONE", "PAGE THREE"]);
}

// ── Live end-to-end (env-gated) ──────────────────────────────────────────────

/// Skip unless E2E_ENABLED is set *and* the sample scan exists.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run live e2e tests");
            return;
        }
        let p: std::path::PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test scan not found: {}", p.display());
            return;
        }
        p
    }};
}

#[tokio::test]
async fn live_full_transcription_run() {
    let scan = e2e_skip_unless_ready!(std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_cases/sample_devanagari.pdf"));

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .ok();

    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::builder()
        .image_dir(dir.path().join("pages"))
        .raw_text_path(dir.path().join("raw.txt"))
        .corrected_path(dir.path().join("corrected.txt"))
        .build()
        .unwrap();

    let output = shuddhi::run(scan.to_str().unwrap(), &config)
        .await
        .expect("live run should complete");

    assert!(output.stats.total_batches > 0);
    assert!(
        output.stats.corrected_batches + output.stats.failed_batches
            == output.stats.total_batches
    );
    let artifact = read_artifact(&config).await;
    assert!(!artifact.trim().is_empty());
    println!(
        "live run: {}/{} batches corrected",
        output.stats.corrected_batches, output.stats.total_batches
    );
}
