//! CLI binary for shuddhi.
//!
//! A thin shim over the library crate that maps CLI flags to `RunConfig`
//! and prints per-page / per-batch progress plus a final summary.

use anyhow::{Context, Result};
use clap::Parser;
use shuddhi::{
    extract_text, run, CorrectionProvider, OcrBackend, RunConfig, RunProgressCallback,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use indicatif::{ProgressBar, ProgressStyle};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar that first tracks page extraction,
/// then resets to track batch correction. The pipeline is sequential, so
/// events arrive in order and the bar never has to cope with out-of-order
/// completion.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(spinner_style());
        bar.set_prefix("Preparing");
        bar.set_message("Opening document…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate(&self, prefix: &'static str, unit: &'static str, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(bar_style(unit));
        self.bar.set_prefix(prefix);
        self.bar.reset_eta();
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"])
}

fn bar_style(unit: &'static str) -> ProgressStyle {
    ProgressStyle::with_template(&format!(
        "{{spinner:.cyan}} {{prefix:.bold}}  \
         [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {unit}  \
         ⏱ {{elapsed_precise}}  ETA {{eta_precise}}"
    ))
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"])
}

impl RunProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.activate("Extracting", "pages", total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Running OCR on {total_pages} pages…"))
        ));
    }

    fn on_page_extracted(&self, page_num: usize, total: usize, chars: usize) {
        self.bar.println(format!(
            "  {} Page  {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{chars:>5} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Page  {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(&truncate(error, 80)),
        ));
        self.bar.inc(1);
    }

    fn on_correction_start(&self, total_batches: usize, resumed: usize) {
        self.activate("Correcting", "batches", total_batches);
        self.bar.set_position(resumed as u64);
        if resumed > 0 {
            self.bar.println(format!(
                "{} {}",
                cyan("◆"),
                bold(&format!(
                    "Resuming correction at batch {}/{total_batches}…",
                    resumed + 1
                ))
            ));
        } else {
            self.bar.println(format!(
                "{} {}",
                cyan("◆"),
                bold(&format!("Correcting {total_batches} batches…"))
            ));
        }
    }

    fn on_batch_start(&self, batch_num: usize, _total: usize) {
        self.bar.set_message(format!("batch {batch_num}"));
    }

    fn on_batch_complete(&self, batch_num: usize, total: usize, chars: usize, retries: u32) {
        let retry_note = if retries > 0 {
            dim(&format!("  ({retries} retries)"))
        } else {
            String::new()
        };
        self.bar.println(format!(
            "  {} Batch {:>3}/{:<3}  {}{}",
            green("✓"),
            batch_num,
            total,
            dim(&format!("{chars:>5} chars")),
            retry_note,
        ));
        self.bar.inc(1);
    }

    fn on_batch_error(&self, batch_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Batch {:>3}/{:<3}  {}",
            red("✗"),
            batch_num,
            total,
            red(&truncate(error, 80)),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_batches: usize, corrected: usize, failed: usize) {
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} batches corrected successfully",
                green("✔"),
                bold(&corrected.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} batches corrected  ({} failed)",
                if corrected == 0 { red("✘") } else { cyan("⚠") },
                bold(&corrected.to_string()),
                total_batches,
                red(&failed.to_string()),
            );
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{cut}\u{2026}")
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic transcription (tesseract + OpenAI, key from OPENAI_API_KEY)
  shuddhi scans/dhammapada.pdf

  # Free correction via OpenRouter
  shuddhi --provider openrouter scans/dhammapada.pdf

  # Cloud OCR for a degraded scan
  shuddhi --ocr google-vision scans/old-print.pdf

  # Raw OCR only, no correction credits spent
  shuddhi --ocr-only scans/dhammapada.pdf

  # Custom batch size and retry budget
  shuddhi --max-batch-chars 1000 --max-retries 5 scans/dhammapada.pdf

  # Redo everything, ignoring artifacts from a previous run
  shuddhi --no-resume scans/dhammapada.pdf

  # Machine-readable run report
  shuddhi --json scans/dhammapada.pdf > report.json

RESUMING:
  Interrupt freely. The raw OCR text is kept in --raw-output after the
  extraction stage, and every corrected batch is flushed to --output as it
  completes; rerunning the same command continues from the first
  unprocessed batch. After a run with failed batches, rerun with
  --no-resume to rebuild the output from scratch.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (provider: openai)
  OPENROUTER_API_KEY      OpenRouter API key (provider: openrouter)
  GOOGLE_VISION_API_KEY   Google Cloud Vision API key (--ocr google-vision)
  PDFIUM_LIB_PATH         Path to an existing libpdfium

SETUP:
  1. Install tesseract with Devanagari data:  apt install tesseract-ocr tesseract-ocr-san tesseract-ocr-hin
  2. Set an API key:                          export OPENAI_API_KEY=sk-...
  3. Transcribe:                              shuddhi scan.pdf -o corrected.txt
"#;

/// Transcribe scanned Devanagari documents via OCR plus LLM correction.
#[derive(Parser, Debug)]
#[command(
    name = "shuddhi",
    version,
    about = "Transcribe scanned Pali/Sanskrit/Hindi documents (OCR + LLM correction)",
    long_about = "Transcribe scanned Devanagari books into clean text. Pages are rasterised \
with pdfium, read by tesseract or Google Cloud Vision, and the raw OCR text is repaired in \
batches by an LLM correction service (OpenAI or OpenRouter).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the scanned PDF.
    input: String,

    /// Corrected-output file.
    #[arg(short, long, env = "SHUDDHI_OUTPUT", default_value = "corrected.txt")]
    output: PathBuf,

    /// Raw OCR text file (the resume point between OCR and correction).
    #[arg(long, env = "SHUDDHI_RAW_OUTPUT", default_value = "raw_ocr.txt")]
    raw_output: PathBuf,

    /// Directory for rendered page images.
    #[arg(long, env = "SHUDDHI_IMAGE_DIR", default_value = "pdf_pages")]
    image_dir: PathBuf,

    /// OCR backend.
    #[arg(long, env = "SHUDDHI_OCR", value_enum, default_value = "tesseract")]
    ocr: OcrArg,

    /// Tesseract language string.
    #[arg(long, env = "SHUDDHI_LANGUAGES", default_value = "san+hin")]
    languages: String,

    /// Correction provider.
    #[arg(long, env = "SHUDDHI_PROVIDER", value_enum, default_value = "openai")]
    provider: ProviderArg,

    /// Correction model ID (defaults to the provider's default).
    #[arg(
        long,
        env = "SHUDDHI_MODEL",
        long_help = "Correction model. Defaults: gpt-4o (openai), \
          deepseek/deepseek-r1-0528:free (openrouter)."
    )]
    model: Option<String>,

    /// Max batch size in characters.
    #[arg(long, env = "SHUDDHI_MAX_BATCH_CHARS", default_value_t = 1500)]
    max_batch_chars: usize,

    /// Total correction attempts per batch.
    #[arg(long, env = "SHUDDHI_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Wait between attempts on the same batch, in milliseconds.
    #[arg(long, env = "SHUDDHI_RETRY_DELAY_MS", default_value_t = 2000)]
    retry_delay_ms: u64,

    /// Wait between successive batches, in milliseconds.
    #[arg(long, env = "SHUDDHI_REQUEST_DELAY_MS", default_value_t = 1000)]
    request_delay_ms: u64,

    /// Per-attempt correction timeout in seconds.
    #[arg(long, env = "SHUDDHI_API_TIMEOUT", default_value_t = 30)]
    api_timeout: u64,

    /// Correction temperature (0.0–2.0).
    #[arg(long, env = "SHUDDHI_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Rendering DPI (72–400).
    #[arg(long, env = "SHUDDHI_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Path to a text file containing a custom correction instruction.
    #[arg(long, env = "SHUDDHI_INSTRUCTION")]
    instruction: Option<PathBuf>,

    /// Start fresh: ignore existing raw-text and corrected artifacts.
    #[arg(long, env = "SHUDDHI_NO_RESUME")]
    no_resume: bool,

    /// Stop after writing the raw OCR text; skip correction.
    #[arg(long)]
    ocr_only: bool,

    /// Output the structured run report as JSON instead of a summary.
    #[arg(long, env = "SHUDDHI_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "SHUDDHI_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SHUDDHI_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SHUDDHI_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OcrArg {
    Tesseract,
    GoogleVision,
}

impl From<OcrArg> for OcrBackend {
    fn from(v: OcrArg) -> Self {
        match v {
            OcrArg::Tesseract => OcrBackend::Tesseract,
            OcrArg::GoogleVision => OcrBackend::GoogleVision,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ProviderArg {
    Openai,
    Openrouter,
}

impl From<ProviderArg> for CorrectionProvider {
    fn from(v: ProviderArg) -> Self {
        match v {
            ProviderArg::Openai => CorrectionProvider::OpenAi,
            ProviderArg::Openrouter => CorrectionProvider::OpenRouter,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli, show_progress).await?;

    // ── OCR-only mode ────────────────────────────────────────────────────
    if cli.ocr_only {
        let raw = extract_text(&cli.input, &config)
            .await
            .context("OCR extraction failed")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} chars of raw OCR text  →  {}",
                green("✔"),
                raw.chars().count(),
                bold(&config.raw_text_path.display().to_string()),
            );
        }
        return Ok(());
    }

    // ── Run the full pipeline ────────────────────────────────────────────
    let output = run(&cli.input, &config)
        .await
        .context("Transcription failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise report")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(json.as_bytes())
            .and_then(|_| handle.write_all(b"\n"))
            .context("Failed to write to stdout")?;
    } else if !cli.quiet {
        // Summary (the callback already printed the final green/red tick).
        let s = &output.stats;
        eprintln!(
            "{}  {}/{} batches  {} failed  {} resumed  {}ms  →  {}",
            if s.failed_batches == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            s.corrected_batches,
            s.total_batches,
            s.failed_batches,
            s.resumed_batches,
            s.total_duration_ms,
            bold(&output.corrected_path.display().to_string()),
        );
        eprintln!(
            "   {} raw chars in  /  {} corrected chars out",
            dim(&s.raw_chars.to_string()),
            dim(&s.corrected_chars.to_string()),
        );
    }

    // Failed batches are not fatal to the run, but a non-zero exit lets
    // shell pipelines notice them.
    if output.stats.failed_batches > 0 {
        std::process::exit(2);
    }

    Ok(())
}

/// Map CLI args to `RunConfig`.
async fn build_config(cli: &Cli, show_progress: bool) -> Result<RunConfig> {
    let instruction = if let Some(ref path) = cli.instruction {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read instruction from {path:?}"))?,
        )
    } else {
        None
    };

    let mut builder = RunConfig::builder()
        .image_dir(cli.image_dir.clone())
        .raw_text_path(cli.raw_output.clone())
        .corrected_path(cli.output.clone())
        .ocr_backend(cli.ocr.clone().into())
        .ocr_languages(cli.languages.clone())
        .provider(cli.provider.clone().into())
        .max_batch_chars(cli.max_batch_chars)
        .max_retries(cli.max_retries)
        .retry_delay_ms(cli.retry_delay_ms)
        .request_delay_ms(cli.request_delay_ms)
        .api_timeout_secs(cli.api_timeout)
        .temperature(cli.temperature)
        .dpi(cli.dpi)
        .resume(!cli.no_resume);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(instruction) = instruction {
        builder = builder.instruction(instruction);
    }
    if show_progress {
        builder = builder.progress_callback(CliProgressCallback::new());
    }

    builder.build().context("Invalid configuration")
}
