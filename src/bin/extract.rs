//! CLI binary for statement2json.
//!
//! Parses flags, builds an `ExtractionConfig`, runs the extraction and
//! reports per-page progress on stderr.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use statement2json::config::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use statement2json::{
    extract_to_file, inspect, ExtractionConfig, ExtractionProgressCallback, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── Terminal styling ─────────────────────────────────────────────────────────

/// ANSI SGR codes used by the CLI.
#[derive(Clone, Copy)]
enum Style {
    Bold = 1,
    Dim = 2,
    Red = 31,
    Green = 32,
    Yellow = 33,
}

fn paint(style: Style, s: impl std::fmt::Display) -> String {
    format!("\x1b[{}m{s}\x1b[0m", style as u8)
}

const SPINNER: &[&str] = &["◐", "◓", "◑", "◒", "●"];

// ── Progress display ─────────────────────────────────────────────────────────

/// One bar for the statement and one line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: Mutex<Option<Instant>>,
    dropped: AtomicUsize,
}

impl CliProgressCallback {
    /// Starts as a spinner; becomes a bar once the text pages are counted.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(SPINNER),
        );
        bar.set_message("Reading statement text…");
        bar.enable_steady_tick(Duration::from_millis(120));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            dropped: AtomicUsize::new(0),
        })
    }

    fn switch_to_bar(&self, pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} pages {pos}/{len} [{wide_bar:.green/dim}] {elapsed}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
        .tick_strings(SPINNER);

        self.bar.set_length(pages as u64);
        self.bar.set_position(0);
        self.bar.set_style(style);
    }

    fn take_page_secs(&self) -> f64 {
        match self.page_started.lock() {
            Ok(mut started) => started.take().map_or(0.0, |t| t.elapsed().as_secs_f64()),
            Err(_) => 0.0,
        }
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, text_pages: usize) {
        self.switch_to_bar(text_pages);
        self.bar
            .println(paint(Style::Bold, format!("{text_pages} pages with text")));
    }

    fn on_page_start(&self, page_num: u32, _total: usize) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("asking model about page {page_num}"));
    }

    fn on_page_complete(&self, page_num: u32, _total: usize, transactions: usize) {
        let secs = self.take_page_secs();
        let found = match transactions {
            0 => paint(Style::Dim, "no transactions"),
            1 => "1 transaction".to_string(),
            n => format!("{n} transactions"),
        };
        self.bar.println(format!(
            "{} page {page_num:<4}{found}  {}",
            paint(Style::Green, "+"),
            paint(Style::Dim, format!("({secs:.1}s)")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: u32, _total: usize, error: &str) {
        let secs = self.take_page_secs();
        self.dropped.fetch_add(1, Ordering::SeqCst);

        // Keep one page per terminal line.
        let shown: String = if error.chars().count() > 72 {
            error.chars().take(71).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "{} page {page_num:<4}{}  {}",
            paint(Style::Red, "x"),
            paint(Style::Red, shown),
            paint(Style::Dim, format!("({secs:.1}s)")),
        ));
        self.bar.inc(1);
    }

    fn on_rate_limit_wait(&self, page_num: u32) {
        self.bar.set_message(format!("waiting before the call after page {page_num}"));
    }

    fn on_extraction_complete(&self, text_pages: usize, _transactions: usize) {
        self.bar.finish_and_clear();
        let dropped = self.dropped.load(Ordering::SeqCst);
        if dropped > 0 {
            eprintln!(
                "{} {dropped} of {text_pages} pages were dropped",
                paint(Style::Yellow, "!"),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract to transactions.json
  extract statement.pdf

  # Choose the output file and model
  extract statement.pdf -o march.json --model llama-3.3-70b-versatile

  # Show page counts only (no API key needed)
  extract --inspect-only statement.pdf

ENVIRONMENT VARIABLES:
  GROQ_API_KEY   API key (used when --api-key is absent)
  GROQ_MODEL     Model ID (used when --model is absent)
  RUST_LOG       Log filter, e.g. RUST_LOG=statement2json=debug

  A .env file in the working directory is read at startup; variables
  already set in the environment are not overridden.
"#;

/// Extract bank transactions from PDF statements.
#[derive(Parser, Debug)]
#[command(
    name = "extract",
    version,
    about = "Extract bank transactions from PDF statements",
    long_about = "Extract bank transactions from a PDF statement into a JSON array of \
{date, details, amount} objects. Each page's text is sent to a chat-completion model \
(Groq by default); calls are spaced by a fixed delay to stay under rate limits.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the PDF bank statement file.
    pdf_file: PathBuf,

    /// Output JSON file path.
    #[arg(short, long, default_value = "transactions.json")]
    output: PathBuf,

    /// Groq API key.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// AI model to use.
    #[arg(long, env = "GROQ_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Chat-completion endpoint (any OpenAI-compatible URL).
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Seconds to wait after each API call.
    #[arg(long, default_value_t = 8)]
    delay_secs: u64,

    /// Per-request timeout in seconds (default: none).
    #[arg(long)]
    api_timeout: Option<u64>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long)]
    system_prompt: Option<PathBuf>,

    /// Print PDF page counts only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before parsing so `.env` values feed clap's `env` fallbacks.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.inspect_only;
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

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = inspect(&cli.pdf_file).await.context("Failed to inspect PDF")?;
        println!("File:         {}", cli.pdf_file.display());
        println!("Pages:        {}", info.page_count);
        println!("Text pages:   {}", info.text_pages);
        println!("PDF Version:  {}", info.pdf_version);
        println!("Encrypted:    {}", info.is_encrypted);
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;

    // ── Run extraction ───────────────────────────────────────────────────
    let stats = extract_to_file(&cli.pdf_file, &cli.output, &config)
        .await
        .context("Extraction failed")?;

    if !cli.quiet {
        eprintln!(
            "{} {} transactions from {}/{} pages in {:.1}s, saved to {}",
            if stats.failed_pages == 0 {
                paint(Style::Green, "done")
            } else {
                paint(Style::Yellow, "done")
            },
            stats.transaction_count,
            stats.text_pages - stats.failed_pages,
            stats.text_pages,
            stats.total_duration_ms as f64 / 1000.0,
            paint(Style::Bold, cli.output.display()),
        );
        if stats.skipped_records > 0 {
            eprintln!(
                "{} {} records in model answers were not transactions and were skipped",
                paint(Style::Yellow, "!"),
                stats.skipped_records
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
///
/// clap has already applied `--flag` > environment > default for the key and
/// model, so the builder starts from defaults rather than `from_env()`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .model(cli.model.clone())
        .endpoint(cli.endpoint.clone())
        .rate_limit_interval(Duration::from_secs(cli.delay_secs));

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
