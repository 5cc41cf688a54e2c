//! # statement2json
//!
//! Extract bank transactions from PDF statements into JSON with a
//! chat-completion LLM.
//!
//! ## Why an LLM?
//!
//! Every bank lays its statements out differently: column order, date
//! formats, debit/credit conventions, wrapped descriptions, running balances.
//! Instead of one parser per bank, this crate pulls the plain text of each
//! page and asks a model to return the transactions as a JSON array.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input   validate path and %PDF magic
//!  ├─ 2. Text    per-page plain text via lopdf (empty pages skipped)
//!  ├─ 3. LLM     one chat-completion call per page, 8 s apart
//!  ├─ 4. Parse   strip fences, parse [{date, details, amount}]
//!  └─ 5. Output  flat array in page order → pretty-printed JSON file
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use statement2json::{extract_to_file, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key and model from GROQ_API_KEY / GROQ_MODEL
//!     let config = ExtractionConfig::from_env().build()?;
//!     let stats = extract_to_file("statement.pdf", "transactions.json", &config).await?;
//!     eprintln!("{} transactions from {} pages", stats.transaction_count, stats.text_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `extract` and `extract-setup-check` binaries |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pacing;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod setup;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ApiKey, ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ExtractError, PageError, ProviderError};
pub use extract::{extract_from_bytes, extract_sync, extract_to_file, extract_transactions, inspect};
pub use output::{ExtractionOutput, ExtractionStats, PageOutcome, PageResult, PdfInfo, Transaction};
pub use pacing::{FixedInterval, NoDelay, RateLimiter};
pub use pipeline::text::{PageText, PageTexts, TextOutcome};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use provider::{ChatMessage, ChatProvider, ChatRequest, GroqProvider};
pub use setup::SetupReport;
