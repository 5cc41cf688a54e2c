//! Pipeline orchestration: PDF → per-page model calls → one JSON array.
//!
//! Pages are handled strictly one after another. After every page the
//! configured [`crate::pacing::RateLimiter`] is awaited, success or failure,
//! including after the last page. Nothing is written to disk unless the run
//! produced at least one transaction.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::{ExtractionOutput, ExtractionStats, PageOutcome, PageResult, PdfInfo, Transaction};
use crate::pipeline::{input, llm, text};
use crate::provider::{ChatProvider, GroqProvider};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extract every transaction from a PDF statement.
///
/// # Errors
/// Returns `Err(ExtractError)` only for fatal conditions:
/// - no API key (checked before the PDF is touched)
/// - file missing, unreadable or not a PDF
/// - no page with extractable text
/// - every page processed and still zero transactions
///
/// Individual page failures are recorded in `output.pages` and counted in
/// `output.stats.failed_pages`.
pub async fn extract_transactions(
    pdf_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();
    let pdf_path = pdf_path.as_ref();
    info!("Processing PDF: {}", pdf_path.display());

    // ── Step 1: Resolve provider ─────────────────────────────────────────
    let provider = resolve_provider(config)?;

    // ── Step 2: Read page text ───────────────────────────────────────────
    let pdf_path = input::resolve_local(pdf_path)?;
    let (total_pages, pages) = match text::read_page_texts(&pdf_path).await {
        text::TextOutcome::Pages { page_count, pages } => (page_count, pages),
        text::TextOutcome::Unreadable { reason } => {
            return Err(ExtractError::UnreadablePdf {
                path: pdf_path,
                detail: reason,
            })
        }
    };
    if pages.is_empty() {
        return Err(ExtractError::NoExtractableText {
            path: pdf_path,
            page_count: total_pages,
        });
    }
    info!("Extracted text from {} pages", pages.len());

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(pages.len());
    }

    // ── Step 3: One model call per page, then wait ───────────────────────
    let text_pages = pages.len();
    let mut transactions: Vec<Transaction> = Vec::new();
    let mut results: Vec<PageResult> = Vec::with_capacity(text_pages);

    for (i, page) in pages.iter().enumerate() {
        info!("Processing page {}/{}", i + 1, text_pages);
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page.page_num, text_pages);
        }

        let result = llm::process_page(provider.as_ref(), page, config).await;

        if let Some(ref cb) = config.progress_callback {
            match &result.outcome {
                PageOutcome::Extracted(txs) => {
                    cb.on_page_complete(page.page_num, text_pages, txs.len())
                }
                PageOutcome::Dropped(e) => {
                    cb.on_page_error(page.page_num, text_pages, &e.to_string())
                }
            }
        }

        transactions.extend_from_slice(result.transactions());
        results.push(result);

        if let Some(ref cb) = config.progress_callback {
            cb.on_rate_limit_wait(page.page_num);
        }
        config.rate_limiter.wait().await;
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(text_pages, transactions.len());
    }

    // ── Step 4: Stats ────────────────────────────────────────────────────
    let failed_pages = results.iter().filter(|r| r.is_dropped()).count();
    let skipped_records = results.iter().map(|r| r.skipped_records).sum();
    let llm_duration_ms = results.iter().map(|r| r.duration_ms).sum();
    let empty_pages = results
        .iter()
        .filter(|r| matches!(&r.outcome, PageOutcome::Extracted(t) if t.is_empty()))
        .count();

    if transactions.is_empty() {
        return Err(ExtractError::NoTransactions {
            pages: text_pages,
            failed: failed_pages,
        });
    }

    let stats = ExtractionStats {
        total_pages,
        text_pages,
        failed_pages,
        empty_pages,
        transaction_count: transactions.len(),
        skipped_records,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        llm_duration_ms,
    };

    info!(
        "Extracted {} transactions ({} of {} pages failed)",
        stats.transaction_count, failed_pages, text_pages
    );

    Ok(ExtractionOutput {
        transactions,
        pages: results,
        stats,
    })
}

/// Extract transactions and write them to `output_path` as a JSON array.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// partial file; an existing file at `output_path` is replaced.
pub async fn extract_to_file(
    pdf_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, ExtractError> {
    let output = extract_transactions(pdf_path, config).await?;
    write_output(&output, output_path.as_ref()).await?;
    Ok(output.stats)
}

/// Write the transaction array to `path` via a sibling `.json.tmp` file.
async fn write_output(output: &ExtractionOutput, path: &Path) -> Result<(), ExtractError> {
    let json = output
        .to_json()
        .map_err(|e| ExtractError::Internal(format!("Failed to serialise transactions: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ExtractError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    // A failed write or rename removes the temp file; `path` is untouched.
    let tmp_path = path.with_extension("json.tmp");
    if let Err(e) = tokio::fs::write(&tmp_path, json.as_bytes()).await {
        tokio::fs::remove_file(&tmp_path).await.ok();
        return Err(ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        });
    }

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        tokio::fs::remove_file(&tmp_path).await.ok();
        return Err(ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        });
    }

    info!(
        "Saved {} transactions to {}",
        output.stats.transaction_count,
        path.display()
    );
    Ok(())
}

/// Synchronous wrapper around [`extract_transactions`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    pdf_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_transactions(pdf_path, config))
}

/// Extract transactions from PDF bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed on return.
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
    tmp.flush()
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
    extract_transactions(tmp.path(), config).await
}

/// Report page counts for a PDF. Does not require an API key.
pub async fn inspect(pdf_path: impl AsRef<Path>) -> Result<PdfInfo, ExtractError> {
    let path = input::resolve_local(pdf_path.as_ref())?;
    text::inspect_pdf(&path).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the provider: a pre-built one wins, otherwise an HTTP provider
/// from the configured key and endpoint.
fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn ChatProvider>, ExtractError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let provider = GroqProvider::from_config(config)?;
    debug!("Using {} with model {}", provider.endpoint(), config.model);
    Ok(Arc::new(provider))
}
