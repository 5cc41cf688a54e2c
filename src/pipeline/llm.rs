//! Model interaction: turn one page of text into transactions.
//!
//! Thin by intent: prompts live in [`crate::prompts`], HTTP in
//! [`crate::provider`], response cleanup in
//! [`crate::pipeline::postprocess`]. There is no retry: a failed call or an
//! unparseable answer drops the page and the pipeline moves on.

use crate::config::ExtractionConfig;
use crate::error::PageError;
use crate::output::{PageOutcome, PageResult};
use crate::pipeline::postprocess;
use crate::pipeline::text::PageText;
use crate::prompts::{transaction_prompt, DEFAULT_SYSTEM_PROMPT};
use crate::provider::{ChatMessage, ChatProvider, ChatRequest};
use std::time::Instant;
use tracing::{debug, warn};

/// Build the request for one page.
pub fn build_request(page_text: &str, config: &ExtractionConfig) -> ChatRequest {
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    ChatRequest {
        model: config.model.clone(),
        messages: vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(transaction_prompt(page_text)),
        ],
        temperature: config.temperature,
    }
}

/// Send one page to the model and parse its answer.
///
/// Always returns a `PageResult`; failures are recorded as
/// [`PageOutcome::Dropped`] so one bad page never aborts the statement.
pub async fn process_page(
    provider: &dyn ChatProvider,
    page: &PageText,
    config: &ExtractionConfig,
) -> PageResult {
    let start = Instant::now();
    let request = build_request(&page.text, config);

    let mut skipped_records = 0;
    let outcome = match provider.complete(&request).await {
        Ok(content) => match postprocess::parse_transactions(&content) {
            Ok(parsed) => {
                debug!(
                    "Page {}: {} transactions from {}",
                    page.page_num,
                    parsed.transactions.len(),
                    provider.name()
                );
                if parsed.skipped > 0 {
                    warn!(
                        "Page {}: skipped {} array elements that were not transactions",
                        page.page_num, parsed.skipped
                    );
                }
                skipped_records = parsed.skipped;
                PageOutcome::Extracted(parsed.transactions)
            }
            Err(detail) => {
                warn!("Page {}: could not parse model output: {}", page.page_num, detail);
                PageOutcome::Dropped(PageError::MalformedResponse {
                    page: page.page_num,
                    detail,
                })
            }
        },
        Err(e) => {
            let err = e.into_page_error(page.page_num);
            warn!("{}", err);
            PageOutcome::Dropped(err)
        }
    };

    PageResult {
        page_num: page.page_num,
        outcome,
        skipped_records,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}
