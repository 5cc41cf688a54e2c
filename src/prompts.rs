//! Prompts sent to the chat-completion model.
//!
//! Kept in one place so unit tests can inspect them without a live model.
//! Callers can override the system instruction via
//! [`crate::config::ExtractionConfig::system_prompt`]; the user prompt is
//! fixed.

/// Default system instruction.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a precise financial data extraction assistant.";

/// Build the user prompt for one page of statement text.
///
/// The output is a pure function of `page_text`, so two runs over the same
/// PDF send byte-identical requests.
pub fn transaction_prompt(page_text: &str) -> String {
    format!(
        "Extract all bank transactions from the following text.\n\
         Output JSON array only.\n\
         Each object must have: date (dd-mm-yyyy), details, amount (negative for debits, positive for credits).\n\
         Ignore balance values. Skip headers.\n\
         \n\
         Text:\n\
         {page_text}\n"
    )
}
