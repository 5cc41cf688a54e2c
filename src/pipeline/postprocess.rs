//! Cleanup and parsing of the model's completion text.
//!
//! The prompt asks for a bare JSON array, but chat models regularly wrap it
//! in a ```` ```json ```` fence or prefix it with a byte-order mark. These
//! rules strip that wrapping and nothing else; the remaining text must parse
//! as a JSON array or the page is dropped.
//!
//! Rules (applied in order):
//! 1. Strip invisible Unicode (BOM, zero-width spaces and joiners)
//! 2. Strip an outer Markdown code fence
//! 3. Parse as a JSON array
//! 4. Convert each element to a [`Transaction`]; elements of the wrong shape
//!    are skipped, the rest of the page is kept

use crate::output::Transaction;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

/// Records recovered from one completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTransactions {
    pub transactions: Vec<Transaction>,
    /// Elements that could not be read as a transaction.
    pub skipped: usize,
}

/// Clean `raw` and parse it as a transaction array.
///
/// Fails only when the text is not a JSON array; returns the parser's
/// message in that case.
pub fn parse_transactions(raw: &str) -> Result<ParsedTransactions, String> {
    let s = remove_invisible_chars(raw);
    let s = strip_code_fences(&s);
    let items = match serde_json::from_str::<Value>(s.trim()).map_err(|e| e.to_string())? {
        Value::Array(items) => items,
        other => return Err(format!("expected a JSON array, got {}", json_kind(&other))),
    };

    let mut parsed = ParsedTransactions::default();
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Transaction>(item) {
            Ok(tx) => parsed.transactions.push(tx),
            Err(e) => {
                warn!("Skipping array element {}: {}", i, e);
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Rule 1: Strip invisible characters ───────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}'))
        .collect()
}

// ── Rule 2: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\r?\n(.*?)\r?\n?```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}
