//! Output types: transactions, per-page results and run statistics.

use crate::error::PageError;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Number;

/// One bank transaction as extracted by the model.
///
/// Serialises to exactly `{"date", "details", "amount"}` in that order.
/// Any additional keys in the model's answer are ignored on the way in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Booking date, `dd-mm-yyyy` as requested in the prompt. Not validated.
    pub date: String,
    /// Free-text description from the statement line.
    pub details: String,
    /// Negative for debits, positive for credits. Integers stay integers.
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Number,
}

impl Transaction {
    /// Amount as a float, for arithmetic.
    pub fn amount_f64(&self) -> f64 {
        self.amount.as_f64().unwrap_or(f64::NAN)
    }
}

/// Accept `-3.5` as well as `"-3.50"` or `"1,250.00"`: models are not
/// consistent about quoting numbers.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Number, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(Number),
        Text(String),
    }

    match RawAmount::deserialize(deserializer)? {
        RawAmount::Number(n) => Ok(n),
        RawAmount::Text(s) => parse_amount(&s)
            .ok_or_else(|| de::Error::custom(format!("invalid amount: {s:?}"))),
    }
}

fn parse_amount(s: &str) -> Option<Number> {
    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if let Ok(n) = cleaned.parse::<i64>() {
        return Some(Number::from(n));
    }
    cleaned.parse::<f64>().ok().and_then(Number::from_f64)
}

/// What a single page produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PageOutcome {
    /// The model answered with a well-formed array. May be empty when the
    /// page genuinely holds no transactions (cover page, terms, summary).
    Extracted(Vec<Transaction>),
    /// Nothing usable came back; the page contributes zero transactions.
    Dropped(PageError),
}

/// Result of sending one page through the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed PDF page number.
    pub page_num: u32,
    pub outcome: PageOutcome,
    /// Array elements that were not transaction records and were skipped.
    #[serde(default)]
    pub skipped_records: usize,
    /// Wall-clock time of the API call.
    pub duration_ms: u64,
}

impl PageResult {
    /// Transactions found on this page; empty when dropped.
    pub fn transactions(&self) -> &[Transaction] {
        match &self.outcome {
            PageOutcome::Extracted(txs) => txs,
            PageOutcome::Dropped(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&PageError> {
        match &self.outcome {
            PageOutcome::Extracted(_) => None,
            PageOutcome::Dropped(e) => Some(e),
        }
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self.outcome, PageOutcome::Dropped(_))
    }
}

/// Aggregate numbers for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the PDF.
    pub total_pages: usize,
    /// Pages that had extractable text and were sent to the model.
    pub text_pages: usize,
    /// Pages whose API call or response parsing failed.
    pub failed_pages: usize,
    /// Pages for which the model returned an empty array.
    pub empty_pages: usize,
    pub transaction_count: usize,
    /// Array elements skipped across all pages because they were not
    /// transaction records.
    pub skipped_records: usize,
    pub total_duration_ms: u64,
    /// Sum of per-page API call times; excludes rate-limit waits.
    pub llm_duration_ms: u64,
}

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Flat collection in page order, then model order within a page.
    pub transactions: Vec<Transaction>,
    pub pages: Vec<PageResult>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// Render the transaction collection the way it is written to disk:
    /// a 2-space indented JSON array, no trailing newline.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.transactions)
    }
}

/// PDF facts gathered without contacting the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfInfo {
    pub page_count: usize,
    /// Pages with non-empty extracted text.
    pub text_pages: usize,
    pub pdf_version: String,
    pub is_encrypted: bool,
}
