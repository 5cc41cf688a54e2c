//! Error types for the statement2json library.
//!
//! Two error types reflect the two failure modes, plus one for the provider
//! seam:
//!
//! * [`ExtractError`]: **fatal**, the run cannot produce output at all
//!   (missing credential, unreadable PDF, no text, no transactions, output
//!   not writable). Returned as `Err(ExtractError)` from the top-level
//!   `extract*` functions.
//!
//! * [`PageError`]: **non-fatal**, the model call for a single page failed
//!   or returned something that is not a transaction array. Stored inside
//!   [`crate::output::PageResult`]; the page contributes zero transactions and
//!   the run continues with the remaining pages.
//!
//! * [`ProviderError`]: what a [`crate::provider::ChatProvider`] returns;
//!   turned into a [`PageError`] once the page number is known.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the statement2json library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No API key was given explicitly or through the environment.
    #[error("API key required. Use --api-key or set the GROQ_API_KEY environment variable.")]
    MissingApiKey,

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The PDF could not be opened or parsed.
    #[error("Failed to read PDF '{path}': {detail}")]
    UnreadablePdf { path: PathBuf, detail: String },

    /// The PDF opened fine but not a single page had extractable text
    /// (typically a scanned, image-only statement).
    #[error("No extractable text in '{path}' ({page_count} pages inspected)")]
    NoExtractableText { path: PathBuf, page_count: usize },

    /// Every page was processed and the collection is still empty.
    #[error("No transactions found in {pages} pages ({failed} failed)")]
    NoTransactions { pages: usize, failed: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// The page is treated as having zero transactions; the run carries on.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The endpoint answered with something other than HTTP 200.
    #[error("Page {page}: API error {status}: {body}")]
    HttpStatus { page: u32, status: u16, body: String },

    /// The request never got a response (DNS, TLS, connection reset, timeout).
    #[error("Page {page}: request failed: {detail}")]
    Transport { page: u32, detail: String },

    /// HTTP 200, but the completion text is not a JSON transaction array.
    #[error("Page {page}: malformed model response: {detail}")]
    MalformedResponse { page: u32, detail: String },
}

/// Failure of a single chat-completion call, before it is attributed to a page.
///
/// Returned by [`crate::provider::ChatProvider::complete`]; the pipeline maps
/// it onto [`PageError`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Any status other than 200. `body` is the raw response text.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// No response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP 200 but the envelope lacks `choices[0].message.content`.
    #[error("unexpected response body: {0}")]
    InvalidBody(String),
}

impl ProviderError {
    /// Attach the page number.
    pub fn into_page_error(self, page: u32) -> PageError {
        match self {
            ProviderError::Status { status, body } => PageError::HttpStatus { page, status, body },
            ProviderError::Transport(detail) => PageError::Transport { page, detail },
            ProviderError::InvalidBody(detail) => PageError::MalformedResponse { page, detail },
        }
    }
}

impl PageError {
    /// 1-indexed PDF page the error belongs to.
    pub fn page(&self) -> u32 {
        match self {
            PageError::HttpStatus { page, .. }
            | PageError::Transport { page, .. }
            | PageError::MalformedResponse { page, .. } => *page,
        }
    }
}
