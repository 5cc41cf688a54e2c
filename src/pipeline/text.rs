//! PDF text extraction: one plain-text string per page via `lopdf`.
//!
//! [`PageTexts`] owns the parsed document and walks its pages lazily; the
//! document is released when the iterator is dropped, whichever way the
//! caller stops consuming it. Pages whose text is empty or whitespace-only
//! (scanned images, blank separators) are skipped without a placeholder.
//!
//! Parsing is CPU-bound and synchronous, so the async entry point
//! [`read_page_texts`] runs it on the blocking pool.

use crate::error::ExtractError;
use crate::output::PdfInfo;
use lopdf::Document;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Extracted text of one PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-indexed PDF page number.
    pub page_num: u32,
    pub text: String,
}

/// Lazy, single-pass iterator over the non-empty pages of a document.
pub struct PageTexts {
    document: Document,
    page_count: usize,
    remaining: std::vec::IntoIter<u32>,
}

impl PageTexts {
    /// Open and parse the PDF at `path`.
    pub fn open(path: &Path) -> Result<Self, lopdf::Error> {
        Ok(Self::from_document(Document::load(path)?))
    }

    /// Parse an in-memory PDF.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, lopdf::Error> {
        Ok(Self::from_document(Document::load_mem(bytes)?))
    }

    pub fn from_document(document: Document) -> Self {
        let pages: Vec<u32> = document.get_pages().keys().copied().collect();
        Self {
            page_count: pages.len(),
            remaining: pages.into_iter(),
            document,
        }
    }

    /// Total pages in the document, with or without text.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl Iterator for PageTexts {
    type Item = PageText;

    fn next(&mut self) -> Option<PageText> {
        for page_num in self.remaining.by_ref() {
            match self.document.extract_text(&[page_num]) {
                Ok(text) if !text.trim().is_empty() => return Some(PageText { page_num, text }),
                Ok(_) => debug!("Page {}: no extractable text, skipped", page_num),
                Err(e) => warn!("Page {}: text extraction failed, skipped: {}", page_num, e),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining.len()))
    }
}

/// Outcome of reading a PDF's text.
///
/// Opening the document never fails the caller: an unreadable file is
/// reported and surfaces as [`TextOutcome::Unreadable`], which callers treat
/// as "zero pages".
#[derive(Debug, Clone, PartialEq)]
pub enum TextOutcome {
    Pages {
        /// Pages in the document, including those without text.
        page_count: usize,
        /// Non-empty pages, in page order.
        pages: Vec<PageText>,
    },
    Unreadable {
        reason: String,
    },
}

impl TextOutcome {
    /// Non-empty pages; empty slice when unreadable.
    pub fn pages(&self) -> &[PageText] {
        match self {
            TextOutcome::Pages { pages, .. } => pages,
            TextOutcome::Unreadable { .. } => &[],
        }
    }
}

/// Blocking: open `path` and collect every non-empty page.
pub fn collect_page_texts(path: &Path) -> TextOutcome {
    match PageTexts::open(path) {
        Ok(iter) => {
            let page_count = iter.page_count();
            let pages: Vec<PageText> = iter.collect();
            info!(
                "Extracted text from {}/{} pages of {}",
                pages.len(),
                page_count,
                path.display()
            );
            TextOutcome::Pages { page_count, pages }
        }
        Err(e) => {
            error!("Error reading PDF {}: {}", path.display(), e);
            TextOutcome::Unreadable {
                reason: e.to_string(),
            }
        }
    }
}

/// Read all page texts on the blocking thread pool.
pub async fn read_page_texts(path: &Path) -> TextOutcome {
    let owned: PathBuf = path.to_path_buf();
    match tokio::task::spawn_blocking(move || collect_page_texts(&owned)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("PDF reader task failed: {}", e);
            TextOutcome::Unreadable {
                reason: format!("reader task failed: {e}"),
            }
        }
    }
}

/// Blocking implementation of [`inspect_pdf`].
fn inspect_blocking(path: &Path) -> Result<PdfInfo, ExtractError> {
    let iter = PageTexts::open(path).map_err(|e| ExtractError::UnreadablePdf {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let pdf_version = iter.document().version.clone();
    let is_encrypted = iter.document().is_encrypted();
    let page_count = iter.page_count();
    let text_pages = iter.count();
    Ok(PdfInfo {
        page_count,
        text_pages,
        pdf_version,
        is_encrypted,
    })
}

/// Gather page counts and version info without contacting the API.
pub async fn inspect_pdf(path: &Path) -> Result<PdfInfo, ExtractError> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || inspect_blocking(&owned))
        .await
        .map_err(|e| ExtractError::Internal(format!("Inspect task panicked: {}", e)))?
}
