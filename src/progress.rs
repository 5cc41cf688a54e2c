//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline walks the statement. The CLI uses this to drive its
//! progress bar; library callers can forward events anywhere they like.
//!
//! # Example
//!
//! ```rust
//! use statement2json::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     found: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: u32, total_pages: usize, transactions: usize) {
//!         self.found.fetch_add(transactions, Ordering::SeqCst);
//!         eprintln!("Page {}/{}: {} transactions", page_num, total_pages, transactions);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { found: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each page.
///
/// Pages are processed one after another, so events arrive in page order.
/// All methods have default no-op implementations.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once the PDF text is available.
    ///
    /// # Arguments
    /// * `text_pages`: number of pages that will be sent to the model
    fn on_extraction_start(&self, text_pages: usize) {
        let _ = text_pages;
    }

    /// Called just before the API request is sent for a page.
    fn on_page_start(&self, page_num: u32, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when the model returned a well-formed array for a page.
    ///
    /// # Arguments
    /// * `transactions`: records found on this page (may be 0)
    fn on_page_complete(&self, page_num: u32, total_pages: usize, transactions: usize) {
        let _ = (page_num, total_pages, transactions);
    }

    /// Called when a page was dropped.
    fn on_page_error(&self, page_num: u32, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called while the pipeline waits on the rate limiter.
    fn on_rate_limit_wait(&self, page_num: u32) {
        let _ = page_num;
    }

    /// Called once after all pages have been attempted.
    ///
    /// # Arguments
    /// * `text_pages`: pages sent to the model
    /// * `transactions`: size of the final collection
    fn on_extraction_complete(&self, text_pages: usize, transactions: usize) {
        let _ = (text_pages, transactions);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
