//! Pipeline stages for statement extraction.
//!
//! Each submodule implements exactly one step so each can be tested alone.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ text ──▶ llm ──▶ postprocess
//! (path)   (lopdf)  (chat)   (JSON parse)
//! ```
//!
//! 1. [`input`]: validate the user-supplied path is a readable PDF
//! 2. [`text`]: extract per-page plain text, skipping empty pages
//! 3. [`llm`]: one chat-completion call per page; the only stage with
//!    network I/O
//! 4. [`postprocess`]: strip fences and parse the answer as transactions

pub mod input;
pub mod llm;
pub mod postprocess;
pub mod text;
