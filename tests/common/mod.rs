//! Shared fixtures: generated PDFs, scripted providers, a counting limiter.

#![allow(dead_code)]

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use statement2json::{ChatProvider, ChatRequest, ProviderError, RateLimiter};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Build a PDF with one page per entry; `None` pages carry no text at all,
/// like a scanned image.
pub fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = match text {
            Some(t) => vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![50.into(), 780.into()]),
                Operation::new("Tj", vec![Object::string_literal(*t)]),
                Operation::new("ET", vec![]),
            ],
            None => vec![Operation::new("q", vec![]), Operation::new("Q", vec![])],
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

pub fn write_pdf(path: &Path, pages: &[Option<&str>]) {
    std::fs::write(path, build_pdf(pages)).unwrap();
}

/// Answers requests in order from a fixed script; `[]` once exhausted.
/// Every request is recorded.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(answers: &[&str]) -> Self {
        Self::new(answers.iter().map(|a| Ok(a.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// User-prompt text of the n-th request.
    pub fn user_prompt(&self, n: usize) -> String {
        self.requests.lock().unwrap()[n].messages[1].content.clone()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("[]".to_string()))
    }
}

/// Rate limiter that only counts how often it was awaited.
#[derive(Default)]
pub struct CountingLimiter {
    waits: AtomicUsize,
}

impl CountingLimiter {
    pub fn waits(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateLimiter for CountingLimiter {
    async fn wait(&self) {
        self.waits.fetch_add(1, Ordering::SeqCst);
    }
}

/// Route library logs to the test harness; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("statement2json=debug"))
        .with_test_writer()
        .try_init();
}

pub const COFFEE: &str = r#"[{"date":"01-01-2024","details":"Coffee","amount":-3.50}]"#;
