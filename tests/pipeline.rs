//! Integration tests for the full extraction pipeline.
//!
//! PDFs are generated in memory with lopdf and the model is replaced by a
//! scripted provider, so these run offline and without waiting between pages.

mod common;

use common::{build_pdf, init_tracing, write_pdf, CountingLimiter, ScriptedProvider, COFFEE};
use statement2json::{
    extract_from_bytes, extract_sync, extract_to_file, extract_transactions, inspect,
    ExtractError, ExtractionConfig, ExtractionProgressCallback, PageError, PageOutcome,
    ProviderError,
};
use std::sync::{Arc, Mutex};

const COFFEE_JSON: &str = "[\n  {\n    \"date\": \"01-01-2024\",\n    \"details\": \"Coffee\",\n    \"amount\": -3.5\n  }\n]";

fn config_with(provider: &Arc<ScriptedProvider>, limiter: &Arc<CountingLimiter>) -> ExtractionConfig {
    init_tracing();
    ExtractionConfig::builder()
        .provider(provider.clone())
        .rate_limiter(limiter.clone())
        .build()
        .unwrap()
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn two_pages_one_transaction_writes_exact_json() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    let out = dir.path().join("transactions.json");
    write_pdf(&pdf, &[Some("01-01-2024 Coffee 3.50 DR"), Some("Closing balance 96.50")]);

    let provider = Arc::new(ScriptedProvider::ok(&[COFFEE, "[]"]));
    let limiter = Arc::new(CountingLimiter::default());
    let stats = extract_to_file(&pdf, &out, &config_with(&provider, &limiter))
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&out).unwrap(), COFFEE_JSON);
    assert_eq!(stats.transaction_count, 1);
    assert_eq!(stats.text_pages, 2);
    assert_eq!(stats.empty_pages, 1);
    assert_eq!(stats.failed_pages, 0);
    assert_eq!(provider.calls(), 2);
    assert_eq!(limiter.waits(), 2, "wait follows every page, including the last");
    assert!(!dir.path().join("transactions.json.tmp").exists());
}

#[tokio::test]
async fn page_text_reaches_the_prompt_in_page_order() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    write_pdf(&pdf, &[Some("FIRST PAGE"), None, Some("THIRD PAGE")]);

    let provider = Arc::new(ScriptedProvider::ok(&[COFFEE, COFFEE]));
    let limiter = Arc::new(CountingLimiter::default());
    let output = extract_transactions(&pdf, &config_with(&provider, &limiter))
        .await
        .unwrap();

    assert_eq!(provider.calls(), 2, "the empty page is never sent");
    assert!(provider.user_prompt(0).contains("FIRST PAGE"));
    assert!(provider.user_prompt(1).contains("THIRD PAGE"));
    assert!(provider.user_prompt(0).starts_with("Extract all bank transactions"));

    let pages: Vec<u32> = output.pages.iter().map(|p| p.page_num).collect();
    assert_eq!(pages, vec![1, 3]);
    assert_eq!(output.stats.total_pages, 3);
    assert_eq!(output.stats.text_pages, 2);
    assert_eq!(limiter.waits(), 2);
}

#[tokio::test]
async fn request_carries_model_and_zero_temperature() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    write_pdf(&pdf, &[Some("01-01-2024 Coffee")]);

    let provider = Arc::new(ScriptedProvider::ok(&[COFFEE]));
    let config = ExtractionConfig::builder()
        .provider(provider.clone())
        .rate_limiter(Arc::new(CountingLimiter::default()))
        .model("mixtral-8x7b-32768")
        .build()
        .unwrap();
    extract_transactions(&pdf, &config).await.unwrap();

    let request = provider.requests.lock().unwrap()[0].clone();
    assert_eq!(request.model, "mixtral-8x7b-32768");
    assert_eq!(request.temperature, 0.0);
    assert_eq!(request.messages[0].role, "system");
    assert_eq!(
        request.messages[0].content,
        "You are a precise financial data extraction assistant."
    );
    assert_eq!(request.messages[1].role, "user");
}

// ── Per-page failures are non-fatal ──────────────────────────────────────────

#[tokio::test]
async fn malformed_page_is_dropped_and_order_kept() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    write_pdf(&pdf, &[Some("page one"), Some("page two"), Some("page three")]);

    let provider = Arc::new(ScriptedProvider::ok(&[
        r#"[{"date":"01-01-2024","details":"A","amount":-1}]"#,
        "Sorry, I could not find any transactions.",
        r#"```json
[{"date":"03-01-2024","details":"C","amount":"1,250.00"}]
```"#,
    ]));
    let limiter = Arc::new(CountingLimiter::default());
    let output = extract_transactions(&pdf, &config_with(&provider, &limiter))
        .await
        .unwrap();

    let details: Vec<&str> = output.transactions.iter().map(|t| t.details.as_str()).collect();
    assert_eq!(details, vec!["A", "C"]);
    assert_eq!(output.transactions[1].amount_f64(), 1250.0);
    assert_eq!(output.stats.failed_pages, 1);
    assert!(matches!(
        output.pages[1].outcome,
        PageOutcome::Dropped(PageError::MalformedResponse { page: 2, .. })
    ));
    assert_eq!(limiter.waits(), 3);
}

#[tokio::test]
async fn http_error_page_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    write_pdf(&pdf, &[Some("page one"), Some("page two")]);

    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(ProviderError::Status {
            status: 429,
            body: "rate limit exceeded".into(),
        }),
        Ok(COFFEE.to_string()),
    ]));
    let limiter = Arc::new(CountingLimiter::default());
    let output = extract_transactions(&pdf, &config_with(&provider, &limiter))
        .await
        .unwrap();

    assert_eq!(output.transactions.len(), 1);
    assert_eq!(
        output.pages[0].error(),
        Some(&PageError::HttpStatus {
            page: 1,
            status: 429,
            body: "rate limit exceeded".into()
        })
    );
    assert_eq!(limiter.waits(), 2, "failed pages are still followed by a wait");
}

#[tokio::test]
async fn off_shape_record_costs_only_itself() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    write_pdf(&pdf, &[Some("page one"), Some("page two")]);

    let provider = Arc::new(ScriptedProvider::ok(&[
        r#"[{"date":"01-01-2024","details":"Coffee","amount":-3.5},
            {"date":"02-01-2024","details":null,"amount":10}]"#,
        r#"[{"date":"03-01-2024","details":"Rent","amount":-900}]"#,
    ]));
    let limiter = Arc::new(CountingLimiter::default());
    let output = extract_transactions(&pdf, &config_with(&provider, &limiter))
        .await
        .unwrap();

    let details: Vec<&str> = output.transactions.iter().map(|t| t.details.as_str()).collect();
    assert_eq!(details, vec!["Coffee", "Rent"]);
    assert!(!output.pages[0].is_dropped());
    assert_eq!(output.pages[0].skipped_records, 1);
    assert_eq!(output.stats.failed_pages, 0);
    assert_eq!(output.stats.skipped_records, 1);
    let per_page: usize = output.pages.iter().map(|p| p.transactions().len()).sum();
    assert_eq!(per_page, output.stats.transaction_count);
}

#[tokio::test]
async fn llm_time_excludes_rate_limit_waits() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    write_pdf(&pdf, &[Some("page one"), Some("page two")]);

    let config = ExtractionConfig::builder()
        .provider(Arc::new(ScriptedProvider::ok(&[COFFEE, "[]"])))
        .rate_limit_interval(std::time::Duration::from_millis(150))
        .build()
        .unwrap();
    let output = extract_transactions(&pdf, &config).await.unwrap();

    assert!(output.stats.total_duration_ms >= 300, "{:?}", output.stats);
    assert!(output.stats.llm_duration_ms < 150, "{:?}", output.stats);
    let summed: u64 = output.pages.iter().map(|p| p.duration_ms).sum();
    assert_eq!(output.stats.llm_duration_ms, summed);
}

// ── Fatal conditions ─────────────────────────────────────────────────────────

#[tokio::test]
async fn image_only_pdf_aborts_without_touching_output() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("scan.pdf");
    write_pdf(&pdf, &[None, None]);

    let existing = dir.path().join("existing.json");
    std::fs::write(&existing, "previous run").unwrap();
    let fresh = dir.path().join("fresh.json");

    let provider = Arc::new(ScriptedProvider::ok(&[]));
    let limiter = Arc::new(CountingLimiter::default());
    let config = config_with(&provider, &limiter);

    let err = extract_to_file(&pdf, &existing, &config).await.unwrap_err();
    assert!(
        matches!(err, ExtractError::NoExtractableText { page_count: 2, .. }),
        "got {err:?}"
    );
    assert_eq!(std::fs::read_to_string(&existing).unwrap(), "previous run");

    let err = extract_to_file(&pdf, &fresh, &config).await.unwrap_err();
    assert!(matches!(err, ExtractError::NoExtractableText { .. }));
    assert!(!fresh.exists());

    assert_eq!(provider.calls(), 0);
    assert_eq!(limiter.waits(), 0);
}

#[tokio::test]
async fn all_pages_empty_is_no_transactions() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    let out = dir.path().join("transactions.json");
    write_pdf(&pdf, &[Some("summary only"), Some("terms and conditions")]);

    let provider = Arc::new(ScriptedProvider::ok(&["[]", "not json"]));
    let limiter = Arc::new(CountingLimiter::default());
    let err = extract_to_file(&pdf, &out, &config_with(&provider, &limiter))
        .await
        .unwrap_err();

    assert!(
        matches!(err, ExtractError::NoTransactions { pages: 2, failed: 1 }),
        "got {err:?}"
    );
    assert!(!out.exists());
    assert_eq!(limiter.waits(), 2);
}

#[tokio::test]
async fn missing_key_fails_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    write_pdf(&pdf, &[Some("page one")]);

    let limiter = Arc::new(CountingLimiter::default());
    let config = ExtractionConfig::from_lookup(|_: &str| None)
        .rate_limiter(limiter.clone())
        .build()
        .unwrap();

    let err = extract_transactions(&pdf, &config).await.unwrap_err();
    assert!(matches!(err, ExtractError::MissingApiKey), "got {err:?}");
    assert_eq!(limiter.waits(), 0);
}

#[tokio::test]
async fn non_pdf_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("statement.pdf");
    std::fs::write(&path, "Date,Details,Amount\n").unwrap();

    let provider = Arc::new(ScriptedProvider::ok(&[]));
    let limiter = Arc::new(CountingLimiter::default());
    let err = extract_transactions(&path, &config_with(&provider, &limiter))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::NotAPdf { .. }), "got {err:?}");
    assert_eq!(provider.calls(), 0);
}

// ── Output file handling ─────────────────────────────────────────────────────

#[tokio::test]
async fn same_answers_give_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    write_pdf(&pdf, &[Some("page one"), Some("page two")]);

    let mut outputs = Vec::new();
    for name in ["first.json", "second.json"] {
        let out = dir.path().join(name);
        let provider = Arc::new(ScriptedProvider::ok(&[
            COFFEE,
            r#"[{"date":"02-01-2024","details":"Salary – ACME Ltd","amount":2500}]"#,
        ]));
        let limiter = Arc::new(CountingLimiter::default());
        extract_to_file(&pdf, &out, &config_with(&provider, &limiter))
            .await
            .unwrap();
        outputs.push(std::fs::read(&out).unwrap());
    }

    assert_eq!(outputs[0], outputs[1]);
    let text = String::from_utf8(outputs.remove(0)).unwrap();
    assert!(text.contains("Salary – ACME Ltd"), "non-ASCII kept verbatim");
}

#[tokio::test]
async fn integer_amounts_are_written_as_integers() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    let out = dir.path().join("transactions.json");
    write_pdf(&pdf, &[Some("page one")]);

    let provider = Arc::new(ScriptedProvider::ok(&[
        r#"[{"date":"02-01-2024","details":"Salary","amount":2500}]"#,
    ]));
    let limiter = Arc::new(CountingLimiter::default());
    extract_to_file(&pdf, &out, &config_with(&provider, &limiter))
        .await
        .unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("\"amount\": 2500\n"), "got: {text}");
}

#[tokio::test]
async fn existing_output_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    let out = dir.path().join("nested/dir/transactions.json");
    write_pdf(&pdf, &[Some("page one")]);
    std::fs::create_dir_all(out.parent().unwrap()).unwrap();
    std::fs::write(&out, "[\"stale\"]").unwrap();

    let provider = Arc::new(ScriptedProvider::ok(&[COFFEE]));
    let limiter = Arc::new(CountingLimiter::default());
    extract_to_file(&pdf, &out, &config_with(&provider, &limiter))
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&out).unwrap(), COFFEE_JSON);
}

// ── Alternative entry points ─────────────────────────────────────────────────

#[tokio::test]
async fn extract_from_bytes_matches_file_input() {
    let provider = Arc::new(ScriptedProvider::ok(&[COFFEE]));
    let limiter = Arc::new(CountingLimiter::default());
    let bytes = build_pdf(&[Some("01-01-2024 Coffee")]);

    let output = extract_from_bytes(&bytes, &config_with(&provider, &limiter))
        .await
        .unwrap();
    assert_eq!(output.to_json().unwrap(), COFFEE_JSON);
}

#[test]
fn extract_sync_runs_without_a_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    write_pdf(&pdf, &[Some("page one")]);

    let provider = Arc::new(ScriptedProvider::ok(&[COFFEE]));
    let limiter = Arc::new(CountingLimiter::default());
    let output = extract_sync(&pdf, &config_with(&provider, &limiter)).unwrap();
    assert_eq!(output.stats.transaction_count, 1);
    assert_eq!(limiter.waits(), 1);
}

#[tokio::test]
async fn inspect_needs_no_key() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    write_pdf(&pdf, &[Some("page one"), None, Some("page three")]);

    let info = inspect(&pdf).await.unwrap();
    assert_eq!(info.page_count, 3);
    assert_eq!(info.text_pages, 2);
    assert!(!info.is_encrypted);
}

// ── Progress callback ────────────────────────────────────────────────────────

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl EventLog {
    fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }
}

impl ExtractionProgressCallback for EventLog {
    fn on_extraction_start(&self, text_pages: usize) {
        self.push(format!("start {text_pages}"));
    }
    fn on_page_start(&self, page_num: u32, _total: usize) {
        self.push(format!("page {page_num}"));
    }
    fn on_page_complete(&self, page_num: u32, _total: usize, transactions: usize) {
        self.push(format!("done {page_num} {transactions}"));
    }
    fn on_page_error(&self, page_num: u32, _total: usize, _error: &str) {
        self.push(format!("error {page_num}"));
    }
    fn on_rate_limit_wait(&self, page_num: u32) {
        self.push(format!("wait {page_num}"));
    }
    fn on_extraction_complete(&self, text_pages: usize, transactions: usize) {
        self.push(format!("complete {text_pages} {transactions}"));
    }
}

#[tokio::test]
async fn progress_events_follow_page_order() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("statement.pdf");
    write_pdf(&pdf, &[Some("page one"), Some("page two")]);

    let log = Arc::new(EventLog::default());
    let config = ExtractionConfig::builder()
        .provider(Arc::new(ScriptedProvider::ok(&[COFFEE, "garbage"])))
        .rate_limiter(Arc::new(CountingLimiter::default()))
        .progress_callback(log.clone())
        .build()
        .unwrap();
    extract_transactions(&pdf, &config).await.unwrap();

    let events = log.0.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start 2",
            "page 1",
            "done 1 1",
            "wait 1",
            "page 2",
            "error 2",
            "wait 2",
            "complete 2 1",
        ]
    );
}
