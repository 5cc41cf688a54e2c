//! Configuration for a statement extraction run.
//!
//! All behaviour is controlled through [`ExtractionConfig`], built via
//! [`ExtractionConfigBuilder`]. Values are resolved in a fixed order:
//! explicit builder setters win over the environment, which wins over the
//! built-in defaults. The environment is only consulted when the builder is
//! created through [`ExtractionConfig::from_env`] (or
//! [`ExtractionConfig::from_lookup`] in tests), never from deep inside the
//! pipeline.

use crate::error::ExtractError;
use crate::pacing::{FixedInterval, RateLimiter};
use crate::progress::ProgressCallback;
use crate::provider::ChatProvider;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Groq's OpenAI-compatible chat-completion endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Model used when neither `--model` nor `GROQ_MODEL` is set.
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";

/// Environment variable holding the bearer token.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Environment variable overriding the model.
pub const MODEL_ENV: &str = "GROQ_MODEL";

/// Bearer token for the chat-completion API.
///
/// `Debug` only shows a short prefix so configs can be logged safely.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key; blank strings count as "no key".
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First `n` characters, for diagnostics.
    pub fn prefix(&self, n: usize) -> &str {
        match self.0.char_indices().nth(n) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({}…)", self.prefix(4))
    }
}

/// Configuration for one extraction run.
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Bearer token. Required unless `provider` is set.
    pub api_key: Option<ApiKey>,

    /// Model identifier sent in every request. Default: `llama3-70b-8192`.
    pub model: String,

    /// Chat-completion URL. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Sampling temperature. Default: 0 (no randomness requested).
    pub temperature: f32,

    /// Custom system instruction. If None, uses
    /// [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Per-request timeout in seconds. Default: None, i.e. whatever the HTTP
    /// client and OS impose.
    pub request_timeout_secs: Option<u64>,

    /// Pre-constructed provider. Takes precedence over `api_key`/`endpoint`.
    pub provider: Option<Arc<dyn ChatProvider>>,

    /// Policy applied after every page. Default: 8 s fixed interval.
    pub rate_limiter: Arc<dyn RateLimiter>,

    /// Optional progress sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: 0.0,
            system_prompt: None,
            request_timeout_secs: None,
            provider: None,
            rate_limiter: Arc::new(FixedInterval::default()),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("api_key", &self.api_key)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("temperature", &self.temperature)
            .field("system_prompt", &self.system_prompt.as_ref().map(|s| s.len()))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn ChatProvider>"))
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl ExtractionConfig {
    /// Builder starting from built-in defaults only.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Builder seeded from `GROQ_API_KEY` and `GROQ_MODEL`.
    pub fn from_env() -> ExtractionConfigBuilder {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builder seeded from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> ExtractionConfigBuilder
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();
        if let Some(key) = lookup(API_KEY_ENV).and_then(ApiKey::new) {
            builder.config.api_key = Some(key);
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|m| !m.trim().is_empty()) {
            builder.config.model = model;
        }
        builder
    }

    /// Effective request timeout.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    /// Set the key; an empty string leaves the current value in place.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        if let Some(key) = ApiKey::new(key) {
            self.config.api_key = Some(key);
        }
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.config.rate_limiter = limiter;
        self
    }

    /// Shorthand for a [`FixedInterval`] limiter.
    pub fn rate_limit_interval(mut self, interval: Duration) -> Self {
        self.config.rate_limiter = Arc::new(FixedInterval::new(interval));
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// A missing API key is not checked here: a pre-built provider does not
    /// need one. It is checked when the pipeline resolves its provider.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ExtractError::InvalidConfig("model must not be empty".into()));
        }
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(ExtractError::InvalidConfig(format!(
                "endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.endpoint
            )));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(ExtractError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
