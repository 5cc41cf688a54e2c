//! Environment setup check.
//!
//! Reports whether a `.env` file is present, whether an API key can be found
//! and which model would be used. Values in the `.env` file take precedence
//! over the process environment, matching how the file is meant to be used
//! on a developer machine.

use crate::config::{ApiKey, API_KEY_ENV, DEFAULT_MODEL, MODEL_ENV};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Characters of the key shown in the report.
const KEY_PREFIX_LEN: usize = 10;

/// What the setup check found.
#[derive(Debug, Clone)]
pub struct SetupReport {
    pub env_file: PathBuf,
    pub env_file_exists: bool,
    pub api_key: Option<ApiKey>,
    pub model: String,
}

impl SetupReport {
    /// Check `env_file` and fall back to the process environment.
    pub fn collect(env_file: &Path) -> Self {
        Self::collect_with(env_file, |name| std::env::var(name).ok())
    }

    /// Check `env_file` and fall back to `lookup`.
    pub fn collect_with<F>(env_file: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let (env_file_exists, file_vars) = read_env_file(env_file);
        let get = |name: &str| file_vars.get(name).cloned().or_else(|| lookup(name));

        Self {
            env_file: env_file.to_path_buf(),
            env_file_exists,
            api_key: get(API_KEY_ENV).and_then(ApiKey::new),
            model: get(MODEL_ENV)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// True when a run could start.
    pub fn is_ready(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Parse `KEY=VALUE` lines; `#` starts a comment. Malformed lines are skipped.
fn read_env_file(path: &Path) -> (bool, HashMap<String, String>) {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(_) => return (path.is_file(), HashMap::new()),
    };

    let mut vars = HashMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(e) => warn!("Skipping line in {}: {}", path.display(), e),
        }
    }
    (true, vars)
}

impl fmt::Display for SetupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Environment Setup Test:")?;
        writeln!(f, "✓ .env file exists: {}", self.env_file_exists)?;
        writeln!(f, "✓ {} loaded: {}", API_KEY_ENV, self.api_key.is_some())?;
        if let Some(ref key) = self.api_key {
            writeln!(f, "✓ API key starts with: {}...", key.prefix(KEY_PREFIX_LEN))?;
        }
        write!(f, "✓ Model: {}", self.model)
    }
}
