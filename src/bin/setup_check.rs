//! Setup check: is the environment ready for `extract`?
//!
//! Reads `.env` in the working directory (or the path given as the first
//! argument), then prints what it found.

use anyhow::Result;
use statement2json::SetupReport;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let env_file = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".env"));

    let report = SetupReport::collect(&env_file);
    println!("{report}");
    Ok(())
}
