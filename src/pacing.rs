//! Rate limiting between successive API calls.
//!
//! The pipeline waits on a [`RateLimiter`] after every page, whether the call
//! succeeded or not and including after the last page. The production policy
//! is a plain fixed interval ([`FixedInterval`]); it does not look at
//! response headers and does not back off.
//!
//! Injecting the policy through [`crate::config::ExtractionConfig`] lets tests
//! swap in [`NoDelay`] or a recording implementation instead of sleeping.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Default gap between two API calls.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(8);

/// Scheduling policy applied after each API call.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Block until the next call may be issued.
    async fn wait(&self);
}

/// Sleep for a fixed duration after every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

#[async_trait]
impl RateLimiter for FixedInterval {
    async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }
        debug!("Rate limit: sleeping {:?}", self.interval);
        tokio::time::sleep(self.interval).await;
    }
}

/// Never waits. Useful against local or mocked endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl RateLimiter for NoDelay {
    async fn wait(&self) {}
}
