//! Text-generation capability with exponential backoff.
//!
//! Summaries and verification judgments are delegated to an OpenAI-compatible
//! model through `awful_aj`. The pipeline only sees the [`AskAsync`] trait:
//!
//! - [`AskFnWrapper`]: binds an `awful_aj` config and chat template
//! - [`RetryAsk`]: decorator adding a per-call timeout and retries to any
//!   [`AskAsync`]
//!
//! # Retry Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), 30s) + random_jitter(0..max_jitter)
//! ```
//!
//! A call that outlives the timeout is abandoned and reported as a transport
//! failure, which is retried like any other.

use crate::config::GenerationConfig;
use crate::error::{DigestError, Result};
use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{error, instrument, warn};

/// Async access to a text-generation model: prompt in, text out.
pub trait AskAsync {
    async fn ask(&self, text: &str) -> Result<String>;
}

/// Adds retries with exponential backoff and jitter to an [`AskAsync`].
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
    max_jitter: StdDuration,
    timeout: StdDuration,
}

impl<T: AskAsync> RetryAsk<T> {
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
            max_jitter: StdDuration::from_millis(250),
            timeout: StdDuration::from_secs(120),
        }
    }

    pub fn from_config(inner: T, config: &GenerationConfig) -> Self {
        Self::new(
            inner,
            config.max_retries,
            StdDuration::from_millis(config.base_delay_ms),
        )
        .with_max_jitter(StdDuration::from_millis(config.max_jitter_ms))
        .with_timeout(StdDuration::from_secs(config.timeout_secs))
    }

    pub fn with_max_jitter(mut self, max_jitter: StdDuration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn ask_once(&self, text: &str) -> Result<String> {
        match timeout(self.timeout, self.inner.ask(text)).await {
            Ok(result) => result,
            Err(_) => Err(DigestError::Transport(format!(
                "model call timed out after {:?}",
                self.timeout
            ))),
        }
    }

    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=self.max_jitter.as_millis() as u64);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<T: AskAsync> AskAsync for RetryAsk<T> {
    #[instrument(level = "debug", skip_all)]
    async fn ask(&self, text: &str) -> Result<String> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.ask_once(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_t0.elapsed().as_millis() as u64,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// [`AskAsync`] over `awful_aj::api::ask` with a fixed chat template.
#[derive(Debug)]
pub struct AskFnWrapper<'a> {
    pub config: &'a AwfulJadeConfig,
    pub template: &'a ChatTemplate,
}

impl<'a> AskAsync for AskFnWrapper<'a> {
    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<String> {
        let t0 = Instant::now();
        match ask(self.config, text.to_string(), self.template, None, None).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "API call failed");
                Err(DigestError::Generation(e.to_string()))
            }
        }
    }
}
