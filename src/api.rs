//! LLM API interaction with exponential backoff retry logic.
//!
//! All three LLM tasks (article analysis, keyword classification, podcast
//! scripts) go through this module. It wraps the `awful_aj` client, which
//! speaks to any OpenAI-compatible endpoint configured in `config.yaml`.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`AskFnWrapper`]: Wraps the `awful_aj` library's `ask` function
//! - [`RetryAsk`]: Decorator that adds retry logic to any `AskAsync` implementation
//!
//! # Retry Strategy
//!
//! Retries belong to the transport: a caller sees one `ask` that either
//! eventually succeeds or fails once retries are exhausted.
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second, capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use rand::{Rng, rng};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Trait for async LLM interaction.
///
/// Implementors send text to an LLM and receive a response. This
/// abstraction allows for different LLM backends or decorators (like retry logic).
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send text to the LLM and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// # Backoff Strategy
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=max_jitter)
/// ```
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
    max_jitter: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Create a new retry wrapper around an existing [`AskAsync`] implementation.
    ///
    /// ```ignore
    /// let client = AskFnWrapper { config, template };
    /// let retry_client = RetryAsk::new(client, 5, Duration::from_secs(1));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
            max_jitter: StdDuration::from_millis(250),
        }
    }

    /// Override the upper bound of the random jitter added to each delay.
    #[cfg(test)]
    pub fn with_max_jitter(mut self, max_jitter: StdDuration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Delay before retry number `attempt` (1-based), without jitter.
    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = (attempt.saturating_sub(1)).min(31) as u32;
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("max_jitter", &self.max_jitter)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    let jitter_ms: u64 =
                        rng().random_range(0..=self.max_jitter.as_millis() as u64);
                    let delay = self.backoff(attempt) + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
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

/// Wrapper around `awful_aj::api::ask` that implements [`AskAsync`].
#[derive(Debug)]
pub struct AskFnWrapper<'a> {
    /// LLM configuration (API keys, endpoints, model settings).
    pub config: &'a AwfulJadeConfig,
    /// Chat template holding the system prompt for this task.
    pub template: &'a ChatTemplate,
}

impl<'a> AskAsync for AskFnWrapper<'a> {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(self.config, text.to_string(), self.template, None, None).await;
        let dt = t0.elapsed();

        if let Err(e) = &res {
            warn!(elapsed_ms = dt.as_millis(), error = %e, "API call failed");
        }
        res
    }
}

/// Send `prompt` to the LLM under `template`, retrying transient failures.
///
/// - Up to 5 retry attempts
/// - Exponential backoff: 1s, 2s, 4s, 8s, 16s (capped at 30s)
#[instrument(level = "info", skip_all, fields(template = %template_name))]
pub async fn ask_with_backoff(
    config: &AwfulJadeConfig,
    prompt: &str,
    template: &ChatTemplate,
    template_name: &str,
) -> Result<String, Box<dyn Error>> {
    let t0 = Instant::now();
    let client = AskFnWrapper { config, template };
    let api = RetryAsk::new(client, 5, StdDuration::from_secs(1));
    let res = api.ask(prompt).await;
    let dt = t0.elapsed();

    match &res {
        Ok(_) => info!(elapsed_ms_total = dt.as_millis(), "ask_with_backoff succeeded"),
        Err(e) => error!(elapsed_ms_total = dt.as_millis(), error = %e, "ask_with_backoff failed"),
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Fails the first `failures` calls, then echoes the prompt.
    #[derive(Debug)]
    struct Flaky {
        failures: usize,
        calls: Cell<usize>,
    }

    impl AskAsync for Flaky {
        type Response = String;

        async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
            let n = self.calls.get() + 1;
            self.calls.set(n);
            if n <= self.failures {
                Err(format!("transient failure {}", n).into())
            } else {
                Ok(text.to_uppercase())
            }
        }
    }

    fn fast_retry(inner: Flaky, max_retries: usize) -> RetryAsk<Flaky> {
        RetryAsk::new(inner, max_retries, StdDuration::from_millis(1))
            .with_max_jitter(StdDuration::ZERO)
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failures() {
        let api = fast_retry(Flaky { failures: 2, calls: Cell::new(0) }, 5);
        let resp = api.ask("hello").await.unwrap();
        assert_eq!(resp, "HELLO");
        assert_eq!(api.inner.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let api = fast_retry(Flaky { failures: 10, calls: Cell::new(0) }, 2);
        let err = api.ask("hello").await.unwrap_err();
        assert!(err.to_string().contains("transient failure 3"));
        assert_eq!(api.inner.calls.get(), 3);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let api = RetryAsk::new(
            Flaky { failures: 0, calls: Cell::new(0) },
            5,
            StdDuration::from_secs(1),
        );
        assert_eq!(api.backoff(1), StdDuration::from_secs(1));
        assert_eq!(api.backoff(2), StdDuration::from_secs(2));
        assert_eq!(api.backoff(5), StdDuration::from_secs(16));
        assert_eq!(api.backoff(6), StdDuration::from_secs(30));
        assert_eq!(api.backoff(60), StdDuration::from_secs(30));
    }
}
