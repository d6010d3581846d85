//! Retry policy for transport calls.
//!
//! A failed attempt is retried when its [`NetworkError`] carries a transient
//! HTTP status or connection error code. Waits grow exponentially from
//! `min_timeout`; a `503` with a `retry-after` header stretches the next
//! wait to honour the server's request.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{GraphqlClientError, NetworkError, TransportError};

/// HTTP statuses that are retried.
pub const RETRY_STATUS_CODES: [u16; 7] = [408, 413, 429, 500, 502, 503, 504];

/// Connection error codes that are retried.
pub const RETRY_ERROR_CODES: [&str; 8] = [
    "ETIMEDOUT",
    "ECONNRESET",
    "EADDRINUSE",
    "ECONNREFUSED",
    "EPIPE",
    "ENOTFOUND",
    "ENETUNREACH",
    "EAI_AGAIN",
];

/// Errors the retry policy can classify.
pub trait Retryable: std::error::Error {
    /// Network details of the failure, if any.
    fn network_error(&self) -> Option<&NetworkError>;
}

impl Retryable for TransportError {
    fn network_error(&self) -> Option<&NetworkError> {
        TransportError::network_error(self)
    }
}

impl Retryable for GraphqlClientError {
    fn network_error(&self) -> Option<&NetworkError> {
        GraphqlClientError::network_error(self)
    }
}

/// Callback invoked before every retry with the error that caused it.
pub type OnRetry = Arc<dyn Fn(&dyn Retryable) + Send + Sync>;

/// Retry configuration.
#[derive(Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub retries: u32,
    /// Base delay before the first retry.
    pub min_timeout: Duration,
    /// Upper bound for the exponential delay.
    pub max_timeout: Option<Duration>,
    /// Exponential growth factor.
    pub factor: f64,
    /// Multiply each delay by a random factor in `[1, 2)`.
    pub randomize: bool,
    /// Called before each retry.
    pub on_retry: Option<OnRetry>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 10,
            min_timeout: Duration::from_millis(1000),
            max_timeout: None,
            factor: 2.0,
            randomize: true,
            on_retry: None,
        }
    }
}

impl From<u32> for RetryConfig {
    fn from(retries: u32) -> Self {
        Self::new(retries)
    }
}

impl RetryConfig {
    /// Default backoff with the given retry count.
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    /// Never retry.
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Set the base delay.
    #[must_use]
    pub fn with_min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    /// Cap the exponential delay.
    #[must_use]
    pub fn with_max_timeout(mut self, max_timeout: Duration) -> Self {
        self.max_timeout = Some(max_timeout);
        self
    }

    /// Set the growth factor.
    #[must_use]
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Toggle delay randomisation.
    #[must_use]
    pub fn with_randomize(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }

    /// Register a callback run before every retry.
    #[must_use]
    pub fn with_on_retry<F>(mut self, on_retry: F) -> Self
    where
        F: Fn(&dyn Retryable) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(on_retry));
        self
    }
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("retries", &self.retries)
            .field("min_timeout", &self.min_timeout)
            .field("max_timeout", &self.max_timeout)
            .field("factor", &self.factor)
            .field("randomize", &self.randomize)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

/// Whether a failure is transient.
pub fn will_retry_error(network_error: &NetworkError) -> bool {
    if let Some(status) = network_error.status_code
        && RETRY_STATUS_CODES.contains(&status)
    {
        return true;
    }
    network_error
        .code
        .as_deref()
        .is_some_and(|code| RETRY_ERROR_CODES.contains(&code))
}

/// Extra wait requested by a `503` response's `retry-after` header, less
/// the configured `min_timeout`.
///
/// The header is read as integer seconds, falling back to an HTTP date.
/// Anything else yields zero.
pub fn get_delay(network_error: Option<&NetworkError>, min_timeout: Duration) -> Duration {
    let Some(network_error) = network_error else {
        return Duration::ZERO;
    };
    if network_error.status_code != Some(503) {
        return Duration::ZERO;
    }
    let Some(retry_after) = network_error
        .headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| retry_after_millis(value.trim(), Utc::now()))
    else {
        return Duration::ZERO;
    };
    let min = i64::try_from(min_timeout.as_millis()).unwrap_or(i64::MAX);
    Duration::from_millis(retry_after.saturating_sub(min).max(0) as u64)
}

fn retry_after_millis(value: &str, now: DateTime<Utc>) -> Option<i64> {
    if let Ok(seconds) = value.parse::<i64>() {
        return Some(seconds.saturating_mul(1000));
    }
    let date = DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()?;
    Some((date.with_timezone(&Utc) - now).num_milliseconds())
}

/// Outcome of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then try again.
    Retry(Duration),
    /// Give up and return the error.
    Fail,
}

/// Decides whether and when to retry.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy<'a> {
    config: &'a RetryConfig,
}

impl<'a> RetryPolicy<'a> {
    /// Policy over a configuration.
    pub fn new(config: &'a RetryConfig) -> Self {
        Self { config }
    }

    /// Decide what to do after `attempt` retries have already been made.
    pub fn decide<E: Retryable + ?Sized>(&self, error: &E, attempt: u32) -> RetryDecision {
        if attempt >= self.config.retries {
            return RetryDecision::Fail;
        }
        let network_error = error.network_error();
        if !network_error.is_some_and(will_retry_error) {
            return RetryDecision::Fail;
        }
        RetryDecision::Retry(
            self.backoff(attempt) + get_delay(network_error, self.config.min_timeout),
        )
    }

    /// Exponential delay before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let random = if self.config.randomize {
            1.0 + fastrand::f64()
        } else {
            1.0
        };
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let millis = (random
            * self.config.min_timeout.as_millis() as f64
            * self.config.factor.powi(exponent))
        .round();
        let mut delay = if millis.is_finite() && millis >= 0.0 {
            Duration::from_millis(millis.min(u64::MAX as f64) as u64)
        } else {
            Duration::MAX
        };
        if let Some(max) = self.config.max_timeout {
            delay = delay.min(max);
        }
        delay
    }
}

/// Identifies the caller in retry log lines.
#[derive(Debug, Clone, Copy)]
pub struct RetryContext<'a> {
    /// Operation name used as the log prefix.
    pub name: &'a str,
}

/// Run `operation`, retrying transient failures per `config`.
///
/// Exhausted or non-retryable errors are returned unchanged.
///
/// # Errors
///
/// Returns the last error produced by `operation`.
pub async fn retry_request<T, E, F, Fut>(
    mut operation: F,
    ctx: RetryContext<'_>,
    config: &RetryConfig,
) -> Result<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let policy = RetryPolicy::new(config);
    let mut attempt = 0;
    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        match policy.decide(&error, attempt) {
            RetryDecision::Fail => return Err(error),
            RetryDecision::Retry(delay) => {
                attempt += 1;
                warn!(
                    is_retry = true,
                    err = %error,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "{}: Retried",
                    ctx.name
                );
                if let Some(on_retry) = &config.on_retry {
                    on_retry(&error);
                }
                tokio::time::sleep(delay).await;
            }
        }
    }
}
