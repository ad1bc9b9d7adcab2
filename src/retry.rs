//! Bounded retry-with-backoff around a single upstream call.
//!
//! Rate-limited (429) and server-error (5xx) outcomes are retried up to
//! `max_attempts` total calls. A 429 `Retry-After` hint is preferred over
//! the exponential schedule; 5xx outcomes always use the schedule. Client
//! errors and transport failures are returned immediately.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tracing::{error, warn};

use crate::config::ServerConfig;
use crate::error::UpstreamError;
use crate::upstream::Outcome;

/// One retry decision. Lives only for the duration of one `execute` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 1-based number of the attempt that just failed.
    pub attempt_number: u32,
    pub wait: Duration,
    pub triggering_status: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    /// `max_attempts` counts every call, the first included, and is at least 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.max_attempts, config.retry_base_delay)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Exponential wait after failed attempt `attempt` (1-based): base, 2×base, 4×base...
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exp)
    }

    /// Upper bound on the total waiting of one `execute` call: the sum of
    /// the exponential schedule over `max_attempts` steps (2+4+8 = 14s by default).
    pub fn wait_budget(&self) -> Duration {
        (1..=self.max_attempts).fold(Duration::ZERO, |acc, n| acc.saturating_add(self.backoff(n)))
    }

    /// Wait after failed attempt `attempt`, preferring a server hint.
    ///
    /// Hints are clamped to [`Self::wait_budget`].
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        match hint {
            Some(hint) => hint.min(self.wait_budget()),
            None => self.backoff(attempt),
        }
    }

    /// Run `call` until it succeeds, fails terminally, or attempts run out.
    ///
    /// `call` must describe an idempotent request; it is invoked once per
    /// attempt.
    pub async fn execute<F, Fut>(&self, mut call: F) -> Result<Value, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        let budget = self.wait_budget();
        let mut attempt = 0u32;
        let mut waited = Duration::ZERO;

        loop {
            attempt += 1;

            let (status, hint) = match call().await {
                Outcome::Success(payload) => return Ok(payload),

                Outcome::ClientError { status, message } => {
                    error!(attempt, status, "Figma API rejected request, not retrying");
                    return Err(UpstreamError::ClientError { status, message });
                }

                Outcome::TransportError { message } => {
                    error!(attempt, %message, "Figma API transport failure, not retrying");
                    return Err(UpstreamError::Transport { message });
                }

                Outcome::RateLimited {
                    status,
                    retry_after,
                } => {
                    if attempt >= self.max_attempts {
                        error!(attempt, status, "Figma API rate limit exhausted");
                        return Err(UpstreamError::RateLimitExhausted {
                            attempts: attempt,
                            status,
                            retry_after,
                        });
                    }
                    (status, retry_after)
                }

                Outcome::ServerError { status, message } => {
                    if attempt >= self.max_attempts {
                        error!(attempt, status, "Figma API server errors exhausted retries");
                        return Err(UpstreamError::ServerErrorExhausted {
                            attempts: attempt,
                            status,
                            message,
                        });
                    }
                    (status, None)
                }
            };

            let retry = RetryAttempt {
                attempt_number: attempt,
                wait: self
                    .delay_for(attempt, hint)
                    .min(budget.saturating_sub(waited)),
                triggering_status: status,
            };
            waited += retry.wait;
            warn!(
                attempt = retry.attempt_number,
                max_attempts = self.max_attempts,
                status = retry.triggering_status,
                wait_ms = u64::try_from(retry.wait.as_millis()).unwrap_or(u64::MAX),
                "Figma API call failed transiently, retrying"
            );
            tokio::time::sleep(retry.wait).await;
        }
    }
}
