//! HTTP delivery with bounded retry and jittered exponential backoff.
//!
//! One logical send maps to up to `max_attempts` HTTP attempts. The
//! retry split sits exactly at status 500: responses below it (success
//! and client errors alike) are handed back after a single attempt,
//! while 5xx responses and transport-level failures are retried until
//! the attempt budget runs out.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::error::Error;

/// Retry/backoff policy for one logical send.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first attempt.
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles per attempt.
    pub base_delay: Duration,
    /// Cap on the exponential component of the backoff.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Stateless delivery transport; owns no data across calls.
#[derive(Debug, Clone)]
pub struct Transport {
    retry: RetryPolicy,
}

impl Transport {
    pub fn new(retry: RetryPolicy) -> Self {
        Transport { retry }
    }

    /// Performs one logical send.
    ///
    /// Returns the response as soon as the status is below 500 — client
    /// errors are terminal and the caller's responsibility to interpret.
    /// A 5xx on the final attempt surfaces as [`Error::Api`]; a network
    /// failure on the final attempt surfaces as [`Error::Transport`].
    /// No delay follows the terminal attempt.
    pub async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        let max_attempts = self.retry.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let Some(req) = request.try_clone() else {
                return Err(Error::Request(
                    "request body cannot be replayed for retries".to_string(),
                ));
            };
            let last = attempt == max_attempts;

            match req.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if status < 500 {
                        return Ok(response);
                    }
                    if last {
                        return Err(Error::from_response(response).await);
                    }
                    warn!(status, attempt, "server error, will retry");
                }
                Err(err) => {
                    if last {
                        return Err(Error::Transport(err));
                    }
                    warn!(attempt, error = %err, "transport error, will retry");
                }
            }

            let delay = self.backoff_delay(attempt);
            let delay_ms = delay.as_millis() as u64;
            debug!(attempt, delay_ms, "backing off before retry");
            tokio::time::sleep(delay).await;
        }
        unreachable!("retry loop returns on the final attempt")
    }

    /// Delay before the retry that follows `attempt` (1-based):
    /// exponential from `base_delay`, capped at `max_delay`, plus jitter
    /// drawn from `[0, capped]` — the total can reach twice the cap.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let base_ms = self.retry.base_delay.as_millis() as u64;
        let exponential = base_ms.saturating_mul(1u64 << exponent);
        let capped = exponential.min(self.retry.max_delay.as_millis() as u64);
        let jitter = rand::thread_rng().gen_range(0..=capped);
        Duration::from_millis(capped.saturating_add(jitter))
    }
}
