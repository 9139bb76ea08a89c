use crate::error::TransportError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Exponential backoff for retryable transport failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 2_000,
        }
    }
}

/// Outcome of a retried operation that did not succeed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryFailure {
    /// Last error plus the number of attempts made.
    Exhausted { attempts: u32, error: TransportError },
    Cancelled,
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`, where `attempt` starts at 1.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(
            self.initial_backoff_ms
                .saturating_mul(factor)
                .min(self.max_backoff_ms),
        )
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, runs out of
    /// attempts, or `cancel` is raised.
    pub fn run<T>(
        &self,
        cancel: &AtomicBool,
        mut op: impl FnMut(u32) -> Result<T, TransportError>,
    ) -> Result<T, RetryFailure> {
        let max = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            if cancel.load(Ordering::Acquire) {
                return Err(RetryFailure::Cancelled);
            }
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < max => {
                    let delay = self.backoff(attempt);
                    log::info!(target: "net", "attempt {attempt}/{max} failed ({error}); retrying in {delay:?}");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(error) => {
                    return Err(RetryFailure::Exhausted {
                        attempts: attempt,
                        error,
                    });
                }
            }
        }
    }
}
