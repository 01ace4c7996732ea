use std::future::Future;
use std::time::Duration;

use super::fault::ToolFault;

/// Bounded retry policy for tool calls
///
/// Only faults marked `retryable` are retried, at most `max_attempts` calls
/// in total. The default policy makes a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Runs `call` until it succeeds, fails permanently, or attempts run out
    pub async fn run<T, F, Fut>(&self, mut call: F) -> Result<T, ToolFault>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ToolFault>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(fault) if fault.retryable && attempt < self.max_attempts => {
                    tracing::warn!(
                        tool = %fault.tool,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %fault.message,
                        "Retrying tool call"
                    );
                    attempt += 1;
                    if !self.backoff.is_zero() {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
                Err(fault) => return Err(fault),
            }
        }
    }
}
