//! Bounded exponential backoff around single provider calls

use crate::error::CloudError;
use crate::provider::RetryConfig;
use std::future::Future;
use tokio::time::sleep;

/// A call that kept failing, with the number of attempts spent on it
#[derive(Debug)]
pub struct RetryFailure {
    pub operation: String,
    pub attempts: u32,
    pub error: CloudError,
}

impl RetryFailure {
    /// True when the budget ran out on retryable errors
    pub fn exhausted(&self) -> bool {
        self.error.is_retryable()
    }
}

impl std::fmt::Display for RetryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} failed after {} attempt(s): {}",
            self.operation, self.attempts, self.error
        )
    }
}

/// Run `call` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    operation: &str,
    mut call: F,
) -> Result<T, RetryFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = crate::Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                attempt += 1;
                if !error.is_retryable() || attempt >= max_attempts {
                    return Err(RetryFailure {
                        operation: operation.to_string(),
                        attempts: attempt,
                        error,
                    });
                }

                let delay = config.delay_for_attempt(attempt - 1);
                tracing::warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    operation,
                    attempt,
                    max_attempts,
                    delay,
                    error
                );
                sleep(delay).await;
            }
        }
    }
}
