//! Bounded status polling with exponential backoff

use crate::error::StepError;
use crate::status::NormalizedStatus;
use orka_cloud::CloudApi;
use orka_config::OrkaConfig;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// Polling limits for "wait until the provider reports X"
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Hard upper bound for a single wait
    pub timeout: Duration,

    /// Delay before the second status query
    pub interval: Duration,

    /// Ceiling for the backoff delay
    pub max_interval: Duration,
}

impl PollConfig {
    pub fn from_config(config: &OrkaConfig) -> Self {
        let interval = config.poll_interval();
        Self {
            timeout: config.poll_timeout(),
            interval,
            max_interval: (interval * 8).min(Duration::from_secs(30)).max(interval),
        }
    }

    /// Delay after the given zero-based poll
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.interval.saturating_mul(factor).min(self.max_interval)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::from_config(&OrkaConfig::default())
    }
}

/// Wait until a freshly created server reports ACTIVE
///
/// Retryable provider errors are tolerated until the deadline. `ERROR` or a
/// vanished server ends the wait immediately.
pub async fn wait_until_active<A>(
    api: &A,
    server_id: &str,
    what: &str,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<(), StepError>
where
    A: CloudApi + ?Sized,
{
    let deadline = Instant::now() + config.timeout;
    let mut attempt = 0;

    loop {
        match api.get_server_status(server_id).await {
            Ok(raw) => match NormalizedStatus::from_provider(&raw) {
                NormalizedStatus::Active => {
                    tracing::debug!("{} is ACTIVE after {} poll(s)", what, attempt + 1);
                    return Ok(());
                }
                NormalizedStatus::Pending => {}
                NormalizedStatus::Destroyed => {
                    return Err(StepError::BadStatus {
                        what: what.to_string(),
                        status: raw,
                    });
                }
                NormalizedStatus::Unknown if raw.eq_ignore_ascii_case("ERROR") => {
                    return Err(StepError::BadStatus {
                        what: what.to_string(),
                        status: raw,
                    });
                }
                NormalizedStatus::Unknown => {
                    tracing::debug!("{} reports unmapped status {}", what, raw);
                }
            },
            Err(e) if e.is_retryable() => {
                tracing::debug!("Status query for {} failed, will poll again: {}", what, e);
            }
            Err(e) => return Err(StepError::permanent(format!("status of {}", what), e)),
        }

        let delay = config.delay_for_attempt(attempt);
        if Instant::now() + delay > deadline {
            return Err(StepError::Timeout {
                what: what.to_string(),
                after: config.timeout,
            });
        }
        attempt += 1;

        tokio::select! {
            _ = cancel.cancelled() => return Err(StepError::Cancelled),
            _ = sleep(delay) => {}
        }
    }
}

/// Wait until a deleted server is gone (DELETED or not found)
pub async fn wait_until_gone<A>(
    api: &A,
    server_id: &str,
    what: &str,
    config: &PollConfig,
) -> Result<(), StepError>
where
    A: CloudApi + ?Sized,
{
    let deadline = Instant::now() + config.timeout;
    let mut attempt = 0;

    loop {
        match api.get_server_status(server_id).await {
            Ok(raw) if NormalizedStatus::from_provider(&raw) == NormalizedStatus::Destroyed => {
                return Ok(());
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) if e.is_retryable() => {
                tracing::debug!("Status query for {} failed, will poll again: {}", what, e);
            }
            Err(e) => return Err(StepError::permanent(format!("status of {}", what), e)),
        }

        let delay = config.delay_for_attempt(attempt);
        if Instant::now() + delay > deadline {
            return Err(StepError::Timeout {
                what: what.to_string(),
                after: config.timeout,
            });
        }
        attempt += 1;
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_calculation() {
        let config = PollConfig {
            timeout: Duration::from_secs(600),
            interval: Duration::from_millis(1000),
            max_interval: Duration::from_millis(10000),
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(8000));
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(10000)); // capped
        assert_eq!(config.delay_for_attempt(40), Duration::from_millis(10000));
    }

    #[test]
    fn test_from_config() {
        let config = OrkaConfig {
            poll_timeout_secs: 30,
            poll_interval_ms: 500,
            ..Default::default()
        };
        let poll = PollConfig::from_config(&config);
        assert_eq!(poll.timeout, Duration::from_secs(30));
        assert_eq!(poll.interval, Duration::from_millis(500));
        assert_eq!(poll.max_interval, Duration::from_secs(4));
    }
}
