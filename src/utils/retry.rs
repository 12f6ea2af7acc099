//! Bounded exponential-backoff retry.
//!
//! The schedule mirrors the benchmark's observed behavior: the base delay is
//! multiplied by the exponential base before every sleep (including the
//! first), and each sleep is optionally jittered by a uniform factor in
//! `[0.5, 1.5)`. Only retryable failures re-enter the loop; authentication
//! and malformed-request errors propagate immediately.

use crate::config::RetryConfig;
use crate::error::{BenchError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry schedule parameters.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub exponential_base: f64,
    pub jitter: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            exponential_base: config.exponential_base,
            jitter: config.jitter,
        }
    }

    /// Pre-jitter delay before retry `retry` (0-based). Retry 0 already waits
    /// `initial_delay * base`, matching the observed schedule.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.exponential_base.powi(retry as i32 + 1);
        self.initial_delay.mul_f64(factor)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if !self.jitter {
            return delay;
        }
        delay.mul_f64(rand::thread_rng().gen_range(0.5..1.5))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Execute an operation under the retry policy. After `max_retries` failed
/// retries the last error is wrapped in [`BenchError::ExhaustedRetries`]
/// carrying the total attempt count.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0u32;

    loop {
        match operation().await {
            Ok(result) => {
                if retries > 0 {
                    debug!("{} succeeded after {} retries", operation_name, retries);
                }
                return Ok(result);
            }
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                if retries >= policy.max_retries {
                    return Err(BenchError::ExhaustedRetries {
                        attempts: retries + 1,
                        source: Box::new(e),
                    });
                }

                let delay = policy.jittered(policy.delay_for(retries));
                warn!(
                    "{} failed (attempt {}), retrying after {}ms: {}",
                    operation_name,
                    retries + 1,
                    delay.as_millis(),
                    e
                );
                tokio::time::sleep(delay).await;
                retries += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_millis(2),
            exponential_base: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_schedule_is_geometric() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_secs(2),
            exponential_base: 2.0,
            jitter: false,
        };

        // Delay is multiplied before the first sleep
        assert_eq!(policy.delay_for(0), Duration::from_secs(4));
        assert_eq!(policy.delay_for(1), Duration::from_secs(8));
        assert_eq!(policy.delay_for(2), Duration::from_secs(16));

        let delays: Vec<Duration> = (0..4).map(|i| policy.delay_for(i)).collect();
        assert!(delays.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = RetryPolicy {
            jitter: true,
            ..fast_policy()
        };
        let base = Duration::from_millis(1000);
        for _ in 0..100 {
            let jittered = policy.jittered(base);
            assert!(jittered >= base.mul_f64(0.5));
            assert!(jittered < base.mul_f64(1.5));
        }
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let policy = fast_policy();
        let mut attempts = 0u32;
        let result: Result<()> = with_retry(&policy, "fatal op", || {
            attempts += 1;
            async {
                Err(BenchError::Api {
                    status: 401,
                    message: "bad key".into(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(BenchError::Api { status: 401, .. })));
        assert_eq!(attempts, 1);
    }
}
