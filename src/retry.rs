use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry and deadline policy for calls against the cost oracle
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
    pub jitter: bool,
    /// Deadline for a single attempt
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            exponential_base: 2.0,
            jitter: true,
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy for oracle probes: `retries` extra attempts after the first one.
    pub fn for_probes(retries: u32, call_timeout: Duration) -> Self {
        Self {
            max_attempts: retries + 1,
            call_timeout,
            ..Default::default()
        }
    }

    /// Execute an async oracle operation with a deadline per attempt and retry logic
    pub async fn execute_async<F, T, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        let mut delay = self.initial_delay;

        loop {
            attempt += 1;

            let outcome = match tokio::time::timeout(self.call_timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout {
                    operation: operation_name.to_string(),
                    timeout_ms: self.call_timeout.as_millis() as u64,
                }),
            };

            match outcome {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if !err.is_recoverable() || attempt >= self.max_attempts {
                        return Err(err);
                    }

                    warn!(
                        "Oracle call {} failed (attempt {}/{}): {}, retrying in {:?}",
                        operation_name, attempt, self.max_attempts, err, delay
                    );

                    tokio::time::sleep(delay).await;
                    delay = self.calculate_next_delay(delay, attempt);
                }
            }
        }
    }

    fn calculate_next_delay(&self, current_delay: Duration, attempt: u32) -> Duration {
        let mut next_delay = Duration::from_secs_f64(
            current_delay.as_secs_f64() * self.exponential_base.powf(attempt as f64 - 1.0),
        );

        if self.jitter {
            use rand::Rng;
            let jitter_factor = rand::rng().random_range(0.5..1.5);
            next_delay = Duration::from_secs_f64(next_delay.as_secs_f64() * jitter_factor);
        }

        if next_delay > self.max_delay {
            next_delay = self.max_delay;
        }

        next_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            jitter: false,
            call_timeout: Duration::from_millis(200),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_retry_recovers_transient_failure() {
        let counter = AtomicU32::new(0);
        let result = quick_policy(2)
            .execute_async("estimate_cost", || {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if count == 0 {
                        Err(Error::OracleUnavailable {
                            operation: "estimate_cost".to_string(),
                            reason: "connection reset".to_string(),
                        })
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_persistent_failure_is_returned() {
        let counter = AtomicU32::new(0);
        let result: Result<u32> = quick_policy(2)
            .execute_async("advise_indexes", || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(Error::OracleUnavailable {
                        operation: "advise_indexes".to_string(),
                        reason: "refused".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(Error::OracleUnavailable { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_recoverable_error_is_not_retried() {
        let counter = AtomicU32::new(0);
        let result: Result<u32> = quick_policy(3)
            .execute_async("estimate_cost", || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::Parse("garbage plan".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(Error::Parse(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let mut policy = quick_policy(1);
        policy.call_timeout = Duration::from_millis(10);

        let result: Result<u32> = policy
            .execute_async("estimate_cost", || async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(1)
            })
            .await;

        match result {
            Err(Error::Timeout { operation, timeout_ms }) => {
                assert_eq!(operation, "estimate_cost");
                assert_eq!(timeout_ms, 10);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
