//! Backoff for transient storage failures
//!
//! Only the storage adapters retry. Transactions are never retried
//! automatically: a failed attempt is terminal and the caller decides
//! whether to start a new one.

use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;

use super::StorageError;

/// Retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 = try once)
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Growth factor between retries
    pub multiplier: f64,
    /// Fraction of the delay randomized in either direction (0.0-1.0)
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::storage()
    }
}

impl RetryConfig {
    /// Pinning service uploads
    pub fn storage() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.3,
        }
    }

    /// Short delays for tests and local backends
    pub fn fast() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
            multiplier: 2.0,
            jitter: 0.0,
        }
    }

    /// Never retry
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::fast()
        }
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Delay before retry number `attempt` (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_secs_f64());

        if self.jitter <= 0.0 {
            return Duration::from_secs_f64(capped);
        }

        let spread = capped * self.jitter;
        let offset = rand::thread_rng().gen_range(-spread..=spread);
        Duration::from_secs_f64((capped + offset).max(0.0))
    }
}

/// Outcome of a retried operation
#[derive(Debug)]
pub struct RetryResult<T, E> {
    pub result: Result<T, E>,
    /// Attempts made (1 = first try)
    pub attempts: u32,
    pub total_duration: Duration,
}

impl<T, E> RetryResult<T, E> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Runs an operation until it succeeds, fails permanently, or runs out of retries
pub struct Retry {
    config: RetryConfig,
}

impl Retry {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Retry while `should_retry` accepts the error
    pub async fn run_when<F, Fut, T, E, P>(
        &self,
        context: &str,
        operation: F,
        should_retry: P,
    ) -> RetryResult<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let start = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;

            match operation().await {
                Ok(value) => {
                    if attempts > 1 {
                        tracing::info!(context, attempts, "Operation succeeded after retries");
                    }
                    return RetryResult {
                        result: Ok(value),
                        attempts,
                        total_duration: start.elapsed(),
                    };
                }
                Err(e) => {
                    if attempts > self.config.max_retries || !should_retry(&e) {
                        return RetryResult {
                            result: Err(e),
                            attempts,
                            total_duration: start.elapsed(),
                        };
                    }

                    let delay = self.config.delay_for_attempt(attempts - 1);
                    tracing::warn!(
                        context,
                        attempt = attempts,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Operation failed, will retry"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Retry transient storage failures only
    pub async fn storage<F, Fut, T>(&self, context: &str, operation: F) -> Result<T, StorageError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        self.run_when(context, operation, StorageError::is_transient)
            .await
            .into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_delay_grows_and_caps() {
        let config = RetryConfig {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            multiplier: 2.0,
            jitter: 0.0,
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(500));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let config = RetryConfig::storage().with_jitter(0.5);
        for _ in 0..20 {
            let delay = config.delay_for_attempt(0);
            assert!(delay >= Duration::from_millis(250));
            assert!(delay <= Duration::from_millis(750));
        }
    }

    #[tokio::test]
    async fn test_transient_storage_errors_are_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let retry = Retry::new(RetryConfig::fast());

        let counter = calls.clone();
        let result = retry
            .storage("upload", || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(StorageError::Status {
                            status: 503,
                            body: "busy".to_string(),
                        })
                    } else {
                        Ok("QmDone")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "QmDone");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_storage_errors_fail_fast() {
        let calls = Arc::new(AtomicU32::new(0));
        let retry = Retry::new(RetryConfig::fast());

        let counter = calls.clone();
        let result: Result<(), _> = retry
            .storage("upload", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(StorageError::Status {
                        status: 401,
                        body: "bad jwt".to_string(),
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let retry = Retry::new(RetryConfig::fast().with_max_retries(2));

        let outcome = retry
            .run_when("always", || async { Err::<u8, _>("down") }, |_| true)
            .await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn test_none_tries_once() {
        let retry = Retry::new(RetryConfig::none());
        let outcome = retry
            .run_when("once", || async { Err::<u8, _>("down") }, |_| true)
            .await;
        assert_eq!(outcome.attempts, 1);
    }
}
