use std::fmt::Display;
use std::future::Future;
use tokio::time::{Duration, sleep};
use tracing::warn;

/// Bounded exponential-backoff retry for a fallible async operation.
///
/// The nth failure (counting from 0) sleeps `base_delay * 2^n` before the
/// next attempt; the final attempt's error propagates unmodified. No jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt + 1 >= self.max_attempts => return Err(err),
                Err(err) => {
                    let wait = self.base_delay * 2u32.pow(attempt);
                    warn!(
                        target = "harvester.retry",
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        wait_secs = wait.as_secs_f64(),
                        error = %err,
                        "attempt failed, backing off"
                    );
                    sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt() {
        let calls = Cell::new(0u32);
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let result: Result<&str, String> = policy
            .run(|| {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err(format!("boom {n}"))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;
        assert_eq!(result, Ok("done"));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_attempts() {
        let calls = Cell::new(0u32);
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let result: Result<(), String> = policy
            .run(|| {
                calls.set(calls.get() + 1);
                async { Err("always".to_string()) }
            })
            .await;
        assert_eq!(result, Err("always".to_string()));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_between_attempts() {
        let calls = Cell::new(0u32);
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let started = tokio::time::Instant::now();
        let _: Result<(), String> = policy
            .run(|| {
                calls.set(calls.get() + 1);
                async { Err("always".to_string()) }
            })
            .await;
        // 2s after the first failure, 4s after the second.
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_success_runs_once() {
        let calls = Cell::new(0u32);
        let policy = RetryPolicy::default();
        let result: Result<u32, String> = policy
            .run(|| {
                calls.set(calls.get() + 1);
                async { Ok(7) }
            })
            .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.get(), 1);
    }
}
