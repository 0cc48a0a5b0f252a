// ── Retry with exponential backoff ──
//
// Used for idempotent reads only. The policy is a plain value so callers
// (and tests) can inspect the exact schedule; sleeping goes through the
// injected `Clock`.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::clock::Clock;

/// Attempt budget and backoff schedule.
///
/// The delay slept after failed attempt `n` (1-based) is
/// `base_delay * factor^(n-1)`, capped at `max_delay`. No delay follows
/// the final attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            factor: 2,
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let multiplier = self.factor.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .saturating_mul(multiplier)
            .min(self.max_delay)
    }

    /// Every delay the policy would sleep if all attempts failed.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.attempts()).map(|n| self.delay_after(n)).collect()
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Why a retried operation gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// A non-transient error; returned as soon as it was seen.
    Permanent { error: E, attempt: u32 },
    /// Every attempt failed transiently.
    Exhausted { attempts: u32, last: E },
}

/// Run `op` under `policy`, retrying while `is_transient` says so.
pub async fn retry<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    clock: &dyn Clock,
    operation: &str,
    is_transient: P,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        debug!(operation, attempt, max_attempts, "bridge read");
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if !is_transient(&error) => {
                return Err(RetryError::Permanent { error, attempt });
            }
            Err(error) if attempt >= max_attempts => {
                warn!(operation, attempts = attempt, error = %error, "retries exhausted");
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }
            Err(error) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    operation,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "transient failure, retrying"
                );
                clock.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn default_schedule_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 6,
            ..RetryPolicy::default()
        };
        let secs: Vec<u64> = policy.schedule().iter().map(Duration::as_secs).collect();
        assert_eq!(secs, vec![1, 2, 4, 8, 8]);
    }

    #[test]
    fn default_policy_sleeps_twice() {
        assert_eq!(
            RetryPolicy::default().schedule(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
        assert!(RetryPolicy::none().schedule().is_empty());
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let clock = ManualClock::new();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry(
            &RetryPolicy::default(),
            &clock,
            "test",
            |_: &String| false,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("bad request".to_owned()) }
            },
        )
        .await;

        assert!(matches!(result, Err(RetryError::Permanent { attempt: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn transient_errors_exhaust_budget() {
        let clock = ManualClock::new();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry(
            &RetryPolicy::default(),
            &clock,
            "test",
            |_: &String| true,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("timed out".to_owned()) }
            },
        )
        .await;

        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 3, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }
}
