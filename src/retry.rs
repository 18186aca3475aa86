//! Bounded exponential backoff for external calls.

use crate::error::{ExternalServiceError, SyncError};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How often and how patiently an operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each later one.
    pub base_delay: Duration,
    /// Upper bound for any single delay (before jitter).
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Same attempt budget, no waiting. Used by tests and dry runs.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Backoff before attempt `attempt + 1`, where `attempt` starts at 1.
    /// Up to a quarter of the delay is added as random jitter.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let nominal = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);

        let jitter_ms = nominal.as_millis() as u64 / 4;
        if jitter_ms == 0 {
            return nominal;
        }
        nominal + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }

    /// Run `op` until it succeeds, fails permanently, or the attempt budget
    /// runs out.
    ///
    /// # Errors
    ///
    /// [`SyncError::Rejected`] on the first permanent failure,
    /// [`SyncError::RetriesExhausted`] once every attempt failed transiently.
    pub fn run<T, F>(&self, operation: &'static str, mut op: F) -> Result<T, SyncError>
    where
        F: FnMut() -> Result<T, ExternalServiceError>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{operation} succeeded on attempt {attempt}");
                    }
                    return Ok(value);
                }
                Err(source @ ExternalServiceError::Permanent(_)) => {
                    return Err(SyncError::Rejected { operation, source });
                }
                Err(source) if attempt >= attempts => {
                    return Err(SyncError::RetriesExhausted {
                        operation,
                        attempts,
                        source,
                    });
                }
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        "{operation} failed (attempt {attempt}/{attempts}): {e}; \
                         retrying in {delay:?}"
                    );
                    std::thread::sleep(delay);
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

    #[test]
    fn test_succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result = RetryPolicy::immediate(3).run("probe", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(ExternalServiceError::Transient("timeout".into()))
            } else {
                Ok(calls.get())
            }
        });
        assert_eq!(result, Ok(3));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_exhausts_attempt_budget() {
        let calls = Cell::new(0);
        let result: Result<(), _> = RetryPolicy::immediate(3).run("probe", || {
            calls.set(calls.get() + 1);
            Err(ExternalServiceError::Transient("503".into()))
        });
        assert_eq!(calls.get(), 3);
        assert!(matches!(
            result,
            Err(SyncError::RetriesExhausted { operation: "probe", attempts: 3, .. })
        ));
    }

    #[test]
    fn test_permanent_failure_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = RetryPolicy::immediate(3).run("probe", || {
            calls.set(calls.get() + 1);
            Err(ExternalServiceError::Permanent("401".into()))
        });
        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(SyncError::Rejected { .. })));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let calls = Cell::new(0);
        let _: Result<(), _> = RetryPolicy::immediate(0).run("probe", || {
            calls.set(calls.get() + 1);
            Err(ExternalServiceError::Transient("x".into()))
        });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_delay_grows_and_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
        };
        let first = policy.delay_after(1);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(125));
        let second = policy.delay_after(2);
        assert!(second >= Duration::from_millis(200) && second <= Duration::from_millis(250));
        let capped = policy.delay_after(10);
        assert!(capped >= Duration::from_millis(300) && capped <= Duration::from_millis(375));
    }

    #[test]
    fn test_immediate_policy_never_waits() {
        assert_eq!(RetryPolicy::immediate(3).delay_after(2), Duration::ZERO);
    }
}
