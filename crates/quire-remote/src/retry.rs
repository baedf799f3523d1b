// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded polling with fixed or exponential (jittered) delays.
//
// Only the conversion path polls.  Errors returned by a step are terminal:
// the policy bounds how long we wait for a job, it does not retry failures.

use std::future::Future;
use std::time::Duration;

use quire_core::config::PollingConfig;
use quire_core::error::{QuireError, Result};
use tracing::{debug, warn};

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    Fixed(Duration),
    /// `min(base * 2^attempt + jitter, max)`.
    Backoff { base: Duration, max: Duration },
}

/// Polling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of status checks, including the first.
    pub max_attempts: u32,
    pub delay: Delay,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(30, Duration::from_secs(2))
    }
}

impl From<&PollingConfig> for RetryPolicy {
    fn from(config: &PollingConfig) -> Self {
        match config.max_delay() {
            Some(max) => Self::backoff(config.max_attempts, config.delay(), max),
            None => Self::fixed(config.max_attempts, config.delay()),
        }
    }
}

/// Outcome of one polling step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll<T> {
    Pending,
    Ready(T),
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay: Delay::Fixed(delay),
        }
    }

    pub fn backoff(max_attempts: u32, base: Duration, max: Duration) -> Self {
        Self {
            max_attempts,
            delay: Delay::Backoff { base, max },
        }
    }

    /// Wait before attempt `attempt + 1` (attempts are 0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.delay {
            Delay::Fixed(delay) => delay,
            Delay::Backoff { base, max } => {
                let base_ms = base.as_millis() as u64;
                let exp_ms = base_ms.saturating_mul(1u64 << attempt.min(10));
                let total_ms = exp_ms.saturating_add(jitter(base_ms, attempt));
                Duration::from_millis(total_ms.min(max.as_millis() as u64))
            }
        }
    }

    /// Run `step` until it is ready, sleeping between attempts.
    ///
    /// `step` receives the 0-based attempt number.
    pub async fn poll<T, F, Fut>(&self, mut step: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Poll<T>>>,
    {
        for attempt in 0..self.max_attempts {
            if let Poll::Ready(value) = step(attempt).await? {
                debug!(attempt, "poll ready");
                return Ok(value);
            }
            if attempt + 1 < self.max_attempts {
                let delay = self.delay_for(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "still pending");
                tokio::time::sleep(delay).await;
            }
        }

        warn!(attempts = self.max_attempts, "polling exhausted");
        Err(QuireError::PollingExhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Deterministic spread in `[0, base)` keyed on the attempt number.
fn jitter(base_ms: u64, attempt: u32) -> u64 {
    let hash = (attempt as u64).wrapping_mul(6364136223846793005);
    hash % base_ms.max(1)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::fixed(max_attempts, Duration::from_millis(1))
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy::backoff(10, Duration::from_secs(2), Duration::from_secs(10));
        let d0 = policy.delay_for(0);
        let d1 = policy.delay_for(1);
        let d2 = policy.delay_for(2);
        assert!(d1 > d0);
        assert!(d2 > d1);
        assert!(policy.delay_for(20) <= Duration::from_secs(10));
    }

    #[test]
    fn fixed_delay_is_constant() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(250));
        assert_eq!(policy.delay_for(0), policy.delay_for(7));
    }

    #[test]
    fn policy_from_config() {
        let config = PollingConfig {
            max_attempts: 4,
            delay_ms: 500,
            max_delay_ms: None,
        };
        assert_eq!(
            RetryPolicy::from(&config),
            RetryPolicy::fixed(4, Duration::from_millis(500))
        );
    }

    #[test]
    fn capped_config_selects_backoff() {
        let config = PollingConfig {
            max_attempts: 6,
            delay_ms: 500,
            max_delay_ms: Some(4_000),
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(
            policy,
            RetryPolicy::backoff(6, Duration::from_millis(500), Duration::from_secs(4))
        );
        assert!(policy.delay_for(1) > policy.delay_for(0));
        assert_eq!(policy.delay_for(9), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn ready_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let value = quick(5)
            .poll(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    Ok::<_, QuireError>(if attempt == 2 {
                        Poll::Ready("done")
                    } else {
                        Poll::Pending
                    })
                }
            })
            .await
            .unwrap();
        assert_eq!(value, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_is_an_error() {
        let calls = AtomicU32::new(0);
        let err = quick(3)
            .poll(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<Poll<()>, QuireError>(Poll::Pending) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, QuireError::PollingExhausted { attempts: 3 }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn step_errors_stop_polling() {
        let calls = AtomicU32::new(0);
        let err = quick(5)
            .poll(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<Poll<()>, _>(QuireError::Remote("export failed".into())) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, QuireError::Remote(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
