//! Bounded-attempt connection establishment with linear backoff.
//!
//! [`establish`] drives a caller-supplied connect-and-probe future up to
//! [`RetryPolicy::max_attempts`] times. Every attempt is bounded by
//! [`RetryPolicy::probe_timeout`], failed attempts are logged with the
//! redacted target, and attempt `i` is followed by a sleep of
//! `i * base_delay` before the next one. The sleep goes through
//! `tokio::time`, so tests drive it with a paused clock.

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Attempt count and backoff for one backend's startup connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (at least one attempt is always made).
    pub max_attempts: u32,
    /// Base delay; attempt `i` (1-based) waits `i * base_delay` afterwards.
    pub base_delay: Duration,
    /// Upper bound on a single connect + liveness probe.
    pub probe_timeout: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration, probe_timeout: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            probe_timeout,
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(3))
    }
}

/// Why a single attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError<E> {
    /// The connect or probe returned an error.
    #[error("{0}")]
    Failed(E),
    /// The attempt did not finish within the probe timeout.
    #[error("timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
}

/// Result of [`establish`].
#[derive(Debug)]
pub enum Establishment<T, E> {
    /// A live, probed handle.
    Connected {
        /// The connection handle.
        handle: T,
        /// 1-based attempt that succeeded.
        attempt: u32,
    },
    /// Every attempt failed.
    Unreachable {
        /// Error from the final attempt.
        last_error: AttemptError<E>,
        /// Number of attempts made.
        attempts: u32,
    },
}

impl<T, E> Establishment<T, E> {
    /// Returns `true` for [`Establishment::Connected`].
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Maps the connected handle, keeping the failure untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Establishment<U, E> {
        match self {
            Self::Connected { handle, attempt } => Establishment::Connected {
                handle: f(handle),
                attempt,
            },
            Self::Unreachable {
                last_error,
                attempts,
            } => Establishment::Unreachable {
                last_error,
                attempts,
            },
        }
    }
}

/// Attempts `connect` until it succeeds or the policy is exhausted.
///
/// `target` is only used for diagnostics and must already be redacted.
/// Never sleeps after the final attempt.
pub async fn establish<T, E, F, Fut>(
    policy: &RetryPolicy,
    backend: &str,
    target: &dyn fmt::Display,
    mut connect: F,
) -> Establishment<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        let error = match tokio::time::timeout(policy.probe_timeout, connect()).await {
            Ok(Ok(handle)) => {
                tracing::info!(backend, attempt, %target, "connected");
                return Establishment::Connected { handle, attempt };
            }
            Ok(Err(e)) => AttemptError::Failed(e),
            Err(_) => AttemptError::TimedOut(policy.probe_timeout),
        };

        tracing::warn!(
            backend,
            attempt,
            max_attempts,
            %target,
            error = %error,
            "connection attempt failed"
        );

        if attempt >= max_attempts {
            return Establishment::Unreachable {
                last_error: error,
                attempts: attempt,
            };
        }
        tokio::time::sleep(policy.backoff(attempt)).await;
        attempt += 1;
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_secs(1), Duration::from_secs(2))
    }

    #[test]
    fn backoff_is_linear_in_attempt() {
        let p = policy(3);
        assert_eq!(p.backoff(1), Duration::from_secs(1));
        assert_eq!(p.backoff(2), Duration::from_secs(2));
        assert_eq!(p.backoff(3), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_returns_immediately() {
        let start = Instant::now();
        let outcome: Establishment<u8, String> =
            establish(&policy(3), "store", &"db", || async { Ok(7) }).await;

        let Establishment::Connected { handle, attempt } = outcome else {
            panic!("expected connection");
        };
        assert_eq!(handle, 7);
        assert_eq!(attempt, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();
        let counter = Arc::clone(&calls);
        let outcome = establish(&policy(3), "store", &"db", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(format!("refused #{n}"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        let Establishment::Connected { handle, attempt } = outcome else {
            panic!("expected connection");
        };
        assert_eq!(handle, 3);
        assert_eq!(attempt, 3);
        // 1s after attempt 1, 2s after attempt 2
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_attempts_without_trailing_sleep() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();
        let counter = Arc::clone(&calls);
        let outcome: Establishment<(), String> = establish(&policy(3), "store", &"db", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err("connection refused".to_string()) }
        })
        .await;

        let Establishment::Unreachable {
            last_error,
            attempts,
        } = outcome
        else {
            panic!("expected failure");
        };
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(last_error.to_string(), "connection refused");
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_probe_times_out() {
        let outcome: Establishment<(), String> = establish(&policy(1), "cache", &"redis", || {
            std::future::pending::<Result<(), String>>()
        })
        .await;

        let Establishment::Unreachable { last_error, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(last_error.to_string(), "timed out after 2000ms");
        assert!(matches!(last_error, AttemptError::TimedOut(d) if d == Duration::from_secs(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_tries_once() {
        let outcome: Establishment<(), String> =
            establish(&policy(0), "cache", &"redis", || async { Err("down".to_string()) }).await;
        assert!(!outcome.is_connected());
        let Establishment::Unreachable { attempts, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(attempts, 1);
    }
}
