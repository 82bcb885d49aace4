//! The retry policy of the import adapter.
//!
//! The policy only decides; the caller performs attempts and sleeps.

use core::fmt;
use std::time::Duration;

/// Why an attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// The request timed out.
    Timeout(String),
    /// The request did not reach the endpoint or the reply was cut off.
    Network(String),
    /// The endpoint answered with a 5xx status.
    Server {
        /// The status code.
        status: u16,
        /// The error detail.
        detail: String,
    },
    /// The endpoint answered with a 4xx status.
    Client {
        /// The status code.
        status: u16,
        /// The error detail.
        detail: String,
    },
    /// The reply carries no message content.
    EmptyContent,
    /// The content is not a JSON array.
    Unparsable(String),
}

impl AttemptError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AttemptError::Client { .. })
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Timeout(msg) => write!(f, "request timed out: {msg}"),
            AttemptError::Network(msg) => write!(f, "network error: {msg}"),
            AttemptError::Server { status, detail } => {
                write!(f, "server error {status}: {detail}")
            }
            AttemptError::Client { status, detail } => {
                write!(f, "client error {status}: {detail}")
            }
            AttemptError::EmptyContent => f.write_str("the reply has no content"),
            AttemptError::Unparsable(msg) => write!(f, "the reply is not a JSON list: {msg}"),
        }
    }
}

/// Bounded exponential backoff without jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// The delay after the first failed attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// The delay after failed attempt `index` (0-based).
    pub fn delay(&self, index: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(index)
    }

    /// Decides what follows failed attempt `index` (0-based): `Some(delay)`
    /// to retry after `delay`, `None` to give up.
    pub fn next_delay(&self, index: u32, err: &AttemptError) -> Option<Duration> {
        (err.is_retryable() && index + 1 < self.max_attempts).then(|| self.delay(index))
    }
}

/// Waits between attempts.
pub trait Sleep {
    /// Blocks for `dur`.
    fn sleep(&self, dur: Duration);
}

/// Sleeps on the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&self, dur: Duration) {
        std::thread::sleep(dur);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.delay(1), Duration::from_secs(1));
        assert_eq!(policy.delay(2), Duration::from_secs(2));
    }

    #[test]
    fn budget_is_three_attempts() {
        let policy = RetryPolicy::default();
        let err = AttemptError::EmptyContent;
        assert!(policy.next_delay(0, &err).is_some());
        assert!(policy.next_delay(1, &err).is_some());
        assert!(policy.next_delay(2, &err).is_none());
    }

    #[test]
    fn client_errors_are_terminal() {
        let policy = RetryPolicy::default();
        let err = AttemptError::Client {
            status: 404,
            detail: String::new(),
        };
        assert!(!err.is_retryable());
        assert_eq!(policy.next_delay(0, &err), None);

        let err = AttemptError::Server {
            status: 503,
            detail: String::new(),
        };
        assert!(err.is_retryable());
    }
}
