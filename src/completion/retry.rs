//! Retry policy for upstream completion calls
//!
//! Only connection resets are retried. The default policy retries
//! immediately; a non-zero `base_delay` turns on exponential backoff.

use std::future::Future;
use std::time::{Duration, SystemTime};

use crate::Result;

/// Retry policy for completion requests
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first call
    pub max_retries: u32,
    /// Base delay between retries (doubles each attempt, zero = immediate)
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Whether an error chain bottoms out in a connection reset
///
/// Walks `source()` looking for an `io::ErrorKind::ConnectionReset`, and
/// falls back to the message text since hyper does not always expose the
/// io error.
#[must_use]
pub fn is_connection_reset(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>()
            && io.kind() == std::io::ErrorKind::ConnectionReset
        {
            return true;
        }
        let lower = e.to_string().to_lowercase();
        if lower.contains("connection reset") || lower.contains("econnreset") {
            return true;
        }
        current = e.source();
    }
    false
}

/// Compute the delay before the next retry attempt
///
/// Zero base delay yields zero. Otherwise
/// `min(base_delay * 2^attempt + jitter, max_delay)` with 0-25% jitter.
#[must_use]
pub fn delay_for_attempt(policy: &RetryPolicy, attempt: u32) -> Duration {
    if policy.base_delay.is_zero() {
        return Duration::ZERO;
    }

    let base = policy
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(policy.max_delay);

    let jitter_nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();

    let jitter_fraction = f64::from(jitter_nanos % 250) / 1000.0;
    let jitter = base.mul_f64(jitter_fraction);

    (base + jitter).min(policy.max_delay)
}

/// Run `op`, retrying on transport resets according to `policy`
///
/// # Errors
///
/// Returns the first non-retryable error, or the last transport reset once
/// retries are exhausted
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transport_reset() && attempt < policy.max_retries => {
                tracing::warn!(attempt = attempt + 1, max = policy.max_retries, "connection reset, retrying");
                let delay = delay_for_attempt(policy, attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn transport_reset_retried_three_times() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&RetryPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::TransportReset("reset".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(Error::TransportReset(_))));
        // first call plus three retries
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn rejected_request_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&RetryPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(Error::UpstreamRejected {
                    status: 429,
                    body: "slow down".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(Error::UpstreamRejected { status: 429, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_reset() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&RetryPolicy::default(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::TransportReset("reset".to_string()))
                } else {
                    Ok("answer")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "answer");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn default_policy_is_immediate() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(delay_for_attempt(&policy, 0), Duration::ZERO);
        assert_eq!(delay_for_attempt(&policy, 2), Duration::ZERO);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            ..RetryPolicy::default()
        };

        let d0 = delay_for_attempt(&policy, 0);
        let d1 = delay_for_attempt(&policy, 1);
        let d5 = delay_for_attempt(&policy, 5);

        assert!(d0 >= Duration::from_millis(100), "attempt 0: {d0:?}");
        assert!(d1 >= Duration::from_millis(200), "attempt 1: {d1:?}");
        assert_eq!(d5, policy.max_delay);
    }

    #[test]
    fn detects_io_connection_reset() {
        let err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer gone");
        assert!(is_connection_reset(&err));
    }

    #[test]
    fn detects_reset_in_message() {
        let err = std::io::Error::other("read ECONNRESET");
        assert!(is_connection_reset(&err));
    }

    #[test]
    fn ignores_other_io_errors() {
        let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(!is_connection_reset(&err));
    }
}
