//! Retry policy
//!
//! Decides how long the supervisor sleeps between two runs.

use std::time::Duration;

use crate::config::{DEFAULT_FAILURE_DELAY, DEFAULT_SUCCESS_DELAY};

/// How the failure delay evolves across consecutive failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Always wait `failure_delay`
    Fixed,
    /// Double `failure_delay` per consecutive failure, capped at `max_delay`
    Exponential { max_delay: Duration },
}

/// Delays applied by the supervisor between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub success_delay: Duration,
    pub failure_delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Delay after the `consecutive_failures`-th failure in a row (1-based)
    ///
    /// Never shorter than `failure_delay`.
    pub fn failure_delay_for(&self, consecutive_failures: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.failure_delay,
            Backoff::Exponential { max_delay } => {
                let exponent = consecutive_failures.saturating_sub(1);
                2u32.checked_pow(exponent)
                    .and_then(|factor| self.failure_delay.checked_mul(factor))
                    .map_or(max_delay, |delay| delay.min(max_delay))
                    .max(self.failure_delay)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            success_delay: DEFAULT_SUCCESS_DELAY,
            failure_delay: DEFAULT_FAILURE_DELAY,
            backoff: Backoff::Fixed,
        }
    }
}

/// Renders a delay the way operators read it in logs: `60s`, or `250ms`
pub fn format_delay(delay: Duration) -> String {
    if delay.subsec_nanos() == 0 {
        format!("{}s", delay.as_secs())
    } else {
        format!("{}ms", delay.as_millis())
    }
}

/// Log line emitted after a failed run
pub fn failure_message(delay: Duration, diagnostic: &str) -> String {
    format!("ETL failed, retrying in {}: {}", format_delay(delay), diagnostic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay_never_grows() {
        let policy = RetryPolicy::default();
        for failures in [1, 2, 10, 1000, u32::MAX] {
            assert_eq!(policy.failure_delay_for(failures), Duration::from_secs(60));
        }
    }

    #[test]
    fn test_exponential_delay_doubles_until_cap() {
        let policy = RetryPolicy {
            backoff: Backoff::Exponential {
                max_delay: Duration::from_secs(300),
            },
            ..RetryPolicy::default()
        };

        assert_eq!(policy.failure_delay_for(1), Duration::from_secs(60));
        assert_eq!(policy.failure_delay_for(2), Duration::from_secs(120));
        assert_eq!(policy.failure_delay_for(3), Duration::from_secs(240));
        assert_eq!(policy.failure_delay_for(4), Duration::from_secs(300));
        assert_eq!(policy.failure_delay_for(u32::MAX), Duration::from_secs(300));
    }

    #[test]
    fn test_exponential_delay_never_below_base() {
        let policy = RetryPolicy {
            backoff: Backoff::Exponential {
                max_delay: Duration::from_secs(10),
            },
            ..RetryPolicy::default()
        };

        assert_eq!(policy.failure_delay_for(0), Duration::from_secs(60));
        assert_eq!(policy.failure_delay_for(5), Duration::from_secs(60));
    }

    #[test]
    fn test_format_delay() {
        assert_eq!(format_delay(Duration::from_secs(60)), "60s");
        assert_eq!(format_delay(Duration::ZERO), "0s");
        assert_eq!(format_delay(Duration::from_millis(1500)), "1500ms");
    }

    #[test]
    fn test_failure_message_carries_prefix_and_detail() {
        let message = failure_message(Duration::from_secs(60), "connection refused");
        assert!(message.contains("ETL failed, retrying in 60s"));
        assert!(message.contains("connection refused"));
    }
}
