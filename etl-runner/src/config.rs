//! Supervisor configuration
//!
//! Defines the timing parameters of the supervisor loop: the pause after a
//! successful run, the backoff after a failed one, and the per-run timeout.
//! The ETL job resolves its own connection settings, see
//! [`crate::service::settings`].

use std::time::Duration;

use crate::scheduler::{Backoff, RetryPolicy};

/// Pause after a successful run
pub const DEFAULT_SUCCESS_DELAY: Duration = Duration::ZERO;

/// Backoff after a failed run
pub const DEFAULT_FAILURE_DELAY: Duration = Duration::from_secs(60);

/// Ceiling for exponential backoff
pub const DEFAULT_MAX_FAILURE_DELAY: Duration = Duration::from_secs(3600);

/// Maximum time a single run may take
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(3600);

/// Supervisor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How long to wait after a successful run before the next one
    pub success_delay: Duration,

    /// How long to wait after a failed run before the next one
    pub failure_delay: Duration,

    /// Whether the failure delay stays fixed or grows with consecutive failures
    pub backoff: Backoff,

    /// Maximum time a single run can take before it counts as failed
    pub job_timeout: Duration,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - ETL_SUCCESS_DELAY (seconds, default: 0)
    /// - ETL_FAILURE_DELAY (seconds, default: 60)
    /// - ETL_BACKOFF ("fixed" or "exponential", default: fixed)
    /// - ETL_MAX_FAILURE_DELAY (seconds, default: 3600, exponential only)
    /// - ETL_JOB_TIMEOUT (seconds, default: 3600)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    ///
    /// Unparsable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let seconds = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        let success_delay = seconds("ETL_SUCCESS_DELAY", DEFAULT_SUCCESS_DELAY);
        let failure_delay = seconds("ETL_FAILURE_DELAY", DEFAULT_FAILURE_DELAY);
        let job_timeout = seconds("ETL_JOB_TIMEOUT", DEFAULT_JOB_TIMEOUT);

        let backoff = match lookup("ETL_BACKOFF")
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("exponential") => Backoff::Exponential {
                max_delay: seconds("ETL_MAX_FAILURE_DELAY", DEFAULT_MAX_FAILURE_DELAY),
            },
            _ => Backoff::Fixed,
        };

        Self {
            success_delay,
            failure_delay,
            backoff,
            job_timeout,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.failure_delay.is_zero() {
            anyhow::bail!("failure_delay must be greater than 0");
        }

        if self.job_timeout.is_zero() {
            anyhow::bail!("job_timeout must be greater than 0");
        }

        if let Backoff::Exponential { max_delay } = self.backoff {
            if max_delay < self.failure_delay {
                anyhow::bail!("max_failure_delay must not be lower than failure_delay");
            }
        }

        Ok(())
    }

    /// Retry policy the supervisor applies between runs
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            success_delay: self.success_delay,
            failure_delay: self.failure_delay,
            backoff: self.backoff,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            success_delay: DEFAULT_SUCCESS_DELAY,
            failure_delay: DEFAULT_FAILURE_DELAY,
            backoff: Backoff::Fixed,
            job_timeout: DEFAULT_JOB_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.success_delay, Duration::ZERO);
        assert_eq!(config.failure_delay, Duration::from_secs(60));
        assert_eq!(config.backoff, Backoff::Fixed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(Config::from_lookup(lookup(&[])), Config::default());
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("ETL_SUCCESS_DELAY", "5"),
            ("ETL_FAILURE_DELAY", "30"),
            ("ETL_JOB_TIMEOUT", "120"),
        ]));

        assert_eq!(config.success_delay, Duration::from_secs(5));
        assert_eq!(config.failure_delay, Duration::from_secs(30));
        assert_eq!(config.job_timeout, Duration::from_secs(120));
        assert_eq!(config.backoff, Backoff::Fixed);
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = Config::from_lookup(lookup(&[
            ("ETL_FAILURE_DELAY", "a minute"),
            ("ETL_BACKOFF", "random"),
        ]));

        assert_eq!(config.failure_delay, DEFAULT_FAILURE_DELAY);
        assert_eq!(config.backoff, Backoff::Fixed);
    }

    #[test]
    fn test_exponential_backoff() {
        let config = Config::from_lookup(lookup(&[
            ("ETL_BACKOFF", "Exponential"),
            ("ETL_MAX_FAILURE_DELAY", "600"),
        ]));

        assert_eq!(
            config.backoff,
            Backoff::Exponential {
                max_delay: Duration::from_secs(600)
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.failure_delay = Duration::ZERO;
        assert!(config.validate().is_err());
        config.failure_delay = DEFAULT_FAILURE_DELAY;

        config.job_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
        config.job_timeout = DEFAULT_JOB_TIMEOUT;

        config.backoff = Backoff::Exponential {
            max_delay: Duration::from_secs(10),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_policy_mirrors_config() {
        let config = Config::default();
        let policy = config.retry_policy();
        assert_eq!(policy.success_delay, config.success_delay);
        assert_eq!(policy.failure_delay, config.failure_delay);
        assert_eq!(policy.backoff, config.backoff);
    }
}
