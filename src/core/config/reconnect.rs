// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconnection policy for source connectors.
//!
//! Reconnection is opt-in. With the default policy a connector that fails to
//! connect, or whose connection ends, stays down for the rest of the run.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconnectConfig {
    /// Reconnect after failures and closed connections (default: false)
    pub enabled: bool,
    /// Delay before the first retry in milliseconds (default: 1000)
    pub initial_delay_ms: u64,
    /// Backoff cap in milliseconds (default: 30000)
    pub max_delay_ms: u64,
    /// Maximum consecutive failed attempts, -1 = unlimited (default: -1)
    pub max_attempts: i32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            max_attempts: -1,
        }
    }
}

impl ReconnectConfig {
    /// Policy with reconnection switched on and default delays
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(
                "reconnect.initial_delay_ms cannot be greater than reconnect.max_delay_ms"
                    .to_string(),
            );
        }
        if self.max_attempts == 0 || self.max_attempts < -1 {
            return Err("reconnect.max_attempts must be positive or -1 (unlimited)".to_string());
        }
        Ok(())
    }

    /// Whether another connection attempt is allowed after `failed_attempts`
    /// consecutive failures.
    pub fn should_retry(&self, failed_attempts: u32) -> bool {
        self.enabled
            && (self.max_attempts < 0 || (failed_attempts as i64) < self.max_attempts as i64)
    }

    /// Delay before retry number `attempt` (1-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        exponential_backoff(
            attempt,
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

/// delay = min(initial_delay * 2^(attempt-1), max_delay)
pub fn exponential_backoff(attempt: u32, initial_delay: Duration, max_delay: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let multiplier = 2u64.saturating_pow(attempt - 1);
    let delay_ms = (initial_delay.as_millis() as u64).saturating_mul(multiplier);

    Duration::from_millis(delay_ms).min(max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disabled() {
        let config = ReconnectConfig::default();
        assert!(!config.enabled);
        assert!(!config.should_retry(0));
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let initial = Duration::from_millis(100);
        let max = Duration::from_secs(1);
        assert_eq!(exponential_backoff(0, initial, max), Duration::ZERO);
        assert_eq!(exponential_backoff(1, initial, max), Duration::from_millis(100));
        assert_eq!(exponential_backoff(2, initial, max), Duration::from_millis(200));
        assert_eq!(exponential_backoff(4, initial, max), Duration::from_millis(800));
        assert_eq!(exponential_backoff(5, initial, max), max);
        assert_eq!(exponential_backoff(64, initial, max), max);
    }

    #[test]
    fn test_bounded_attempts() {
        let config = ReconnectConfig {
            max_attempts: 3,
            ..ReconnectConfig::enabled()
        };
        assert!(config.should_retry(0));
        assert!(config.should_retry(2));
        assert!(!config.should_retry(3));

        let unlimited = ReconnectConfig::enabled();
        assert!(unlimited.should_retry(10_000));
    }

    #[test]
    fn test_validate() {
        assert!(ReconnectConfig::default().validate().is_ok());

        let inverted = ReconnectConfig {
            initial_delay_ms: 5000,
            max_delay_ms: 100,
            ..ReconnectConfig::default()
        };
        assert!(inverted.validate().unwrap_err().contains("initial_delay_ms"));

        let zero = ReconnectConfig {
            max_attempts: 0,
            ..ReconnectConfig::default()
        };
        assert!(zero.validate().is_err());
    }
}
