//! Backoff for transient relayer API failures
//!
//! A failed status poll delays the next one exponentially; the first
//! successful poll returns to the normal polling interval.

use std::time::Duration;

/// Exponential backoff configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay after the first consecutive failure
    pub initial_backoff: Duration,
    /// Upper bound on any delay
    pub max_backoff: Duration,
    /// Growth factor per consecutive failure
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(3),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Backoff starting at the normal polling interval
    pub fn for_poll_interval(poll_interval: Duration) -> Self {
        Self {
            initial_backoff: poll_interval,
            ..Self::default()
        }
    }

    /// Calculate backoff duration for a given attempt (0-indexed)
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_secs = self.initial_backoff.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let capped = backoff_secs.min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(capped)
    }
}
