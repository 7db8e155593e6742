//! Reconnection logic for the feed connection.

use std::time::Duration;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Whether reconnection is enabled.
    pub enabled: bool,
    /// Fixed delay between reconnect attempts.
    pub delay: Duration,
    /// Maximum number of reconnect attempts (0 = unlimited).
    pub max_attempts: usize,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: Duration::from_secs(3),
            max_attempts: 5,
        }
    }
}

/// Tracks reconnection attempts against the configured budget.
pub struct ReconnectState {
    config: ReconnectConfig,
    attempts: usize,
}

impl ReconnectState {
    /// Creates a new reconnect state with the given configuration.
    #[must_use]
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Records a lost connection and returns the delay before the next
    /// attempt.
    ///
    /// The delay is constant between attempts; there is no backoff.
    /// Returns `None` once the attempt budget is spent or reconnection
    /// is disabled.
    pub fn on_failure(&mut self) -> Option<Duration> {
        if !self.config.enabled {
            return None;
        }

        if self.config.max_attempts > 0 && self.attempts >= self.config.max_attempts {
            return None;
        }

        self.attempts += 1;
        Some(self.config.delay)
    }

    /// Resets the attempt counter after a successful connection.
    pub fn on_success(&mut self) {
        self.attempts = 0;
    }

    /// Returns the number of attempts made since the last successful
    /// connection.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Returns true if more reconnection attempts are allowed.
    #[must_use]
    pub fn can_retry(&self) -> bool {
        self.config.enabled
            && (self.config.max_attempts == 0 || self.attempts < self.config.max_attempts)
    }
}
