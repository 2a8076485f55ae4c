//! Reconnection Policy
//!
//! Backoff policy for the stream sessions. The metrics session grows its
//! delay geometrically up to a ceiling and resets to the floor on every
//! successful open; the transaction session uses a fixed delay via
//! [`ReconnectConfig::fixed`].

use std::time::Duration;

use rand::Rng;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt, and the floor the
    /// policy resets to after a successful open.
    pub initial_delay: Duration,
    /// Ceiling on the delay between attempts.
    pub max_delay: Duration,
    /// Growth factor applied after each attempt (1.0 = fixed delay).
    pub multiplier: f64,
    /// Jitter as a fraction of the delay (0.0 = none).
    pub jitter_factor: f64,
    /// Maximum attempts before giving up (0 = retry forever).
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            multiplier: 1.5,
            jitter_factor: 0.0,
            max_attempts: 0, // Unlimited
        }
    }
}

impl ReconnectConfig {
    /// Fixed-delay configuration: every attempt waits `delay`, forever.
    #[must_use]
    pub const fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1.0,
            jitter_factor: 0.0,
            max_attempts: 0,
        }
    }
}

/// Reconnection policy tracking the current delay and attempt count.
///
/// # Example
///
/// ```rust
/// use engine_telemetry_client::infrastructure::engine::reconnect::{
///     ReconnectConfig, ReconnectPolicy,
/// };
///
/// let mut policy = ReconnectPolicy::new(ReconnectConfig::default());
/// let first = policy.next_delay();
/// assert!(first.is_some());
///
/// // After a successful open the delay returns to its floor.
/// policy.reset();
/// ```
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    current_delay: Duration,
    attempt_count: u32,
}

impl ReconnectPolicy {
    /// Create a policy starting at the configured floor.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        let initial_delay = config.initial_delay;
        Self {
            config,
            current_delay: initial_delay,
            attempt_count: 0,
        }
    }

    /// Get the delay to wait before the next attempt, growing the delay
    /// for subsequent calls. Returns `None` once max attempts are spent.
    #[must_use]
    pub fn next_delay(&mut self) -> Option<Duration> {
        if !self.should_retry() {
            return None;
        }
        self.attempt_count += 1;

        let delay = self.apply_jitter(self.current_delay);
        self.current_delay = self
            .current_delay
            .mul_f64(self.config.multiplier)
            .min(self.config.max_delay);

        Some(delay)
    }

    /// Reset after a successful connection: delay back to the floor,
    /// attempt count cleared.
    pub const fn reset(&mut self) {
        self.current_delay = self.config.initial_delay;
        self.attempt_count = 0;
    }

    /// Attempts made since the last reset.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Whether another attempt is allowed.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        self.config.max_attempts == 0 || self.attempt_count < self.config.max_attempts
    }

    fn apply_jitter(&self, duration: Duration) -> Duration {
        if self.config.jitter_factor <= 0.0 {
            return duration;
        }

        #[allow(clippy::cast_precision_loss)]
        let base_millis = duration.as_millis() as f64;
        let jitter_range = base_millis * self.config.jitter_factor;
        let mut rng = rand::rng();
        let jitter: f64 = rng.random_range(-jitter_range..=jitter_range);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Duration::from_millis((base_millis + jitter).max(1.0) as u64)
    }
}
