//! Reconnect backoff
//!
//! Exponential delay with random jitter, reset after every successful connect.

use rand::Rng;
use std::time::Duration;

/// Default first delay
const BASE_DELAY: Duration = Duration::from_millis(500);

/// Default delay cap
const MAX_DELAY: Duration = Duration::from_secs(10);

/// Exponential reconnect backoff
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempts: u32,
}

impl Backoff {
    /// Create a backoff doubling from `base` up to `max`
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            attempts: 0,
        }
    }

    /// Failed attempts since the last reset
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Forget previous failures
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Delay before the next attempt, without jitter
    pub fn current_delay(&self) -> Duration {
        let factor = 1u32.checked_shl(self.attempts.min(16)).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Record a failed attempt and return how long to wait (up to 25% jitter)
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current_delay();
        self.attempts = self.attempts.saturating_add(1);

        let jitter_ms = u64::try_from(delay.as_millis() / 4).unwrap_or(0);
        if jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BASE_DELAY, MAX_DELAY)
    }
}
