use crate::config::BackoffConfig;
use rand::Rng;
use std::time::Duration;

/// Computes retry delays: exponential growth with jitter, bounded both ways
///
/// The policy itself is stateless; callers pass the 0-based retry attempt.
/// A server-communicated wait, when one is known, is authoritative and
/// returned unmodified.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    base: f64,
    ceiling: f64,
    multiplier: f64,
    jitter: f64,
}

impl BackoffPolicy {
    /// Creates a policy from configuration
    pub fn new(config: &BackoffConfig) -> Self {
        Self {
            base: config.base_seconds,
            ceiling: config.ceiling_seconds,
            multiplier: config.multiplier,
            jitter: config.jitter,
        }
    }

    /// Computes the delay for the given attempt, drawing fresh jitter
    ///
    /// # Arguments
    ///
    /// * `attempt` - 0-based retry count
    /// * `explicit` - server-communicated wait, if one was signalled
    pub fn delay(&self, attempt: u32, explicit: Option<Duration>) -> Duration {
        let unit = rand::rng().random_range(-1.0..=1.0);
        self.delay_with(attempt, explicit, unit)
    }

    /// Computes the delay with an injected jitter unit in `[-1, 1]`
    ///
    /// Split out from [`Self::delay`] so tests can pin the jitter source.
    pub fn delay_with(&self, attempt: u32, explicit: Option<Duration>, jitter_unit: f64) -> Duration {
        if let Some(wait) = explicit {
            return wait;
        }

        let raw = self.base * self.multiplier.powi(attempt as i32);
        let jittered = raw + raw * self.jitter * jitter_unit;
        let clamped = jittered.max(self.base).min(self.ceiling);
        Duration::from_secs_f64(clamped)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(&BackoffConfig::default())
    }
}
