//! Per-task execution delay.
//!
//! Every task in a cycle is delayed relative to the same cycle-start
//! instant, so offsets are drawn independently with no skew correction.

use rand::Rng;
use std::time::Duration;

/// How far after cycle start each termination fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatencyPolicy {
    /// Upper bound on the delay.
    pub max_latency: Duration,
    /// Draw a random delay below `max_latency` instead of using it exactly.
    pub random: bool,
}

impl LatencyPolicy {
    /// Policy that always delays by exactly `max_latency`.
    pub fn fixed(max_latency: Duration) -> Self {
        Self {
            max_latency,
            random: false,
        }
    }

    /// Policy that delays by a random whole number of seconds in
    /// `[0, max_latency)`.
    pub fn random(max_latency: Duration) -> Self {
        Self {
            max_latency,
            random: true,
        }
    }

    /// Draw the offset for one task.
    ///
    /// Random offsets have whole-second granularity. A random policy whose
    /// bound is below one second always yields zero.
    pub fn offset<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if !self.random {
            return self.max_latency;
        }

        let max_secs = self.max_latency.as_secs();
        if max_secs == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs(rng.gen_range(0..max_secs))
    }
}
