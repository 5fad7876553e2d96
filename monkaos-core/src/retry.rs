//! Retry budget for selection under transient emptiness.

use std::time::Duration;

/// Default number of empty-namespace retries per selection.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Default wait between empty-namespace retries.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// How selection retries when a drawn namespace has no pods.
///
/// The budget is shared across all namespace draws of one selection, not
/// reset per victim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed before returning a partial victim list.
    pub max_retries: u32,
    /// Wait before each retry.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Create a retry policy.
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// True once `used` retries have consumed the budget.
    pub fn exhausted(&self, used: u32) -> bool {
        used >= self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF)
    }
}
