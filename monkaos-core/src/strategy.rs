//! Victim selection strategies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A selection policy for choosing victims.
///
/// Adding a variant forces every `match` on `Strategy` to handle it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Strategy {
    /// Draw a uniformly random eligible namespace, then a uniformly random
    /// pod from it.
    #[default]
    RandomPodRandomNamespace,
}

/// Returned by [`Strategy::from_str`] for names that match no strategy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy: {0}")]
pub struct UnknownStrategy(pub String);

impl Strategy {
    /// Canonical configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::RandomPodRandomNamespace => "RandomPodRandomNamespace",
        }
    }

    /// Parse a strategy name, falling back to the default strategy for
    /// names that match nothing.
    pub fn from_name_lenient(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: UnknownStrategy| {
            let fallback = Strategy::default();
            tracing::warn!("{}, falling back to {}", err, fallback);
            fallback
        })
    }
}

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RandomPodRandomNamespace" => Ok(Strategy::RandomPodRandomNamespace),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

impl From<String> for Strategy {
    fn from(name: String) -> Self {
        Strategy::from_name_lenient(&name)
    }
}

impl From<Strategy> for String {
    fn from(strategy: Strategy) -> Self {
        strategy.as_str().to_string()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
