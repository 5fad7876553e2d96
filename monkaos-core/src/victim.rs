//! Victim identities and termination outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A workload selected for termination.
///
/// Immutable once created; the same pod may appear more than once in a
/// single schedule because selection does not deduplicate draws.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Victim {
    /// Namespace the pod lives in.
    pub namespace: String,
    /// Pod name.
    pub name: String,
}

impl Victim {
    /// Create a victim from a namespace and pod name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Victim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Outcome of a single termination attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The pod was deleted.
    Success,
    /// The delete call failed with the given reason.
    Failure(String),
}

impl Outcome {
    /// Returns true for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}
