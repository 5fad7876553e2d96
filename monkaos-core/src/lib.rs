//! # monkaos-core
//!
//! Pure logic for monkaos (no I/O, instant tests).
//!
//! This crate holds the value types and the randomized decisions that the
//! chaos engine makes each cycle:
//! - which selection [`Strategy`] is in force
//! - how long each termination is delayed ([`LatencyPolicy`])
//! - how selection copes with transiently empty namespaces ([`RetryPolicy`])
//!
//! Every random draw goes through a caller-supplied [`rand::Rng`], so tests
//! can pin behavior with a seeded generator. Cluster access, timers and
//! logging sinks live in `monkaos-cluster` and `monkaos`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod latency;
pub mod retry;
pub mod strategy;
pub mod victim;

pub use latency::LatencyPolicy;
pub use retry::RetryPolicy;
pub use strategy::{Strategy, UnknownStrategy};
pub use victim::{Outcome, Victim};
