//! # monkaos
//!
//! Chaos monkey for Kubernetes.
//!
//! On every tick, monkaos picks a few running pods at random from the
//! namespaces that are not excluded, schedules each for termination after
//! its own delay, and deletes them, with the whole batch bounded by a hard
//! deadline. Pods that would fire after the deadline are left alone.
//!
//! ## Architecture
//!
//! ```text
//! TickLoop ──► Scheduler::next() ──► VictimSelector ──► ScheduleBuilder
//!    ▲                                                        │
//!    │                                                    Schedule
//!    │                                                        ▼
//!    └──── sleep ◄── CycleReport ◄── Scheduler::execute() ── TaskExecutor × N
//! ```
//!
//! Cluster access goes through [`monkaos_cluster::ClusterClient`], so the
//! whole engine runs against [`monkaos_cluster::MockCluster`] in tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod schedule;
pub mod scheduler;
pub mod selector;
pub mod tick;

pub use config::{Config, CycleFailurePolicy};
pub use error::{MonkeyError, Result};
pub use executor::{Abandoned, TaskExecutor, TaskResult};
pub use schedule::{Schedule, ScheduleBuilder, Task};
pub use scheduler::{CycleReport, Scheduler};
pub use selector::VictimSelector;
pub use tick::TickLoop;
