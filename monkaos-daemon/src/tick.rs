//! The periodic driver.
//!
//! Runs one cycle at a time to completion, then sleeps for the tick period.
//! Cycles never overlap.

use crate::config::{Config, CycleFailurePolicy};
use crate::error::Result;
use crate::scheduler::Scheduler;
use monkaos_cluster::ClusterClient;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Drives a [`Scheduler`] forever, or until shutdown.
#[derive(Debug)]
pub struct TickLoop<C> {
    scheduler: Scheduler<C>,
    tick_period: Duration,
    on_failure: CycleFailurePolicy,
    rng: StdRng,
    cycles: u64,
}

impl<C: ClusterClient + 'static> TickLoop<C> {
    /// Create a tick loop from configuration.
    ///
    /// The RNG is seeded from `scheduler.seed` when set, otherwise from the
    /// operating system.
    pub fn new(scheduler: Scheduler<C>, config: &Config) -> Self {
        let rng = match config.scheduler.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            scheduler,
            tick_period: config.scheduler.tick_period(),
            on_failure: config.scheduler.on_cycle_failure,
            rng,
            cycles: 0,
        }
    }

    /// Cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run cycles until `shutdown` fires or a cycle fails under
    /// [`CycleFailurePolicy::Exit`].
    ///
    /// # Errors
    ///
    /// Returns the failing cycle's error under [`CycleFailurePolicy::Exit`].
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        tracing::info!(
            "Tick loop started (period: {}s)",
            self.tick_period.as_secs()
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            self.cycles += 1;
            match self.scheduler.tick(&mut self.rng, &shutdown).await {
                Ok(report) => {
                    tracing::info!(
                        cycle = self.cycles,
                        succeeded = report.succeeded(),
                        failed = report.failed(),
                        abandoned = report.abandoned,
                        past_deadline = report.past_deadline,
                        "Cycle complete"
                    );
                }
                Err(e) => match self.on_failure {
                    CycleFailurePolicy::Exit => {
                        tracing::error!(cycle = self.cycles, "Cycle failed: {}", e);
                        return Err(e);
                    }
                    CycleFailurePolicy::Skip => {
                        tracing::warn!(cycle = self.cycles, "Cycle failed, skipping: {}", e);
                    }
                },
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.tick_period) => {}
            }
        }

        tracing::info!("Tick loop stopped after {} cycles", self.cycles);
        Ok(())
    }
}
