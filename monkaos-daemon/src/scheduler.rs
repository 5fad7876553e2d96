//! Cycle orchestration.
//!
//! One cycle selects victims, builds a [`Schedule`], and runs every task
//! concurrently under a shared deadline:
//!
//! ```text
//!   next()                         execute()
//!   ──────                         ─────────
//!   VictimSelector ─► victims      ┌─ executor ─┐
//!   ScheduleBuilder ─► Schedule ──►├─ executor ─┼─► results ─► aggregator
//!                                  └─ executor ─┘
//!                                        ▲
//!                     deadline timer ────┘ (cancels waiting executors)
//! ```
//!
//! `execute` returns once every executor has finished. The aggregator may
//! retire early at the deadline; the result channel is sized to the task
//! count so a late executor never blocks on send, and anything it sent is
//! drained into the report after the join.

use crate::config::Config;
use crate::error::Result;
use crate::executor::{Abandoned, TaskExecutor, TaskResult};
use crate::schedule::{Schedule, ScheduleBuilder};
use crate::selector::VictimSelector;
use monkaos_cluster::ClusterClient;
use monkaos_core::{Outcome, Strategy};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// What happened during one cycle's execution.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// One entry per attempted termination.
    pub results: Vec<TaskResult>,
    /// Tasks that never reached their kill time.
    pub abandoned: usize,
    /// Abandoned tasks whose kill time fell at or after the deadline.
    pub past_deadline: usize,
    /// The deadline cut off at least one task.
    pub deadline_exceeded: bool,
}

impl CycleReport {
    /// Number of successful terminations.
    pub fn succeeded(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome.is_success())
            .count()
    }

    /// Number of failed terminations.
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Drives selection, scheduling and execution for one cycle at a time.
#[derive(Debug)]
pub struct Scheduler<C> {
    selector: VictimSelector<C>,
    builder: ScheduleBuilder,
    executor: TaskExecutor<C>,
    victims_per_schedule: usize,
    strategy: Strategy,
    deadline: Duration,
}

impl<C: ClusterClient + 'static> Scheduler<C> {
    /// Create a scheduler from configuration.
    pub fn new(cluster: Arc<C>, config: &Config) -> Self {
        Self {
            selector: VictimSelector::from_config(Arc::clone(&cluster), config),
            builder: ScheduleBuilder::new(config.scheduler.latency_policy()),
            executor: TaskExecutor::new(cluster, config.chaos.termination_grace_period_secs),
            victims_per_schedule: config.chaos.victims_per_schedule,
            strategy: config.chaos.strategy,
            deadline: config.scheduler.deadline(),
        }
    }

    /// Select victims and build the next schedule.
    ///
    /// # Errors
    ///
    /// Propagates selection failures; the cycle cannot proceed.
    pub async fn next<R>(&self, rng: &mut R) -> Result<Schedule>
    where
        R: Rng + Send,
    {
        self.next_until(rng, &CancellationToken::new()).await
    }

    /// Like [`next`](Self::next), but selection stops retrying when
    /// `shutdown` fires.
    pub async fn next_until<R>(
        &self,
        rng: &mut R,
        shutdown: &CancellationToken,
    ) -> Result<Schedule>
    where
        R: Rng + Send,
    {
        tracing::info!("Status Update: Generating schedule for terminations");

        let victims = self
            .selector
            .select_until(self.victims_per_schedule, self.strategy, rng, shutdown)
            .await?;

        Ok(self.builder.build(victims, Instant::now(), rng))
    }

    /// Run every task of `schedule` and wait for all executors to finish.
    pub async fn execute(&self, schedule: &Schedule) -> CycleReport {
        self.execute_until(schedule, &CancellationToken::new()).await
    }

    /// Like [`execute`](Self::execute), but pending tasks are also abandoned
    /// when `shutdown` fires.
    pub async fn execute_until(
        &self,
        schedule: &Schedule,
        shutdown: &CancellationToken,
    ) -> CycleReport {
        let deadline = schedule.started_at() + self.deadline;
        let cancel = shutdown.child_token();
        let expected = schedule.len();

        let timer = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                cancel.cancel();
            })
        };

        let (tx, rx) = mpsc::channel(expected.max(1));

        tracing::info!("Status Update: Waiting to run {} scheduled chaos", expected);
        let aggregator = tokio::spawn(aggregate(rx, expected, cancel.clone()));

        let mut executors: JoinSet<Option<Abandoned>> = JoinSet::new();
        for task in schedule.tasks().iter().cloned() {
            let executor = self.executor.clone();
            let cancel = cancel.clone();
            let shutdown = shutdown.clone();
            let tx = tx.clone();
            executors.spawn(async move {
                match executor.run(&task, deadline, &cancel).await {
                    Ok(result) => {
                        // Capacity equals the task count, so this never waits.
                        let _ = tx.try_send(result);
                        None
                    }
                    Err(reason) => {
                        // The deadline timer is the only other source of cancellation.
                        let reason = match reason {
                            Abandoned::Cancelled if !shutdown.is_cancelled() => {
                                Abandoned::PastDeadline
                            }
                            other => other,
                        };
                        tracing::warn!(
                            namespace = %task.victim.namespace,
                            pod = %task.victim.name,
                            "Chaos abandoned for {}: {:?}",
                            task.victim,
                            reason
                        );
                        Some(reason)
                    }
                }
            });
        }
        drop(tx);

        let mut report = CycleReport::default();
        while let Some(joined) = executors.join_next().await {
            match joined {
                Ok(Some(reason)) => {
                    report.abandoned += 1;
                    if reason == Abandoned::PastDeadline {
                        report.past_deadline += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::error!("Chaos executor failed to complete: {}", e),
            }
        }
        timer.abort();

        let mut rx = match aggregator.await {
            Ok((results, rx)) => {
                report.results = results;
                rx
            }
            Err(e) => {
                tracing::error!("Result aggregator failed: {}", e);
                return report;
            }
        };

        while let Ok(result) = rx.try_recv() {
            tracing::warn!(
                namespace = %result.task.victim.namespace,
                pod = %result.task.victim.name,
                "Chaos for {} completed after the schedule deadline",
                result.task.victim
            );
            log_outcome(&result);
            report.results.push(result);
        }

        report.deadline_exceeded = report.past_deadline > 0;
        if report.deadline_exceeded {
            tracing::error!(
                "Schedule has been terminated: deadline exceeded with {} chaos not executed",
                report.past_deadline
            );
        }

        report
    }

    /// Run one full cycle: [`next_until`](Self::next_until) then
    /// [`execute_until`](Self::execute_until).
    pub async fn tick<R>(
        &self,
        rng: &mut R,
        shutdown: &CancellationToken,
    ) -> Result<CycleReport>
    where
        R: Rng + Send,
    {
        let schedule = self.next_until(rng, shutdown).await?;
        Ok(self.execute_until(&schedule, shutdown).await)
    }
}

/// Drain results until all expected ones arrived, every sender is gone, or
/// the cycle is cancelled. Hands the receiver back so late results can be
/// collected.
async fn aggregate(
    mut rx: mpsc::Receiver<TaskResult>,
    expected: usize,
    cancel: CancellationToken,
) -> (Vec<TaskResult>, mpsc::Receiver<TaskResult>) {
    let mut results = Vec::with_capacity(expected);

    while results.len() < expected {
        tokio::select! {
            biased;
            received = rx.recv() => match received {
                Some(result) => {
                    log_outcome(&result);
                    results.push(result);
                    tracing::info!(
                        remaining = expected - results.len(),
                        "Status Update: {} scheduled chaos left",
                        expected - results.len()
                    );
                }
                None => break,
            },
            _ = cancel.cancelled() => {
                tracing::debug!("Result aggregator stopping on cancellation");
                break;
            }
        }
    }

    (results, rx)
}

fn log_outcome(result: &TaskResult) {
    let victim = &result.task.victim;
    match &result.outcome {
        Outcome::Success => tracing::info!(
            namespace = %victim.namespace,
            pod = %victim.name,
            "Chaos successfully executed for {}",
            victim
        ),
        Outcome::Failure(reason) => tracing::error!(
            namespace = %victim.namespace,
            pod = %victim.name,
            "Failed to execute chaos for {}. Error: {}",
            victim,
            reason
        ),
    }
}
