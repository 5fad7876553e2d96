//! Single-task execution.
//!
//! An executor waits for its task's kill time, then makes exactly one
//! delete call. Cancellation is observed only while waiting; a delete that
//! has started runs to completion.

use crate::schedule::Task;
use monkaos_cluster::ClusterClient;
use monkaos_core::Outcome;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// The outcome of one attempted termination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskResult {
    /// The task that ran.
    pub task: Task,
    /// What the delete call returned.
    pub outcome: Outcome,
}

/// Why an executor exited without attempting its termination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Abandoned {
    /// The kill time falls at or after the cycle deadline.
    PastDeadline,
    /// The cycle was cancelled while waiting.
    Cancelled,
}

/// Runs scheduled terminations against a cluster.
#[derive(Debug)]
pub struct TaskExecutor<C> {
    cluster: Arc<C>,
    grace_period_secs: u32,
}

impl<C> Clone for TaskExecutor<C> {
    fn clone(&self) -> Self {
        Self {
            cluster: Arc::clone(&self.cluster),
            grace_period_secs: self.grace_period_secs,
        }
    }
}

impl<C: ClusterClient> TaskExecutor<C> {
    /// Create an executor deleting with the given grace period.
    pub fn new(cluster: Arc<C>, grace_period_secs: u32) -> Self {
        Self {
            cluster,
            grace_period_secs,
        }
    }

    /// Wait for `task.kill_at`, then terminate the victim.
    ///
    /// Returns `Err(Abandoned)` without touching the cluster if the kill
    /// time is not before `deadline` or `cancel` fires first.
    pub async fn run(
        &self,
        task: &Task,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<TaskResult, Abandoned> {
        if task.kill_at >= deadline {
            return Err(Abandoned::PastDeadline);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Abandoned::Cancelled),
            _ = tokio::time::sleep_until(task.kill_at) => {}
        }

        let victim = &task.victim;
        let outcome = match self
            .cluster
            .delete_pod(&victim.namespace, &victim.name, self.grace_period_secs)
            .await
        {
            Ok(()) => Outcome::Success,
            Err(e) => Outcome::Failure(e.to_string()),
        };

        Ok(TaskResult {
            task: task.clone(),
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monkaos_cluster::MockCluster;
    use monkaos_core::Victim;
    use std::time::Duration;

    fn task(offset_secs: u64, start: Instant) -> Task {
        let offset = Duration::from_secs(offset_secs);
        Task {
            victim: Victim::new("default", "web-0"),
            offset,
            kill_at: start + offset,
        }
    }

    fn cluster_with_victim() -> MockCluster {
        let cluster = MockCluster::new();
        cluster.add_pod("default", "web-0");
        cluster
    }

    #[tokio::test(start_paused = true)]
    async fn waits_until_kill_time_then_deletes() {
        let cluster = cluster_with_victim();
        let executor = TaskExecutor::new(Arc::new(cluster.clone()), 30);
        let start = Instant::now();

        let result = executor
            .run(&task(4, start), start + Duration::from_secs(10), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.outcome, Outcome::Success);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
        let deleted = cluster.deleted();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].grace_period_secs, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_failure_becomes_failure_outcome() {
        let cluster = cluster_with_victim();
        cluster.fail_next_delete("forbidden");
        let executor = TaskExecutor::new(Arc::new(cluster.clone()), 0);
        let start = Instant::now();

        let result = executor
            .run(&task(0, start), start + Duration::from_secs(1), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            result.outcome,
            Outcome::Failure("cluster api error: forbidden".into())
        );
        assert_eq!(cluster.delete_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn kill_time_at_deadline_is_abandoned() {
        let cluster = cluster_with_victim();
        let executor = TaskExecutor::new(Arc::new(cluster.clone()), 0);
        let start = Instant::now();

        let abandoned = executor
            .run(&task(3, start), start + Duration::from_secs(3), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(abandoned, Abandoned::PastDeadline);
        assert_eq!(cluster.delete_attempts(), 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_while_waiting_skips_delete() {
        let cluster = cluster_with_victim();
        let executor = TaskExecutor::new(Arc::new(cluster.clone()), 0);
        let start = Instant::now();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });

        let abandoned = executor
            .run(&task(5, start), start + Duration::from_secs(10), &cancel)
            .await
            .unwrap_err();

        assert_eq!(abandoned, Abandoned::Cancelled);
        assert_eq!(cluster.delete_attempts(), 0);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_token_wins() {
        let cluster = cluster_with_victim();
        let executor = TaskExecutor::new(Arc::new(cluster.clone()), 0);
        let start = Instant::now();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let abandoned = executor
            .run(&task(0, start), start + Duration::from_secs(1), &cancel)
            .await
            .unwrap_err();

        assert_eq!(abandoned, Abandoned::Cancelled);
        assert_eq!(cluster.delete_attempts(), 0);
    }
}
