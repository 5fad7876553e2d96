//! Schedules: the timed termination tasks of one cycle.

use monkaos_core::{LatencyPolicy, Victim};
use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

/// One scheduled termination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    /// Pod to terminate.
    pub victim: Victim,
    /// Delay after cycle start.
    pub offset: Duration,
    /// When the termination fires.
    pub kill_at: Instant,
}

/// Ordered tasks for one cycle.
///
/// Order follows victim discovery and carries no meaning for execution.
#[derive(Clone, Debug)]
pub struct Schedule {
    started_at: Instant,
    tasks: Vec<Task>,
}

impl Schedule {
    /// Create an empty schedule anchored at `started_at`.
    pub fn new(started_at: Instant) -> Self {
        Self {
            started_at,
            tasks: Vec::new(),
        }
    }

    /// Append a task.
    pub fn add(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Cycle start; every `kill_at` and the cycle deadline count from here.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Tasks in discovery order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True if the schedule has no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Turns victims into a [`Schedule`].
#[derive(Clone, Copy, Debug)]
pub struct ScheduleBuilder {
    latency: LatencyPolicy,
}

impl ScheduleBuilder {
    /// Create a builder using the given latency policy.
    pub fn new(latency: LatencyPolicy) -> Self {
        Self { latency }
    }

    /// Build a schedule with one task per victim, all offsets drawn up front.
    pub fn build<R>(&self, victims: Vec<Victim>, started_at: Instant, rng: &mut R) -> Schedule
    where
        R: Rng + ?Sized,
    {
        let mut schedule = Schedule::new(started_at);
        for victim in victims {
            let offset = self.latency.offset(rng);
            schedule.add(Task {
                victim,
                offset,
                kill_at: started_at + offset,
            });
        }
        schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn victims() -> Vec<Victim> {
        vec![
            Victim::new("a", "web-0"),
            Victim::new("b", "worker-3"),
            Victim::new("a", "web-0"),
        ]
    }

    #[test]
    fn one_task_per_victim_in_order() {
        let builder = ScheduleBuilder::new(LatencyPolicy::fixed(Duration::from_secs(5)));
        let mut rng = StdRng::seed_from_u64(1);
        let schedule = builder.build(victims(), Instant::now(), &mut rng);

        assert_eq!(schedule.len(), 3);
        let names: Vec<_> = schedule.tasks().iter().map(|t| t.victim.clone()).collect();
        assert_eq!(names, victims());
    }

    #[test]
    fn fixed_latency_uses_max_exactly() {
        let builder = ScheduleBuilder::new(LatencyPolicy::fixed(Duration::from_secs(5)));
        let mut rng = StdRng::seed_from_u64(1);
        let start = Instant::now();
        let schedule = builder.build(victims(), start, &mut rng);

        for task in schedule.tasks() {
            assert_eq!(task.offset, Duration::from_secs(5));
            assert_eq!(task.kill_at, start + Duration::from_secs(5));
        }
    }

    #[test]
    fn random_latency_is_below_max() {
        let builder = ScheduleBuilder::new(LatencyPolicy::random(Duration::from_secs(4)));
        let mut rng = StdRng::seed_from_u64(9);
        let start = Instant::now();
        let many = vec![Victim::new("a", "p"); 200];
        let schedule = builder.build(many, start, &mut rng);

        for task in schedule.tasks() {
            assert!(task.offset < Duration::from_secs(4));
            assert_eq!(task.kill_at - start, task.offset);
        }
    }

    #[test]
    fn fixed_latency_rebuild_is_deterministic() {
        let builder = ScheduleBuilder::new(LatencyPolicy::fixed(Duration::from_secs(3)));
        let start = Instant::now();
        let first = builder.build(victims(), start, &mut StdRng::seed_from_u64(1));
        let second = builder.build(victims(), start, &mut StdRng::seed_from_u64(2));

        let offsets = |s: &Schedule| s.tasks().iter().map(|t| t.offset).collect::<Vec<_>>();
        assert_eq!(offsets(&first), offsets(&second));
    }

    #[test]
    fn empty_victim_list_gives_empty_schedule() {
        let builder = ScheduleBuilder::new(LatencyPolicy::fixed(Duration::from_secs(1)));
        let schedule = builder.build(Vec::new(), Instant::now(), &mut StdRng::seed_from_u64(1));
        assert!(schedule.is_empty());
    }
}
