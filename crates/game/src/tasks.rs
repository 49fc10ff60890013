//! Timer registry for every deferred or recurring callback in a session.
//!
//! Stage advances, countdown ticks, sirens, hazard generators and collapse
//! delays are all entries here. The phase controller tears the whole
//! registry down with [`TaskRegistry::cancel_all`] on every level exit and on
//! terminal states, so no timer can outlive the phase that started it.

use std::time::Duration;

use crate::hazards::HazardKind;
use crate::levels::HazardRain;

/// Shortest period a recurring task may have.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Work the simulation performs when a timer fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Task {
    /// One second of the exploration countdown.
    Countdown,
    /// Move to the next stage of the active level.
    AdvanceStage,
    CompleteLevel,
    /// Pause after a level is over; arms the next exploration.
    NextLevel,
    Siren,
    /// Safety/health resolution step.
    ResolverTick,
    /// Recurring hazard generator.
    SpawnHazards(HazardRain),
    /// Single delayed hazard (burst follow-up).
    SpawnHazard(HazardKind),
    /// Start cracking the structure at this index.
    Crack(usize),
}

#[derive(Debug)]
struct Scheduled {
    id: TaskId,
    task: Task,
    remaining: Duration,
    period: Option<Duration>,
}

/// Ordered collection of pending timers driven by simulation time.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Vec<Scheduled>,
    next_id: u64,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, task: Task, remaining: Duration, period: Option<Duration>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Scheduled {
            id,
            task,
            remaining,
            period,
        });
        id
    }

    /// Fire `task` once after `delay`.
    pub fn schedule_once(&mut self, task: Task, delay: Duration) -> TaskId {
        self.insert(task, delay, None)
    }

    /// Fire `task` every `period`, first after one full period.
    pub fn schedule_every(&mut self, task: Task, period: Duration) -> TaskId {
        let period = period.max(MIN_PERIOD);
        self.insert(task, period, Some(period))
    }

    /// Cancel one task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Cancel every task matching `pred`; returns how many were dropped.
    pub fn cancel_where(&mut self, pred: impl Fn(&Task) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !pred(&t.task));
        before - self.tasks.len()
    }

    /// Drop every pending task. Idempotent.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Whether any pending task matches `pred`.
    pub fn any(&self, pred: impl Fn(&Task) -> bool) -> bool {
        self.tasks.iter().any(|t| pred(&t.task))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Pop the earliest task due within `budget`.
    ///
    /// Time up to that task's deadline is consumed from every pending task
    /// and returned alongside it, so the caller can subtract it from the
    /// budget and ask again. Ties fire in scheduling order. Returns `None`
    /// when nothing is due; the caller then calls [`Self::elapse`] with the
    /// remaining budget.
    pub fn next_due(&mut self, budget: Duration) -> Option<(Duration, Task)> {
        let idx = self
            .tasks
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| (t.remaining, t.id))
            .map(|(i, _)| i)?;

        let step = self.tasks[idx].remaining;
        if step > budget {
            return None;
        }

        self.elapse(step);
        let task = self.tasks[idx].task;
        match self.tasks[idx].period {
            Some(period) => self.tasks[idx].remaining = period,
            None => {
                self.tasks.remove(idx);
            }
        }
        Some((step, task))
    }

    /// Let `dt` pass without firing anything.
    pub fn elapse(&mut self, dt: Duration) {
        for t in &mut self.tasks {
            t.remaining = t.remaining.saturating_sub(dt);
        }
    }
}

/// Milliseconds helper for config values.
pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(reg: &mut TaskRegistry, dt: Duration) -> Vec<Task> {
        let mut budget = dt;
        let mut fired = Vec::new();
        while let Some((step, task)) = reg.next_due(budget) {
            budget -= step;
            fired.push(task);
        }
        reg.elapse(budget);
        fired
    }

    #[test]
    fn once_fires_exactly_once() {
        let mut reg = TaskRegistry::new();
        reg.schedule_once(Task::CompleteLevel, ms(500));
        assert!(drain(&mut reg, ms(499)).is_empty());
        assert_eq!(drain(&mut reg, ms(1)), vec![Task::CompleteLevel]);
        assert!(drain(&mut reg, ms(10_000)).is_empty());
        assert!(reg.is_empty());
    }

    #[test]
    fn recurring_fires_per_period_even_in_large_steps() {
        let mut reg = TaskRegistry::new();
        reg.schedule_every(Task::Siren, ms(300));
        let fired = drain(&mut reg, ms(1000));
        assert_eq!(fired.len(), 3);
        // 100 ms left over from the first step, 200 more reaches the fourth.
        assert_eq!(drain(&mut reg, ms(200)).len(), 1);
    }

    #[test]
    fn fires_in_deadline_then_schedule_order() {
        let mut reg = TaskRegistry::new();
        reg.schedule_once(Task::NextLevel, ms(200));
        reg.schedule_once(Task::Crack(1), ms(100));
        reg.schedule_once(Task::Crack(2), ms(100));
        assert_eq!(
            drain(&mut reg, ms(500)),
            vec![Task::Crack(1), Task::Crack(2), Task::NextLevel]
        );
    }

    #[test]
    fn cancel_all_stops_everything() {
        let mut reg = TaskRegistry::new();
        let siren = reg.schedule_every(Task::Siren, ms(100));
        reg.schedule_every(Task::ResolverTick, ms(1000));
        assert!(reg.is_scheduled(siren));
        assert_eq!(reg.cancel_all(), 2);
        assert!(!reg.is_scheduled(siren));
        assert!(drain(&mut reg, ms(5000)).is_empty());
        assert_eq!(reg.cancel_all(), 0);
    }

    #[test]
    fn cancel_single_and_predicate() {
        let mut reg = TaskRegistry::new();
        let a = reg.schedule_every(Task::Siren, ms(100));
        reg.schedule_once(Task::Crack(0), ms(50));
        reg.schedule_once(Task::Crack(3), ms(60));
        assert!(reg.cancel(a));
        assert!(!reg.cancel(a));
        assert_eq!(reg.cancel_where(|t| matches!(t, Task::Crack(_))), 2);
        assert!(reg.is_empty());
    }

    #[test]
    fn zero_period_is_clamped() {
        let mut reg = TaskRegistry::new();
        reg.schedule_every(Task::Countdown, Duration::ZERO);
        assert_eq!(drain(&mut reg, ms(5)).len(), 5);
    }
}
