//! Deterministic per-faction scheduler
//!
//! Delayed work is stored as data and drained by the owning faction each
//! tick. Tasks due on the same tick run in the order they were scheduled.

use std::collections::BTreeMap;

use crate::core::types::{FleetId, Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Re-order the blocked ships of a moving fleet
    RetryBlockedShips(FleetId),
    /// Hand a fleet's order-time arrival to its owner
    ReportArrival(FleetId),
}

impl ScheduledTask {
    fn fleet(&self) -> FleetId {
        match self {
            ScheduledTask::RetryBlockedShips(fleet) | ScheduledTask::ReportArrival(fleet) => *fleet,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BTreeMap<Tick, Vec<ScheduledTask>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` once, `delay` ticks after `now`
    pub fn schedule_once(&mut self, task: ScheduledTask, now: Tick, delay: Tick) {
        self.queue.entry(now + delay).or_default().push(task);
    }

    /// Drop every pending task belonging to `fleet`
    pub fn cancel_all_for(&mut self, fleet: FleetId) {
        for tasks in self.queue.values_mut() {
            tasks.retain(|t| t.fleet() != fleet);
        }
        self.queue.retain(|_, tasks| !tasks.is_empty());
    }

    /// Remove and return all tasks due at or before `now`
    pub fn take_due(&mut self, now: Tick) -> Vec<ScheduledTask> {
        let later = self.queue.split_off(&(now + 1));
        let due = std::mem::replace(&mut self.queue, later);
        due.into_values().flatten().collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_fires_after_delay() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(ScheduledTask::RetryBlockedShips(FleetId(1)), 10, 16);

        assert!(scheduler.take_due(25).is_empty());
        assert_eq!(
            scheduler.take_due(26),
            vec![ScheduledTask::RetryBlockedShips(FleetId(1))]
        );
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_due_tasks_keep_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(ScheduledTask::RetryBlockedShips(FleetId(2)), 0, 5);
        scheduler.schedule_once(ScheduledTask::RetryBlockedShips(FleetId(1)), 0, 3);
        scheduler.schedule_once(ScheduledTask::RetryBlockedShips(FleetId(3)), 0, 5);

        let due = scheduler.take_due(10);
        assert_eq!(
            due,
            vec![
                ScheduledTask::RetryBlockedShips(FleetId(1)),
                ScheduledTask::RetryBlockedShips(FleetId(2)),
                ScheduledTask::RetryBlockedShips(FleetId(3)),
            ]
        );
    }

    #[test]
    fn test_cancel_all_for_fleet() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(ScheduledTask::RetryBlockedShips(FleetId(1)), 0, 5);
        scheduler.schedule_once(ScheduledTask::RetryBlockedShips(FleetId(2)), 0, 5);
        scheduler.cancel_all_for(FleetId(1));

        assert_eq!(scheduler.pending(), 1);
        assert_eq!(
            scheduler.take_due(5),
            vec![ScheduledTask::RetryBlockedShips(FleetId(2))]
        );
    }
}
