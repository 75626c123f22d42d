//! Session-scoped scheduler for the simulation's timers
//!
//! Every timer is a named task. There is at most one task per
//! [`TaskKind`]: scheduling a kind again replaces the previous timer, so
//! duplicates cannot coexist. Time is simulated and only moves through
//! [`SimulationClock::pop_due`] and [`SimulationClock::advance_to`].

use log::debug;
use std::collections::HashMap;

/// Named timers driven by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    /// One-shot end of the current light phase
    LightPhase,
    /// Repeating red-light countdown second
    RedCountdown,
    VehicleSpawn,
    VehicleAdvance,
    CollisionCheck,
    /// Drains the queued input commands
    InputPoll,
    /// Applies resolved difficulty predictions
    DifficultyPoll,
    /// One-shot clear of the warning message
    WarningExpiry,
    /// One-shot move of the player back to the start row
    PlayerReset,
    /// One-shot unlock after the player is back
    ReturnComplete,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTask {
    due_ms: u64,
    period_ms: Option<u64>,
    /// Breaks ties between tasks due at the same time in arming order
    seq: u64,
}

/// A task captured by [`SimulationClock::suspend`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuspendedTask {
    pub kind: TaskKind,
    pub remaining_ms: u64,
    pub period_ms: Option<u64>,
}

#[derive(Debug, Default)]
pub struct SimulationClock {
    now_ms: u64,
    tasks: HashMap<TaskKind, ScheduledTask>,
    suspended: Option<Vec<SuspendedTask>>,
    next_seq: u64,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.is_some()
    }

    /// True when no timer is armed or suspended
    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty() && self.suspended.as_ref().map_or(true, |s| s.is_empty())
    }

    pub fn is_scheduled(&self, kind: TaskKind) -> bool {
        self.tasks.contains_key(&kind)
    }

    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Milliseconds until `kind` fires, if armed
    pub fn remaining_ms(&self, kind: TaskKind) -> Option<u64> {
        self.tasks
            .get(&kind)
            .map(|task| task.due_ms.saturating_sub(self.now_ms))
    }

    fn arm(&mut self, kind: TaskKind, delay_ms: u64, period_ms: Option<u64>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.insert(
            kind,
            ScheduledTask {
                due_ms: self.now_ms + delay_ms,
                period_ms,
                seq,
            },
        );
    }

    /// Arm a one-shot timer, replacing any timer of the same kind
    pub fn schedule_once(&mut self, kind: TaskKind, delay_ms: u64) {
        self.arm(kind, delay_ms, None);
    }

    /// Arm a repeating timer that first fires one period from now
    pub fn schedule_repeating(&mut self, kind: TaskKind, period_ms: u64) {
        let period_ms = period_ms.max(1);
        self.arm(kind, period_ms, Some(period_ms));
    }

    pub fn cancel(&mut self, kind: TaskKind) -> bool {
        self.tasks.remove(&kind).is_some()
    }

    /// Drop every armed and suspended timer
    pub fn cancel_all(&mut self) {
        let dropped = self.tasks.len() + self.suspended.as_ref().map_or(0, Vec::len);
        self.tasks.clear();
        self.suspended = None;
        debug!("Cancelled {} timers", dropped);
    }

    /// Cancel every timer but remember how long each had left
    pub fn suspend(&mut self) {
        if self.suspended.is_some() {
            return;
        }
        let now = self.now_ms;
        let mut saved: Vec<(u64, SuspendedTask)> = self
            .tasks
            .drain()
            .map(|(kind, task)| {
                (
                    task.seq,
                    SuspendedTask {
                        kind,
                        remaining_ms: task.due_ms.saturating_sub(now),
                        period_ms: task.period_ms,
                    },
                )
            })
            .collect();
        saved.sort_by_key(|(seq, _)| *seq);
        self.suspended = Some(saved.into_iter().map(|(_, task)| task).collect());
    }

    /// Re-arm exactly the timers captured by [`Self::suspend`]
    pub fn resume(&mut self) {
        let Some(saved) = self.suspended.take() else {
            return;
        };
        for task in saved {
            self.arm(task.kind, task.remaining_ms, task.period_ms);
        }
    }

    /// Tasks captured by the current suspension
    pub fn suspended_tasks(&self) -> &[SuspendedTask] {
        self.suspended.as_deref().unwrap_or(&[])
    }

    /// Take the earliest task due at or before `until_ms`
    ///
    /// Moves the clock to the task's due time. Repeating tasks are re-armed
    /// before they are returned, so a handler may still cancel them.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<TaskKind> {
        if self.suspended.is_some() {
            return None;
        }
        let (kind, task) = self
            .tasks
            .iter()
            .filter(|(_, task)| task.due_ms <= until_ms)
            .min_by_key(|(_, task)| (task.due_ms, task.seq))
            .map(|(kind, task)| (*kind, *task))?;

        self.now_ms = self.now_ms.max(task.due_ms);
        match task.period_ms {
            Some(period) => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.tasks.insert(
                    kind,
                    ScheduledTask {
                        due_ms: task.due_ms + period,
                        period_ms: Some(period),
                        seq,
                    },
                );
            }
            None => {
                self.tasks.remove(&kind);
            }
        }
        Some(kind)
    }

    /// Move the clock forward; time stands still while suspended
    pub fn advance_to(&mut self, target_ms: u64) {
        if self.suspended.is_none() {
            self.now_ms = self.now_ms.max(target_ms);
        }
    }

    /// Start over at time zero with no timers
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
