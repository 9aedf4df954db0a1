//! # Scheduler
//!
//! Cooperative, priority-ordered, run-to-block scheduling for the capmon
//! kernel.
//!
//! ## Scheduling Algorithm
//!
//! Each call to [`Scheduler::step`] is one scheduling pass:
//! 1. **Reap**: tasks whose cancel token fired become `Terminated`
//! 2. **Walk by priority**: highest priority first, ties by creation order
//! 3. **Skip** sleeping tasks whose deadline has not been reached
//! 4. **Poll** the first pollable task:
//!    a. `Blocked` → record it and move on to the next lower priority
//!    b. `Continue` / `Sleep` → the pass ends; that task ran
//! 5. **Idle** if every task was blocked, sleeping or terminated
//!
//! A lower-priority task therefore makes no progress while any
//! higher-priority task can do work, and a blocked task costs one cheap
//! re-check per pass.

use crate::config::MAX_TASKS;
use crate::error::KernelError;
use crate::task::{Context, Step, Task, TaskConfig, TaskControlBlock, TaskState};
use crate::time::Instant;

/// Outcome of one scheduling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pass {
    /// The task with this id did work.
    Ran(usize),
    /// Nothing could run.
    Idle,
}

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// The central scheduler state: all task control blocks plus the priority
/// order in which they are visited.
pub struct Scheduler<'a, P> {
    /// Fixed-size array of TCBs, indexed by task id.
    pub tasks: [TaskControlBlock<'a, P>; MAX_TASKS],

    /// Task ids sorted by descending priority. Only the first
    /// `task_count` entries are meaningful.
    order: [usize; MAX_TASKS],

    /// Number of allocated tasks.
    pub task_count: usize,

    /// Task polled most recently, if any.
    pub current_task: Option<usize>,

    /// Number of completed scheduling passes.
    pub pass_count: u64,
}

impl<'a, P> Scheduler<'a, P> {
    pub fn new() -> Self {
        Self {
            tasks: core::array::from_fn(|_| TaskControlBlock::empty()),
            order: [0; MAX_TASKS],
            task_count: 0,
            current_task: None,
            pass_count: 0,
        }
    }

    /// Register a new task with the scheduler.
    ///
    /// # Returns
    /// - `Ok(task_id)`: the index of the newly created task
    /// - `Err(KernelError::TaskTableFull)`: all `MAX_TASKS` slots are taken
    pub fn create_task(
        &mut self,
        task: &'a mut dyn Task<P>,
        config: TaskConfig,
    ) -> Result<usize, KernelError> {
        if self.task_count >= MAX_TASKS {
            return Err(KernelError::TaskTableFull);
        }

        let id = self.task_count;
        self.tasks[id].init(id, config, task);

        // Insert into the priority order after every task of equal or
        // higher priority.
        let mut pos = self.task_count;
        while pos > 0 && self.tasks[self.order[pos - 1]].config.priority < config.priority {
            self.order[pos] = self.order[pos - 1];
            pos -= 1;
        }
        self.order[pos] = id;

        self.task_count += 1;
        debug!("task {} created, priority {}", self.tasks[id].name(), config.priority);
        Ok(id)
    }

    /// Run one scheduling pass at `now`, lending `io` to the polled task.
    pub fn step(&mut self, now: Instant, io: &mut P) -> Pass {
        self.pass_count += 1;

        for slot in 0..self.task_count {
            let id = self.order[slot];
            let tcb = &mut self.tasks[id];

            if tcb.reap_if_cancelled() || !tcb.is_pollable(now) {
                continue;
            }

            self.current_task = Some(id);
            let mut cx = Context { now, io: &mut *io };
            match tcb.poll(&mut cx) {
                Some(Step::Blocked) | None => continue,
                Some(step) => {
                    trace!("pass {}: {} -> {:?}", self.pass_count, tcb.name(), step);
                    return Pass::Ran(id);
                }
            }
        }

        Pass::Idle
    }

    /// Earliest deadline among sleeping tasks, if any.
    pub fn next_wake(&self) -> Option<Instant> {
        self.tasks[..self.task_count]
            .iter()
            .filter(|t| t.state == TaskState::Sleeping)
            .map(|t| t.wake_at)
            .min_by_key(|deadline| deadline.ticks())
    }

    /// Request cancellation of `id`. The task is retired at the start of
    /// the next pass that reaches it.
    pub fn cancel(&self, id: usize) -> Result<(), KernelError> {
        self.tcb(id)?.cancel.cancel();
        Ok(())
    }

    /// Cancel every task.
    pub fn cancel_all(&self) {
        for tcb in &self.tasks[..self.task_count] {
            tcb.cancel.cancel();
        }
    }

    pub fn state(&self, id: usize) -> Result<TaskState, KernelError> {
        Ok(self.tcb(id)?.state)
    }

    /// Get a reference to a task's TCB.
    pub fn tcb(&self, id: usize) -> Result<&TaskControlBlock<'a, P>, KernelError> {
        self.tasks[..self.task_count]
            .get(id)
            .ok_or(KernelError::UnknownTask(id))
    }
}

impl<'a, P> Default for Scheduler<'a, P> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
