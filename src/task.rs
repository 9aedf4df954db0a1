//! # Task Control Block
//!
//! Defines the task model for the capmon kernel. A task is an explicit
//! state machine: instead of blocking inside an RTOS call it returns a
//! [`Step`] from [`Task::poll`] telling the scheduler whether it made
//! progress, wants to sleep, or is waiting on a flag or the mailbox.
//!
//! ## Polling contract
//!
//! - A poll that returns [`Step::Blocked`] must leave nothing half-done:
//!   the scheduler re-polls blocked tasks on every pass, exactly as an RTOS
//!   would re-check a wait list after each post.
//! - A poll never yields mid-way. Rendering loops and busy-waits inside a
//!   poll run to completion; only interrupts can intervene.

use crate::sync::CancelToken;
use crate::time::Instant;

// ---------------------------------------------------------------------------
// Task state machine
// ---------------------------------------------------------------------------

/// Execution state of a task in the scheduler's state machine.
///
/// ```text
///                 poll() = Continue
///   ┌──────────┐ ◄─────────────────── ┌─────────┐
///   │  Ready   │ ──────────────────► │ Running │
///   └──────────┘     schedule()       └─────────┘
///        ▲  ▲                          │       │
///        │  │    poll() = Blocked      │       │ poll() = Sleep(n)
///        │  │  ┌──────────┐ ◄──────────┘       ▼
///        │  └──│ Blocked  │              ┌──────────┐
///        │     └──────────┘              │ Sleeping │
///        │       re-polled each pass     └──────────┘
///        └──────────────────────────────────┘ deadline reached
///
///   any state ── cancel() ──► Terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskState {
    /// Task is ready to run.
    Ready,
    /// Task is being polled right now.
    Running,
    /// Task is waiting on a flag bit or the mailbox.
    Blocked,
    /// Task is waiting for a tick deadline.
    Sleeping,
    /// Free slot; not schedulable.
    Suspended,
    /// Task was cancelled and will not be polled again.
    Terminated,
}

/// Result of one poll of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Work was done; the task is still runnable.
    Continue,
    /// Work was done; do not poll again for this many ticks.
    Sleep(u32),
    /// The task's wait condition does not hold yet.
    Blocked,
}

// ---------------------------------------------------------------------------
// Task configuration (immutable after creation)
// ---------------------------------------------------------------------------

/// Static configuration for a task, set at creation time.
#[derive(Debug, Clone, Copy)]
pub struct TaskConfig {
    /// Base priority (higher = more important). Range: 0–255.
    /// Ties are broken by creation order.
    pub priority: u8,
}

/// What a task sees while it is polled.
pub struct Context<'c, P> {
    /// Clock value at the start of this scheduling pass.
    pub now: Instant,
    /// Peripherals lent to the task for the duration of the poll.
    pub io: &'c mut P,
}

/// A cooperatively scheduled unit of work over peripherals `P`.
pub trait Task<P> {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Advance the state machine by one step.
    fn poll(&mut self, cx: &mut Context<'_, P>) -> Step;
}

// ---------------------------------------------------------------------------
// Run metrics (updated on every poll)
// ---------------------------------------------------------------------------

/// Per-task counters, useful in tests and for spotting a stalled phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMetrics {
    /// Polls that returned `Continue` or `Sleep`.
    pub productive_polls: u32,
    /// Polls that returned `Blocked`.
    pub blocked_polls: u32,
    /// Polls that returned `Sleep`.
    pub sleeps: u32,
}

// ---------------------------------------------------------------------------
// Task Control Block
// ---------------------------------------------------------------------------

/// Task Control Block (TCB): scheduling state wrapped around a borrowed
/// [`Task`]. TCBs live in a fixed-size array in the scheduler; no heap.
pub struct TaskControlBlock<'a, P> {
    /// Task identifier (index in the scheduler's task array).
    pub id: usize,

    /// Current execution state.
    pub state: TaskState,

    /// Static configuration.
    pub config: TaskConfig,

    /// Deadline of the current sleep. Meaningful only while `Sleeping`.
    pub wake_at: Instant,

    /// Cancellation flag checked before every poll.
    pub cancel: CancelToken,

    pub metrics: RunMetrics,

    task: Option<&'a mut dyn Task<P>>,
}

impl<'a, P> TaskControlBlock<'a, P> {
    /// Create an empty (unallocated) TCB.
    pub fn empty() -> Self {
        Self {
            id: 0,
            state: TaskState::Suspended,
            config: TaskConfig { priority: 0 },
            wake_at: Instant::ZERO,
            cancel: CancelToken::new(),
            metrics: RunMetrics::default(),
            task: None,
        }
    }

    /// Bind `task` to this slot and make it Ready.
    pub fn init(&mut self, id: usize, config: TaskConfig, task: &'a mut dyn Task<P>) {
        self.id = id;
        self.state = TaskState::Ready;
        self.config = config;
        self.wake_at = Instant::ZERO;
        self.cancel = CancelToken::new();
        self.metrics = RunMetrics::default();
        self.task = Some(task);
    }

    /// Whether this slot holds a task.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    pub fn name(&self) -> &'static str {
        self.task.as_ref().map_or("-", |t| t.name())
    }

    /// Whether the scheduler may poll this task at `now`. Blocked tasks
    /// count as pollable: their poll re-checks the wait condition.
    pub fn is_pollable(&self, now: Instant) -> bool {
        match self.state {
            TaskState::Ready | TaskState::Running | TaskState::Blocked => self.is_active(),
            TaskState::Sleeping => now.has_reached(self.wake_at),
            TaskState::Suspended | TaskState::Terminated => false,
        }
    }

    /// Poll the task once and fold the result into the TCB.
    pub fn poll(&mut self, cx: &mut Context<'_, P>) -> Option<Step> {
        let task = self.task.as_mut()?;
        self.state = TaskState::Running;
        let step = task.poll(cx);
        self.record_step(step, cx.now);
        Some(step)
    }

    /// Update state and metrics after a poll that returned `step`.
    pub fn record_step(&mut self, step: Step, now: Instant) {
        match step {
            Step::Continue => {
                self.state = TaskState::Ready;
                self.metrics.productive_polls += 1;
            }
            Step::Sleep(ticks) => {
                self.state = TaskState::Sleeping;
                self.wake_at = now.after(ticks);
                self.metrics.productive_polls += 1;
                self.metrics.sleeps += 1;
            }
            Step::Blocked => {
                self.state = TaskState::Blocked;
                self.metrics.blocked_polls += 1;
            }
        }
    }

    /// Retire the task if its token was cancelled. Returns `true` if the
    /// task is (now) terminated.
    pub fn reap_if_cancelled(&mut self) -> bool {
        if self.state == TaskState::Terminated {
            return true;
        }
        if self.is_active() && self.cancel.is_cancelled() {
            self.state = TaskState::Terminated;
            info!("task {} terminated", self.name());
            return true;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        steps: [Step; 3],
        next: usize,
    }

    impl Task<()> for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn poll(&mut self, _cx: &mut Context<'_, ()>) -> Step {
            let step = self.steps[self.next % self.steps.len()];
            self.next += 1;
            step
        }
    }

    #[test]
    fn test_tcb_initialization() {
        let mut task = Scripted { steps: [Step::Continue; 3], next: 0 };
        let mut tcb = TaskControlBlock::empty();
        assert!(!tcb.is_active());
        assert_eq!(tcb.state, TaskState::Suspended);
        assert!(!tcb.is_pollable(Instant::ZERO));

        tcb.init(2, TaskConfig { priority: 5 }, &mut task);
        assert!(tcb.is_active());
        assert_eq!(tcb.id, 2);
        assert_eq!(tcb.state, TaskState::Ready);
        assert_eq!(tcb.config.priority, 5);
        assert_eq!(tcb.name(), "scripted");
    }

    #[test]
    fn test_step_bookkeeping() {
        let mut task = Scripted {
            steps: [Step::Continue, Step::Sleep(10), Step::Blocked],
            next: 0,
        };
        let mut tcb = TaskControlBlock::empty();
        tcb.init(0, TaskConfig { priority: 1 }, &mut task);
        let mut io = ();
        let now = Instant::from_ticks(100);
        let mut cx = Context { now, io: &mut io };

        assert_eq!(tcb.poll(&mut cx), Some(Step::Continue));
        assert_eq!(tcb.state, TaskState::Ready);

        assert_eq!(tcb.poll(&mut cx), Some(Step::Sleep(10)));
        assert_eq!(tcb.state, TaskState::Sleeping);
        assert_eq!(tcb.wake_at, Instant::from_ticks(110));
        assert!(!tcb.is_pollable(Instant::from_ticks(109)));
        assert!(tcb.is_pollable(Instant::from_ticks(110)));

        assert_eq!(tcb.poll(&mut cx), Some(Step::Blocked));
        assert_eq!(tcb.state, TaskState::Blocked);
        assert!(tcb.is_pollable(now));

        assert_eq!(
            tcb.metrics,
            RunMetrics { productive_polls: 2, blocked_polls: 1, sleeps: 1 }
        );
    }

    #[test]
    fn test_cancellation_terminates() {
        let mut task = Scripted { steps: [Step::Blocked; 3], next: 0 };
        let mut tcb = TaskControlBlock::empty();
        tcb.init(0, TaskConfig { priority: 1 }, &mut task);

        assert!(!tcb.reap_if_cancelled());
        tcb.cancel.cancel();
        assert!(tcb.reap_if_cancelled());
        assert_eq!(tcb.state, TaskState::Terminated);
        assert!(!tcb.is_pollable(Instant::ZERO));
    }
}
