//! # Kernel
//!
//! Public API of the capmon kernel: owns the scheduler, reads the
//! monotonic clock, and drives scheduling passes.
//!
//! ## Startup Sequence
//!
//! ```text
//! reset (cortex-m-rt)
//!   └─► main()
//!         ├─► arch::cortex_m4::configure_systick()  ← tick source
//!         ├─► board bring-up                       ← GPIO, ADC, timers, EXTI
//!         ├─► Kernel::new(&MONOTONIC)
//!         ├─► Pipeline::spawn()                    ← setup, counting, alarm
//!         └─► Kernel::run()                        ← passes until shutdown
//!               └─► idle hook (wfi) whenever a pass is Idle
//! ```
//!
//! The kernel itself is not a global: the firmware builds it on the main
//! stack. Only the clock and the [`Fabric`](crate::phases::Fabric) are
//! statics, because interrupt handlers touch them.

use crate::error::KernelError;
use crate::scheduler::{Pass, Scheduler};
use crate::sync::CancelToken;
use crate::task::{Task, TaskConfig, TaskState};
use crate::time::{Instant, Monotonic};

pub struct Kernel<'a, P> {
    scheduler: Scheduler<'a, P>,
    clock: &'a Monotonic,
}

impl<'a, P> Kernel<'a, P> {
    pub fn new(clock: &'a Monotonic) -> Self {
        Self {
            scheduler: Scheduler::new(),
            clock,
        }
    }

    /// Register a task.
    ///
    /// # Returns
    /// - `Ok(task_id)`: the task's index in the scheduler array
    /// - `Err(KernelError::TaskTableFull)`: `MAX_TASKS` reached
    pub fn create_task(
        &mut self,
        task: &'a mut dyn Task<P>,
        config: TaskConfig,
    ) -> Result<usize, KernelError> {
        self.scheduler.create_task(task, config)
    }

    /// Cancel one task. It terminates on the next pass.
    pub fn cancel_task(&self, id: usize) -> Result<(), KernelError> {
        self.scheduler.cancel(id)
    }

    /// Cancel every task.
    pub fn shutdown(&self) {
        self.scheduler.cancel_all();
    }

    pub fn task_state(&self, id: usize) -> Result<TaskState, KernelError> {
        self.scheduler.state(id)
    }

    #[inline]
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Earliest sleep deadline, if any task is sleeping.
    pub fn next_wake(&self) -> Option<Instant> {
        self.scheduler.next_wake()
    }

    pub fn scheduler(&self) -> &Scheduler<'a, P> {
        &self.scheduler
    }

    /// Run one scheduling pass at the current clock value.
    pub fn run_once(&mut self, io: &mut P) -> Result<Pass, KernelError> {
        if self.scheduler.task_count == 0 {
            return Err(KernelError::NoTasks);
        }
        Ok(self.scheduler.step(self.clock.now(), io))
    }

    /// Run passes until `shutdown` is cancelled, calling `idle` with the
    /// next sleep deadline whenever a pass finds nothing to do.
    ///
    /// On target `idle` sleeps until the next interrupt; tests use it to
    /// advance a simulated clock.
    pub fn run(
        &mut self,
        io: &mut P,
        shutdown: &CancelToken,
        mut idle: impl FnMut(Option<Instant>),
    ) -> Result<(), KernelError> {
        if self.scheduler.task_count == 0 {
            return Err(KernelError::NoTasks);
        }
        info!("kernel: running {} tasks", self.scheduler.task_count);

        while !shutdown.is_cancelled() {
            if let Pass::Idle = self.run_once(io)? {
                idle(self.next_wake());
            }
        }

        self.shutdown();
        info!("kernel: shut down after {} passes", self.scheduler.pass_count);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
