//! # Phase Tasks
//!
//! The three tasks that make up one admission cycle:
//!
//! ```text
//!   SETUP bit (initial)
//!        │
//!        ▼
//!   ┌──────────┐  mailbox: limit   ┌──────────┐   ALARM bit    ┌──────────┐
//!   │  Setup   │ ────────────────► │ Counting │ ─────────────► │  Alarm   │
//!   │  prio 3  │  COUNTING bit     │  prio 2  │  phase-over    │  prio 1  │
//!   └──────────┘                   └──────────┘                └──────────┘
//! ```
//!
//! Each phase blocks until its bit (and, for counting, the mailbox) is
//! ready, does its work, then hands off to the next. Nothing re-posts
//! `SETUP`, so the pipeline runs once per power cycle.

mod alarm;
mod counting;
mod setup;

pub use alarm::{AlarmPhase, AlarmState};
pub use counting::{CountingPhase, CountingState};
pub use setup::{SetupPhase, SetupState};

use crate::config::{ALARM_PRIORITY, COUNTING_PRIORITY, SETUP_PRIORITY};
use crate::error::KernelError;
use crate::flags::{EventFlags, PhaseFlags};
use crate::kernel::Kernel;
use crate::mailbox::Mailbox;
use crate::peripheral::Board;
use crate::state::SharedState;
use crate::task::TaskConfig;

/// Everything the phases and interrupt handlers share.
pub struct Fabric {
    pub flags: EventFlags,
    /// Carries the confirmed admission limit from setup to counting.
    pub mailbox: Mailbox<u8>,
    pub state: SharedState,
}

impl Fabric {
    /// A fresh fabric with the setup phase armed.
    pub const fn new() -> Self {
        Self {
            flags: EventFlags::new(PhaseFlags::SETUP),
            mailbox: Mailbox::new(),
            state: SharedState::new(),
        }
    }
}

impl Default for Fabric {
    fn default() -> Self {
        Self::new()
    }
}

/// The three phase tasks over one [`Fabric`].
pub struct Pipeline<'a> {
    pub setup: SetupPhase<'a>,
    pub counting: CountingPhase<'a>,
    pub alarm: AlarmPhase<'a>,
}

impl<'a> Pipeline<'a> {
    pub const fn new(fabric: &'a Fabric) -> Self {
        Self {
            setup: SetupPhase::new(fabric),
            counting: CountingPhase::new(fabric),
            alarm: AlarmPhase::new(fabric),
        }
    }

    /// Register all three phases with `kernel` at their fixed priorities.
    /// Returns the task ids in setup, counting, alarm order.
    pub fn spawn<P: Board>(&'a mut self, kernel: &mut Kernel<'a, P>) -> Result<[usize; 3], KernelError> {
        let Pipeline { setup, counting, alarm } = self;
        let setup = kernel.create_task(setup, TaskConfig { priority: SETUP_PRIORITY })?;
        let counting = kernel.create_task(counting, TaskConfig { priority: COUNTING_PRIORITY })?;
        let alarm = kernel.create_task(alarm, TaskConfig { priority: ALARM_PRIORITY })?;
        Ok([setup, counting, alarm])
    }
}
