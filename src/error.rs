//! Kernel error type.
//!
//! The phase protocol itself has no recoverable errors: every wait is
//! assumed to eventually succeed. Only kernel setup and the run loop can
//! report a failure.

use thiserror::Error;

/// Errors reported by the kernel API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KernelError {
    /// `MAX_TASKS` tasks are already registered.
    #[error("task table is full")]
    TaskTableFull,
    /// The scheduler was started without any task.
    #[error("no tasks registered")]
    NoTasks,
    /// The task id does not name a registered task.
    #[error("unknown task id {0}")]
    UnknownTask(usize),
}
