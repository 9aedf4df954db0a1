//! # Synchronization Primitives
//!
//! Interrupt-safe critical section abstractions shared by the tasks and the
//! interrupt handlers. On the Cortex-M4 a critical section masks interrupts
//! (provided by `cortex-m`'s single-core implementation); under host tests
//! the `critical-section` crate's `std` implementation takes a global lock.
//!
//! The [`Mutex`] here is not a scheduler-aware lock: holding it masks
//! interrupts, so it must only wrap short read-modify-write sequences.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

pub use ::critical_section::CriticalSection;

/// Execute a closure within a critical section (interrupts disabled).
///
/// # Usage
/// ```ignore
/// sync::critical_section(|_cs| {
///     // Access shared state safely
/// });
/// ```
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(CriticalSection<'_>) -> R,
{
    ::critical_section::with(f)
}

/// Binary mutual-exclusion cell.
///
/// Acquire and release are the entry and exit of [`Mutex::lock`]; every
/// read-then-write of the guarded value happens inside one closure, so an
/// interrupt handler can never observe a half-finished update.
pub struct Mutex<T> {
    inner: ::critical_section::Mutex<RefCell<T>>,
}

impl<T> Mutex<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: ::critical_section::Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with exclusive access to the guarded value.
    ///
    /// # Panics
    /// The mutex is not reentrant: calling `lock` on the same mutex from
    /// inside `f` panics.
    #[inline]
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section(|cs| {
            let mut guard = self.inner.borrow(cs).borrow_mut();
            f(&mut guard)
        })
    }
}

impl<T: Copy> Mutex<T> {
    /// Copy the guarded value out.
    #[inline]
    pub fn get(&self) -> T {
        self.lock(|value| *value)
    }
}

/// Per-task cancellation flag.
///
/// Waits in this kernel have no timeout. Cancelling a task's token is the
/// only way to stop a task that is blocked forever; the scheduler then
/// retires it as `Terminated`.
pub struct CancelToken {
    cancelled: AtomicBool,
}

impl CancelToken {
    pub const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
