//! # Single-Slot Mailbox
//!
//! Overwrite-on-send, take-on-receive message slot. A sender never blocks:
//! posting into a full slot replaces the unconsumed value (last writer
//! wins). A receiving task polls [`Mailbox::try_pend`] and reports itself
//! blocked until a value arrives.

use core::cell::Cell;

use crate::sync::critical_section;

pub struct Mailbox<T: Copy> {
    slot: ::critical_section::Mutex<Cell<Option<T>>>,
}

impl<T: Copy> Mailbox<T> {
    pub const fn new() -> Self {
        Self {
            slot: ::critical_section::Mutex::new(Cell::new(None)),
        }
    }

    /// Store `value`, returning whatever unconsumed value it replaced.
    pub fn post(&self, value: T) -> Option<T> {
        let displaced = critical_section(|cs| self.slot.borrow(cs).replace(Some(value)));
        if displaced.is_some() {
            warn!("mailbox overwrote an unconsumed message");
        }
        displaced
    }

    /// Take the value if one is waiting, leaving the slot empty.
    pub fn try_pend(&self) -> Option<T> {
        critical_section(|cs| self.slot.borrow(cs).take())
    }

    pub fn is_full(&self) -> bool {
        critical_section(|cs| self.slot.borrow(cs).get().is_some())
    }
}

impl<T: Copy> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
