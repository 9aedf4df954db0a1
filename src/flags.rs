//! # Event-Flag Group
//!
//! A small bit set used as the rendezvous between phases. Producers OR bits
//! in with [`EventFlags::post`]; a consumer checks for all bits of a mask
//! with [`EventFlags::try_pend`] and either clears them on success
//! ([`PendMode::Consume`], re-armable) or leaves them set
//! ([`PendMode::Keep`], every later wait on the same mask succeeds at once).
//!
//! The whole group is one `AtomicU8`, so posting from an interrupt handler
//! and consuming from a task need no critical section.

use bitflags::bitflags;
use core::sync::atomic::{AtomicU8, Ordering};

bitflags! {
    /// Phase hand-off bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PhaseFlags: u8 {
        /// Setup phase may start.
        const SETUP = 0x01;
        /// Counting phase may start.
        const COUNTING = 0x02;
        /// Alarm phase may start.
        const ALARM = 0x04;
    }
}

/// What a successful wait does to the bits it waited on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PendMode {
    /// Clear the bits in the same atomic step that observed them.
    Consume,
    /// Leave the bits set.
    Keep,
}

pub struct EventFlags {
    bits: AtomicU8,
}

impl EventFlags {
    pub const fn new(initial: PhaseFlags) -> Self {
        Self {
            bits: AtomicU8::new(initial.bits()),
        }
    }

    /// Set `flags` (bitwise OR). Never blocks.
    pub fn post(&self, flags: PhaseFlags) {
        let prev = self.bits.fetch_or(flags.bits(), Ordering::AcqRel);
        trace!("flags post {} -> {}", flags.bits(), prev | flags.bits());
    }

    /// Succeed if every bit of `mask` is set.
    ///
    /// With [`PendMode::Consume`] the bits are cleared by the same
    /// compare-and-swap that saw them, so two consumers can never both
    /// succeed on one post. An empty mask always succeeds.
    pub fn try_pend(&self, mask: PhaseFlags, mode: PendMode) -> bool {
        let m = mask.bits();
        match mode {
            PendMode::Keep => self.bits.load(Ordering::Acquire) & m == m,
            PendMode::Consume => self
                .bits
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                    (cur & m == m).then_some(cur & !m)
                })
                .is_ok(),
        }
    }

    /// Snapshot of the current bits.
    pub fn current(&self) -> PhaseFlags {
        PhaseFlags::from_bits_retain(self.bits.load(Ordering::Acquire))
    }
}
