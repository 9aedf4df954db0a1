//! # Monotonic Tick Clock
//!
//! A free-running 32-bit tick counter advanced by the SysTick handler.
//! Every task-level delay (sensor polling, button lockout) is expressed as
//! a deadline on this clock instead of a busy-wait.
//!
//! The counter wraps after 2^32 ticks (about 49 days at 1 kHz).
//! Comparisons use wrapping arithmetic, so a deadline is valid for up to
//! half of that range.

use core::sync::atomic::{AtomicU32, Ordering};

/// A point on the tick clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instant(u32);

impl Instant {
    /// The clock value at reset.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw tick count.
    pub const fn from_ticks(ticks: u32) -> Self {
        Self(ticks)
    }

    /// Raw tick count.
    pub const fn ticks(self) -> u32 {
        self.0
    }

    /// The instant `ticks` after `self`.
    pub const fn after(self, ticks: u32) -> Self {
        Self(self.0.wrapping_add(ticks))
    }

    /// Whether `self` is at or past `deadline`.
    pub const fn has_reached(self, deadline: Instant) -> bool {
        self.0.wrapping_sub(deadline.0) < (1 << 31)
    }

    /// Ticks elapsed from `earlier` to `self`.
    pub const fn since(self, earlier: Instant) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }
}

/// The system tick counter. Lives in a `static` so the SysTick handler
/// can advance it while tasks read it.
pub struct Monotonic {
    ticks: AtomicU32,
}

impl Monotonic {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
        }
    }

    /// Advance the clock by one tick. Called from the SysTick handler.
    #[inline]
    pub fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Release);
    }

    /// Advance the clock by `n` ticks.
    pub fn advance(&self, n: u32) {
        self.ticks.fetch_add(n, Ordering::Release);
    }

    #[inline]
    pub fn now(&self) -> Instant {
        Instant(self.ticks.load(Ordering::Acquire))
    }
}

impl Default for Monotonic {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_reached() {
        let start = Instant::from_ticks(100);
        let deadline = start.after(200);
        assert!(!start.has_reached(deadline));
        assert!(!Instant::from_ticks(299).has_reached(deadline));
        assert!(Instant::from_ticks(300).has_reached(deadline));
        assert!(Instant::from_ticks(5000).has_reached(deadline));
    }

    #[test]
    fn test_deadline_across_wrap() {
        let start = Instant::from_ticks(u32::MAX - 10);
        let deadline = start.after(20);
        assert_eq!(deadline.ticks(), 9);
        assert!(!start.has_reached(deadline));
        assert!(Instant::from_ticks(9).has_reached(deadline));
        assert_eq!(Instant::from_ticks(9).since(start), 20);
    }

    #[test]
    fn test_clock_advances() {
        let clock = Monotonic::new();
        assert_eq!(clock.now(), Instant::ZERO);
        clock.tick();
        clock.advance(9);
        assert_eq!(clock.now().ticks(), 10);
    }
}
