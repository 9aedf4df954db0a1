//! # Shared State Store
//!
//! The only mutable state shared between tasks and interrupt handlers.
//! Nothing here is exposed as a raw field: callers go through accessors
//! that either take the [`Mutex`] (for multi-field or read-modify-write
//! updates) or touch a single atomic word (for values the tone timer reads
//! while any task may be mid-instruction).
//!
//! | Value | Writer | Readers | Access |
//! |-------|--------|---------|--------|
//! | capacity limit | increment ISR, setup phase (reset) | setup phase | mutex |
//! | start gate | advance ISR | both button ISRs | mutex |
//! | advance marker | advance ISR (set), setup phase (take) | setup phase | mutex |
//! | phase-over flag | counting phase | tone timer | mutex write, atomic read |
//! | tone | alarm phase | tone timer | atomic |
//! | tone level | tone timer | tone timer, tests | atomic |
//! | alarm latch | counting phase, alarm phase | alarm phase | atomic |
//!
//! Only the capacity limit is ever reset, at the start of the setup phase.
//! The rest keep their values for the life of the process.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::config::CAPACITY_MODULUS;
use crate::sync::Mutex;
use crate::tone::Tone;

/// Admission bookkeeping guarded by the mutex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Admission {
    /// Operator-chosen limit, 0 to `CAPACITY_MODULUS - 1`.
    pub limit: u8,
    /// True until the operator confirms the limit. Both buttons are inert
    /// once it is false.
    pub start_gate: bool,
    /// One-shot marker set by the advance button.
    pub advance_requested: bool,
}

impl Admission {
    pub const INITIAL: Admission = Admission {
        limit: 0,
        start_gate: true,
        advance_requested: false,
    };
}

/// What the setup phase sees when it checks on the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdmissionPoll {
    /// Still choosing; the limit shown so far.
    Adjusting(u8),
    /// Confirmed; the final limit, captured in the same critical section
    /// that consumed the advance marker.
    Confirmed(u8),
}

/// Lifecycle of the alarm hand-off.
///
/// ```text
///  NotStarted ──finish_counting()──► Active ──latch_alarm()──► Latched
/// ```
///
/// There is no transition out of `Latched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AlarmLatch {
    /// Counting has not finished.
    NotStarted = 0,
    /// Counting finished and the alarm bit is posted.
    Active = 1,
    /// The alarm phase has taken over for good.
    Latched = 2,
}

impl AlarmLatch {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => AlarmLatch::NotStarted,
            1 => AlarmLatch::Active,
            _ => AlarmLatch::Latched,
        }
    }
}

pub struct SharedState {
    admission: Mutex<Admission>,
    phase_over: AtomicBool,
    tone: AtomicU8,
    tone_level: AtomicBool,
    alarm_latch: AtomicU8,
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            admission: Mutex::new(Admission::INITIAL),
            phase_over: AtomicBool::new(false),
            tone: AtomicU8::new(Tone::SILENT_RAW),
            tone_level: AtomicBool::new(false),
            alarm_latch: AtomicU8::new(AlarmLatch::NotStarted as u8),
        }
    }

    // -----------------------------------------------------------------------
    // Admission (mutex)
    // -----------------------------------------------------------------------

    /// Bump the limit modulo `CAPACITY_MODULUS`. Returns the new limit, or
    /// `None` if the start gate is already closed.
    pub fn increment_capacity(&self) -> Option<u8> {
        self.admission.lock(|a| {
            if !a.start_gate {
                return None;
            }
            a.limit = (a.limit + 1) % CAPACITY_MODULUS;
            Some(a.limit)
        })
    }

    /// Set the advance marker and close the start gate. Returns `false`
    /// if the gate was already closed.
    pub fn request_advance(&self) -> bool {
        self.admission.lock(|a| {
            if !a.start_gate {
                return false;
            }
            a.advance_requested = true;
            a.start_gate = false;
            true
        })
    }

    pub fn reset_capacity(&self) {
        self.admission.lock(|a| a.limit = 0);
    }

    /// Read the limit and the advance marker together, consuming the
    /// marker if it is set.
    pub fn poll_admission(&self) -> AdmissionPoll {
        self.admission.lock(|a| {
            if a.advance_requested {
                a.advance_requested = false;
                AdmissionPoll::Confirmed(a.limit)
            } else {
                AdmissionPoll::Adjusting(a.limit)
            }
        })
    }

    pub fn capacity(&self) -> u8 {
        self.admission.lock(|a| a.limit)
    }

    pub fn start_gate_open(&self) -> bool {
        self.admission.lock(|a| a.start_gate)
    }

    pub fn admission(&self) -> Admission {
        self.admission.get()
    }

    // -----------------------------------------------------------------------
    // Phase-over flag and alarm latch
    // -----------------------------------------------------------------------

    /// Mark counting as complete: raises the phase-over flag under the
    /// mutex and arms the alarm latch. Both are one-way.
    pub fn finish_counting(&self) {
        self.admission.lock(|_| {
            self.phase_over.store(true, Ordering::Release);
        });
        let _ = self.alarm_latch.compare_exchange(
            AlarmLatch::NotStarted as u8,
            AlarmLatch::Active as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    #[inline]
    pub fn phase_over(&self) -> bool {
        self.phase_over.load(Ordering::Acquire)
    }

    /// Move an armed latch to `Latched`. Returns the latch state after the
    /// call; a latch that was never armed stays `NotStarted`.
    pub fn latch_alarm(&self) -> AlarmLatch {
        match self.alarm_latch.compare_exchange(
            AlarmLatch::Active as u8,
            AlarmLatch::Latched as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => AlarmLatch::Latched,
            Err(current) => AlarmLatch::from_raw(current),
        }
    }

    pub fn alarm_latch(&self) -> AlarmLatch {
        AlarmLatch::from_raw(self.alarm_latch.load(Ordering::Acquire))
    }

    // -----------------------------------------------------------------------
    // Tone (single-word atomics only)
    // -----------------------------------------------------------------------

    #[inline]
    pub fn set_tone(&self, tone: Option<Tone>) {
        self.tone.store(Tone::encode(tone), Ordering::Release);
    }

    #[inline]
    pub fn tone(&self) -> Option<Tone> {
        Tone::from_reload(self.tone.load(Ordering::Acquire))
    }

    /// Flip the buzzer polarity and return the new level.
    #[inline]
    pub fn toggle_tone_level(&self) -> bool {
        !self.tone_level.fetch_xor(true, Ordering::AcqRel)
    }

    #[inline]
    pub fn tone_level(&self) -> bool {
        self.tone_level.load(Ordering::Acquire)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = SharedState::new();
        assert_eq!(state.admission(), Admission::INITIAL);
        assert!(!state.phase_over());
        assert_eq!(state.tone(), None);
        assert!(!state.tone_level());
        assert_eq!(state.alarm_latch(), AlarmLatch::NotStarted);
    }

    #[test]
    fn test_capacity_wraps_modulo_41() {
        let state = SharedState::new();
        for n in 1..=100u32 {
            let limit = state.increment_capacity();
            assert_eq!(limit, Some((n % 41) as u8));
        }
        assert_eq!(state.capacity(), (100 % 41) as u8);
    }

    #[test]
    fn test_advance_closes_gate_once() {
        let state = SharedState::new();
        state.increment_capacity();
        assert!(state.request_advance());
        assert!(!state.start_gate_open());
        assert!(!state.request_advance());

        assert_eq!(state.increment_capacity(), None);
        assert_eq!(state.capacity(), 1);
    }

    #[test]
    fn test_poll_admission_consumes_marker() {
        let state = SharedState::new();
        state.increment_capacity();
        state.increment_capacity();
        assert_eq!(state.poll_admission(), AdmissionPoll::Adjusting(2));

        state.request_advance();
        assert_eq!(state.poll_admission(), AdmissionPoll::Confirmed(2));
        assert_eq!(state.poll_admission(), AdmissionPoll::Adjusting(2));
    }

    #[test]
    fn test_reset_keeps_gate() {
        let state = SharedState::new();
        state.increment_capacity();
        state.reset_capacity();
        assert_eq!(state.capacity(), 0);
        assert!(state.start_gate_open());
    }

    #[test]
    fn test_alarm_latch_transitions() {
        let state = SharedState::new();
        assert_eq!(state.latch_alarm(), AlarmLatch::NotStarted);

        state.finish_counting();
        assert!(state.phase_over());
        assert_eq!(state.alarm_latch(), AlarmLatch::Active);

        assert_eq!(state.latch_alarm(), AlarmLatch::Latched);
        assert_eq!(state.latch_alarm(), AlarmLatch::Latched);

        // Finishing again does not un-latch.
        state.finish_counting();
        assert_eq!(state.alarm_latch(), AlarmLatch::Latched);
    }

    #[test]
    fn test_tone_level_toggles() {
        let state = SharedState::new();
        assert!(state.toggle_tone_level());
        assert!(!state.toggle_tone_level());
        assert!(state.toggle_tone_level());
        assert!(state.tone_level());
    }
}
