//! # Interrupt Handlers
//!
//! The three handlers that mutate shared state behind the tasks' backs:
//!
//! | Handler | Trigger | Effect |
//! |---------|---------|--------|
//! | [`on_increment`] | button 1 edge | limit = (limit + 1) mod 41 while the start gate is open |
//! | [`on_advance`] | button 2 edge | set advance marker, close the start gate |
//! | [`on_tone_timer`] | tone timer overflow | toggle the buzzer while the alarm tone is audible |
//!
//! The handlers are plain functions over [`SharedState`] so the target port
//! can call them from its vectors and host tests can call them between any
//! two task polls.
//!
//! ## Debouncing
//!
//! Each button owns a [`Debounce`] lockout: after an accepted edge, further
//! edges within `DEBOUNCE_TICKS` are ignored. Closed-gate presses still
//! count as accepted edges and restart the lockout.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::DEBOUNCE_TICKS;
use crate::peripheral::ToneDriver;
use crate::state::SharedState;
use crate::time::Instant;

/// Tick-based lockout for one button.
pub struct Debounce {
    last_accepted: AtomicU32,
    seen: AtomicBool,
}

impl Debounce {
    pub const fn new() -> Self {
        Self {
            last_accepted: AtomicU32::new(0),
            seen: AtomicBool::new(false),
        }
    }

    /// Accept the edge at `now` unless it falls inside the lockout window
    /// of the previous accepted edge.
    ///
    /// Only the owning handler calls this, and a handler never preempts
    /// itself, so the load and the stores need not be one atomic step.
    pub fn accept(&self, now: Instant) -> bool {
        if self.seen.load(Ordering::Acquire) {
            let last = Instant::from_ticks(self.last_accepted.load(Ordering::Acquire));
            if now.since(last) < DEBOUNCE_TICKS {
                return false;
            }
        }
        self.last_accepted.store(now.ticks(), Ordering::Release);
        self.seen.store(true, Ordering::Release);
        true
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new()
    }
}

/// Capacity-increment button. Returns `true` if the limit changed.
pub fn on_increment(state: &SharedState, debounce: &Debounce, now: Instant) -> bool {
    if !debounce.accept(now) {
        return false;
    }
    match state.increment_capacity() {
        Some(limit) => {
            debug!("limit -> {}", limit);
            true
        }
        None => false,
    }
}

/// Phase-advance button. Returns `true` if this press closed the gate.
pub fn on_advance(state: &SharedState, debounce: &Debounce, now: Instant) -> bool {
    if !debounce.accept(now) {
        return false;
    }
    let advanced = state.request_advance();
    if advanced {
        debug!("advance requested");
    }
    advanced
}

/// Tone timer overflow. Returns `true` if the buzzer was toggled.
///
/// Runs concurrently with every task, so it reads the phase-over flag and
/// the tone as separate single-word loads and never holds the mutex.
pub fn on_tone_timer<T: ToneDriver>(state: &SharedState, driver: &mut T) -> bool {
    if !state.phase_over() {
        return false;
    }
    let Some(tone) = state.tone() else {
        return false;
    };
    let level = state.toggle_tone_level();
    driver.set_output(level);
    driver.set_period(tone.reload());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTone;
    use crate::tone::Tone;

    /// Fire `n` increment edges, each one lockout window apart.
    fn press_increment(state: &SharedState, debounce: &Debounce, start: Instant, n: u32) -> Instant {
        let mut now = start;
        for _ in 0..n {
            on_increment(state, debounce, now);
            now = now.after(DEBOUNCE_TICKS);
        }
        now
    }

    #[test]
    fn test_increment_counts_modulo_41() {
        for n in [0u32, 1, 5, 40, 41, 42, 100, 123] {
            let state = SharedState::new();
            let debounce = Debounce::new();
            press_increment(&state, &debounce, Instant::ZERO, n);
            assert_eq!(state.capacity(), (n % 41) as u8, "after {} presses", n);
        }
    }

    #[test]
    fn test_bounce_inside_lockout_is_ignored() {
        let state = SharedState::new();
        let debounce = Debounce::new();
        let t0 = Instant::from_ticks(1000);

        assert!(on_increment(&state, &debounce, t0));
        assert!(!on_increment(&state, &debounce, t0));
        assert!(!on_increment(&state, &debounce, t0.after(DEBOUNCE_TICKS - 1)));
        assert!(on_increment(&state, &debounce, t0.after(DEBOUNCE_TICKS)));
        assert_eq!(state.capacity(), 2);
    }

    #[test]
    fn test_closed_gate_ignores_increments() {
        let state = SharedState::new();
        let inc = Debounce::new();
        let adv = Debounce::new();

        let now = press_increment(&state, &inc, Instant::ZERO, 7);
        assert!(on_advance(&state, &adv, now));
        assert!(!state.start_gate_open());

        press_increment(&state, &inc, now.after(100), 20);
        assert_eq!(state.capacity(), 7);
    }

    #[test]
    fn test_advance_only_once() {
        let state = SharedState::new();
        let adv = Debounce::new();
        assert!(on_advance(&state, &adv, Instant::ZERO));
        assert!(!on_advance(&state, &adv, Instant::from_ticks(500)));
    }

    #[test]
    fn test_tone_timer_idle_before_phase_over() {
        let state = SharedState::new();
        let mut tone = MockTone::default();
        state.set_tone(Some(Tone::UDO));

        assert!(!on_tone_timer(&state, &mut tone));
        assert_eq!(tone.toggles, 0);
        assert!(!state.tone_level());
    }

    #[test]
    fn test_tone_timer_silent_sentinel() {
        let state = SharedState::new();
        let mut tone = MockTone::default();
        state.finish_counting();
        state.set_tone(None);

        for _ in 0..10 {
            assert!(!on_tone_timer(&state, &mut tone));
        }
        assert_eq!(tone.toggles, 0);
    }

    #[test]
    fn test_tone_timer_toggles_and_reloads() {
        let state = SharedState::new();
        let mut tone = MockTone::default();
        state.finish_counting();
        state.set_tone(Some(Tone::UDO));

        assert!(on_tone_timer(&state, &mut tone));
        assert!(tone.level);
        assert!(on_tone_timer(&state, &mut tone));
        assert!(!tone.level);
        assert_eq!(tone.toggles, 2);
        assert_eq!(tone.period, Some(Tone::UDO.reload()));
    }
}
