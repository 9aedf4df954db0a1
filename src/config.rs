//! # Capmon Configuration
//!
//! Compile-time constants governing the kernel and the three phases.
//! Everything the device needs is fixed at build time: there is no
//! persisted or runtime configuration.

/// Maximum number of tasks the scheduler can hold. The pipeline uses
/// exactly three (setup, counting, alarm).
pub const MAX_TASKS: usize = 3;

/// SysTick frequency in Hz. One tick is the resolution of every
/// task-level delay.
pub const TICK_HZ: u32 = 1000;

/// System clock frequency in Hz (STM32F4 HSI, no PLL).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

// ---------------------------------------------------------------------------
// Task priorities (higher = more important)
// ---------------------------------------------------------------------------

/// Setup phase: the operator chooses the admission limit.
pub const SETUP_PRIORITY: u8 = 3;

/// Counting phase: entries are counted against the limit.
pub const COUNTING_PRIORITY: u8 = 2;

/// Alarm phase: the limit was exceeded.
pub const ALARM_PRIORITY: u8 = 1;

// ---------------------------------------------------------------------------
// Phase constants
// ---------------------------------------------------------------------------

/// The admission limit wraps modulo this base, so valid limits are 0–40.
pub const CAPACITY_MODULUS: u8 = 41;

/// Light-sensor reading below which the beam counts as interrupted.
pub const DARKNESS_THRESHOLD: u16 = 971;

/// Largest value the 10-bit ADC can produce. Anything above is clamped.
pub const SENSOR_MAX: u16 = 0x03FF;

/// Interval between two light-sensor samples in the counting phase.
pub const POLL_INTERVAL_MS: u32 = 200;

/// Lockout window after an accepted button edge.
pub const DEBOUNCE_MS: u32 = 2;

/// Time each multiplexed display digit stays lit.
pub const DIGIT_HOLD_US: u32 = 500;

/// Alarm iterations per tone-sequence sweep.
pub const ALARM_CYCLE_LEN: u32 = 200;

/// Alarm iterations spent on each entry of the tone sequence.
pub const TONE_STEP_LEN: u32 = 50;

/// Number of LEDs in the proportional bar.
pub const BAR_SEGMENTS: u8 = 8;

/// Convert milliseconds to scheduler ticks, rounding up so that a
/// non-zero duration never collapses to zero ticks.
pub const fn ms_to_ticks(ms: u32) -> u32 {
    (ms * TICK_HZ + 999) / 1000
}

/// Sensor polling interval in ticks.
pub const POLL_INTERVAL_TICKS: u32 = ms_to_ticks(POLL_INTERVAL_MS);

/// Button lockout window in ticks.
pub const DEBOUNCE_TICKS: u32 = ms_to_ticks(DEBOUNCE_MS);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_conversion_rounds_up() {
        assert_eq!(ms_to_ticks(0), 0);
        assert_eq!(ms_to_ticks(200), 200);
        assert!(DEBOUNCE_TICKS >= 1);
    }

    #[test]
    fn test_tone_sequence_fills_cycle() {
        assert_eq!(ALARM_CYCLE_LEN / TONE_STEP_LEN, 4);
    }
}
