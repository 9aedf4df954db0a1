//! # Segment and Bar Encoding
//!
//! Pure lookup tables and the two generic display drivers built on them.
//! Segment bytes use the usual `.gfedcba` bit order (bit 0 = segment a).

use crate::config::{BAR_SEGMENTS, DIGIT_HOLD_US};
use crate::peripheral::{BarDisplay, DigitDisplay, LedPort, SegmentBus};

/// Hexadecimal digit glyphs, 0–F.
pub const DIGIT_GLYPHS: [u8; 16] = [
    0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x27, 0x7F, 0x6F, 0x77, 0x7C, 0x39, 0x5E, 0x79, 0x71,
];

/// "OVER", rightmost digit first: r, E, V, O.
pub const OVER_GLYPHS: [u8; 4] = [0x50, 0x79, 0x3E, 0x3F];

/// Digit-select masks, rightmost digit first.
pub const DIGIT_SELECT: [u8; 4] = [0x01, 0x02, 0x04, 0x08];

/// Bar fill patterns for 0–8 lit LEDs, filled from the most significant bit.
pub const BAR_PATTERNS: [u8; 9] = [0x00, 0x80, 0xC0, 0xE0, 0xF0, 0xF8, 0xFC, 0xFE, 0xFF];

/// Glyph for a single digit. Values above 15 render blank.
pub fn glyph(digit: u8) -> u8 {
    DIGIT_GLYPHS.get(digit as usize).copied().unwrap_or(0)
}

/// Glyphs for `value` as `[ones, tens]`, saturating at 99.
pub fn two_digits(value: u8) -> [u8; 2] {
    let value = value.min(99);
    [glyph(value % 10), glyph(value / 10)]
}

/// Number of bar LEDs to light for `count` entries out of `limit`.
///
/// Multiplies before dividing and rounds down, saturating at
/// `BAR_SEGMENTS`. A zero limit lights nothing.
pub fn bar_level(count: u8, limit: u8) -> u8 {
    if limit == 0 {
        return 0;
    }
    let level = u16::from(count) * u16::from(BAR_SEGMENTS) / u16::from(limit);
    level.min(u16::from(BAR_SEGMENTS)) as u8
}

/// LED pattern for `level` lit segments, saturating at full.
pub fn bar_pattern(level: u8) -> u8 {
    BAR_PATTERNS
        .get(level as usize)
        .copied()
        .unwrap_or(BAR_PATTERNS[BAR_PATTERNS.len() - 1])
}

/// Two- or four-digit multiplexed display over a [`SegmentBus`].
pub struct MultiplexedDisplay<B> {
    bus: B,
}

impl<B: SegmentBus> MultiplexedDisplay<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn release(self) -> B {
        self.bus
    }

    fn scan(&mut self, glyphs: &[u8]) {
        for (&segments, &select) in glyphs.iter().zip(DIGIT_SELECT.iter()) {
            self.bus.drive(segments, select);
            self.bus.hold(DIGIT_HOLD_US);
        }
    }
}

impl<B: SegmentBus> DigitDisplay for MultiplexedDisplay<B> {
    fn show_number(&mut self, value: u8) {
        self.scan(&two_digits(value));
    }

    fn show_overflow(&mut self) {
        self.scan(&OVER_GLYPHS);
    }
}

/// Proportional bar over an eight-bit [`LedPort`].
pub struct LedBar<P> {
    port: P,
}

impl<P: LedPort> LedBar<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }

    pub fn release(self) -> P {
        self.port
    }
}

impl<P: LedPort> BarDisplay for LedBar<P> {
    fn show_level(&mut self, lit: u8) {
        self.port.write(bar_pattern(lit));
    }
}
