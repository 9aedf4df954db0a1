//! # Alarm Tones
//!
//! A tone is the reload value written into the 8-bit tone timer after each
//! overflow: the counter runs from the reload value up to 256, so a larger
//! value means a shorter half-period and a higher pitch.

use crate::config::{ALARM_CYCLE_LEN, TONE_STEP_LEN};

/// Tone-timer reload value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tone(u8);

impl Tone {
    pub const DO: Tone = Tone(17);
    pub const RE: Tone = Tone(43);
    pub const MI: Tone = Tone(66);
    pub const FA: Tone = Tone(77);
    pub const SOL: Tone = Tone(97);
    pub const LA: Tone = Tone(114);
    pub const TI: Tone = Tone(129);
    /// High DO, one octave above [`Tone::DO`].
    pub const UDO: Tone = Tone(137);

    /// Raw encoding of "no tone" in the shared tone cell.
    pub const SILENT_RAW: u8 = 0xFF;

    /// Build a tone from a raw reload value. `0xFF` is reserved for silence.
    pub const fn from_reload(reload: u8) -> Option<Tone> {
        if reload == Self::SILENT_RAW {
            None
        } else {
            Some(Tone(reload))
        }
    }

    pub const fn reload(self) -> u8 {
        self.0
    }

    /// Encode an optional tone for the shared tone cell.
    pub const fn encode(tone: Option<Tone>) -> u8 {
        match tone {
            Some(t) => t.0,
            None => Self::SILENT_RAW,
        }
    }
}

/// The alarm melody: three beats of high DO followed by a rest.
pub const ALARM_SEQUENCE: [Option<Tone>; 4] = [Some(Tone::UDO), Some(Tone::UDO), Some(Tone::UDO), None];

/// Tone for alarm iteration `iteration`, each sequence entry held for
/// `TONE_STEP_LEN` iterations and the whole sequence repeating every
/// `ALARM_CYCLE_LEN`.
pub fn tone_for_iteration(iteration: u32) -> Option<Tone> {
    let step = (iteration % ALARM_CYCLE_LEN) / TONE_STEP_LEN;
    ALARM_SEQUENCE
        .get(step as usize)
        .copied()
        .flatten()
}
