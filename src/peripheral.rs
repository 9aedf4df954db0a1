//! # Peripheral Adapters
//!
//! The phases never touch hardware directly. They render and sample through
//! the traits below; the target port implements them over GPIO and ADC
//! registers, and host tests substitute recording mocks.
//!
//! | Trait | Used by | Target implementation |
//! |-------|---------|-----------------------|
//! | [`DigitDisplay`] | all phases | [`segment::MultiplexedDisplay`] over a [`SegmentBus`] |
//! | [`BarDisplay`] | counting | [`segment::LedBar`] over a [`LedPort`] |
//! | [`LightSensor`] | counting | ADC single conversion |
//! | [`ToneDriver`] | tone timer ISR | buzzer pin + 8-bit timer reload |
//!
//! [`segment::MultiplexedDisplay`]: crate::segment::MultiplexedDisplay
//! [`segment::LedBar`]: crate::segment::LedBar

/// Two-digit seven-segment display.
///
/// Both methods block for the multiplexing hold time of every digit they
/// light.
pub trait DigitDisplay {
    /// Show `value` as two decimal digits. Values above 99 show as 99.
    fn show_number(&mut self, value: u8);

    /// Show the four-digit "OVER" glyph sequence.
    fn show_overflow(&mut self);
}

/// Eight-LED proportional bar.
pub trait BarDisplay {
    /// Light the first `lit` LEDs (0 to 8).
    fn show_level(&mut self, lit: u8);
}

/// Light-dependent resistor behind a 10-bit ADC.
pub trait LightSensor {
    /// One instantaneous reading. No averaging or filtering.
    fn sample(&mut self) -> u16;
}

/// Square-wave buzzer. Driven only from the tone timer handler.
pub trait ToneDriver {
    /// Reload the tone timer so the next half-period matches `reload`.
    fn set_period(&mut self, reload: u8);

    /// Drive the buzzer pin.
    fn set_output(&mut self, high: bool);
}

/// Raw seven-segment port pair: a segment pattern and a digit-select mask.
pub trait SegmentBus {
    /// Light `segments` on the digits selected by `select`.
    fn drive(&mut self, segments: u8, select: u8);

    /// Busy-wait for `us` microseconds with the current digit lit.
    fn hold(&mut self, us: u32);
}

/// Eight-bit LED output port.
pub trait LedPort {
    fn write(&mut self, pattern: u8);
}

/// Access to the peripherals the phase tasks render and sample through.
///
/// The scheduler lends one `Board` to whichever task it polls.
pub trait Board {
    type Digits: DigitDisplay;
    type Bar: BarDisplay;
    type Sensor: LightSensor;

    fn digits(&mut self) -> &mut Self::Digits;
    fn bar(&mut self) -> &mut Self::Bar;
    fn sensor(&mut self) -> &mut Self::Sensor;
}

/// The default [`Board`]: one of each adapter.
pub struct Peripherals<D, B, S> {
    pub digits: D,
    pub bar: B,
    pub sensor: S,
}

impl<D, B, S> Peripherals<D, B, S>
where
    D: DigitDisplay,
    B: BarDisplay,
    S: LightSensor,
{
    pub fn new(digits: D, bar: B, sensor: S) -> Self {
        Self { digits, bar, sensor }
    }
}

impl<D, B, S> Board for Peripherals<D, B, S>
where
    D: DigitDisplay,
    B: BarDisplay,
    S: LightSensor,
{
    type Digits = D;
    type Bar = B;
    type Sensor = S;

    fn digits(&mut self) -> &mut D {
        &mut self.digits
    }

    fn bar(&mut self) -> &mut B {
        &mut self.bar
    }

    fn sensor(&mut self) -> &mut S {
        &mut self.sensor
    }
}
