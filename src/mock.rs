//! Recording peripherals for host tests.

use crate::peripheral::{BarDisplay, DigitDisplay, LightSensor, Peripherals, ToneDriver};

/// Install `env_logger` once per test binary. Later calls are no-ops.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Default)]
pub struct MockDigits {
    /// Every value passed to `show_number`, in order.
    pub numbers: Vec<u8>,
    pub overflows: u32,
}

impl DigitDisplay for MockDigits {
    fn show_number(&mut self, value: u8) {
        self.numbers.push(value);
    }

    fn show_overflow(&mut self) {
        self.overflows += 1;
    }
}

#[derive(Debug, Default)]
pub struct MockBar {
    pub levels: Vec<u8>,
}

impl BarDisplay for MockBar {
    fn show_level(&mut self, lit: u8) {
        self.levels.push(lit);
    }
}

/// Sensor that plays back a script, then repeats a fallback value.
#[derive(Debug)]
pub struct ScriptedSensor {
    script: Vec<u16>,
    fallback: u16,
    pub samples: u32,
}

impl ScriptedSensor {
    pub fn always(value: u16) -> Self {
        Self::script(&[], value)
    }

    pub fn script(values: &[u16], fallback: u16) -> Self {
        Self {
            script: values.iter().rev().copied().collect(),
            fallback,
            samples: 0,
        }
    }
}

impl LightSensor for ScriptedSensor {
    fn sample(&mut self) -> u16 {
        self.samples += 1;
        self.script.pop().unwrap_or(self.fallback)
    }
}

/// Buzzer that counts polarity changes.
#[derive(Debug, Default)]
pub struct MockTone {
    pub level: bool,
    pub toggles: u32,
    pub period: Option<u8>,
}

impl ToneDriver for MockTone {
    fn set_period(&mut self, reload: u8) {
        self.period = Some(reload);
    }

    fn set_output(&mut self, high: bool) {
        if high != self.level {
            self.toggles += 1;
        }
        self.level = high;
    }
}

pub type MockIo = Peripherals<MockDigits, MockBar, ScriptedSensor>;

/// Mock peripherals with a sensor that reads `sensor` forever.
pub fn mock_io(sensor: u16) -> MockIo {
    Peripherals::new(MockDigits::default(), MockBar::default(), ScriptedSensor::always(sensor))
}
