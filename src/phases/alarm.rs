use super::Fabric;
use crate::config::ALARM_CYCLE_LEN;
use crate::flags::{PendMode, PhaseFlags};
use crate::peripheral::{Board, DigitDisplay};
use crate::state::AlarmLatch;
use crate::task::{Context, Step, Task};
use crate::tone::tone_for_iteration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmState {
    AwaitAlarm,
    /// Playing the alarm; `iteration` counts 0 to `ALARM_CYCLE_LEN - 1`.
    Sounding { iteration: u32 },
}

/// Flashes "OVER" and plays the alarm melody until cancelled.
pub struct AlarmPhase<'a> {
    fabric: &'a Fabric,
    state: AlarmState,
}

impl<'a> AlarmPhase<'a> {
    pub const fn new(fabric: &'a Fabric) -> Self {
        Self {
            fabric,
            state: AlarmState::AwaitAlarm,
        }
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    pub fn is_sounding(&self) -> bool {
        matches!(self.state, AlarmState::Sounding { .. })
    }
}

impl<P: Board> Task<P> for AlarmPhase<'_> {
    fn name(&self) -> &'static str {
        "alarm"
    }

    fn poll(&mut self, cx: &mut Context<'_, P>) -> Step {
        match self.state {
            AlarmState::AwaitAlarm => {
                // A latched alarm is permanent, so re-entry skips the flag.
                if self.fabric.state.alarm_latch() != AlarmLatch::Latched {
                    if !self.fabric.flags.try_pend(PhaseFlags::ALARM, PendMode::Keep) {
                        return Step::Blocked;
                    }
                    // The bit alone is not enough: counting must have armed
                    // the latch.
                    if self.fabric.state.latch_alarm() != AlarmLatch::Latched {
                        return Step::Blocked;
                    }
                }
                info!("alarm: sounding");
                self.state = AlarmState::Sounding { iteration: 0 };
                Step::Continue
            }
            AlarmState::Sounding { iteration } => {
                self.fabric.state.set_tone(tone_for_iteration(iteration));
                cx.io.digits().show_overflow();
                self.state = AlarmState::Sounding {
                    iteration: (iteration + 1) % ALARM_CYCLE_LEN,
                };
                Step::Continue
            }
        }
    }
}
