use super::Fabric;
use crate::config::{DARKNESS_THRESHOLD, POLL_INTERVAL_TICKS, SENSOR_MAX};
use crate::flags::{PendMode, PhaseFlags};
use crate::peripheral::{BarDisplay, Board, DigitDisplay, LightSensor};
use crate::segment::bar_level;
use crate::task::{Context, Step, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CountingState {
    /// Waiting for the limit in the mailbox.
    AwaitLimit,
    /// Limit received; waiting for the `COUNTING` bit.
    AwaitGo { limit: u8 },
    /// Sampling the sensor once per poll interval.
    Counting { limit: u8, count: u8 },
}

/// Counts sensor darkenings until the count passes the admission limit,
/// then raises the alarm.
pub struct CountingPhase<'a> {
    fabric: &'a Fabric,
    state: CountingState,
}

impl<'a> CountingPhase<'a> {
    pub const fn new(fabric: &'a Fabric) -> Self {
        Self {
            fabric,
            state: CountingState::AwaitLimit,
        }
    }

    pub fn state(&self) -> CountingState {
        self.state
    }

    fn finish(&mut self, count: u8) {
        self.fabric.state.finish_counting();
        self.fabric.flags.post(PhaseFlags::ALARM);
        info!("counting: over capacity at {}", count);
        self.state = CountingState::AwaitLimit;
    }
}

/// Clamp a raw reading to the 10-bit converter range.
fn clamp_sample(raw: u16) -> u16 {
    if raw > SENSOR_MAX {
        warn!("sensor reading {} out of range", raw);
        SENSOR_MAX
    } else {
        raw
    }
}

impl<P: Board> Task<P> for CountingPhase<'_> {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn poll(&mut self, cx: &mut Context<'_, P>) -> Step {
        match self.state {
            CountingState::AwaitLimit => match self.fabric.mailbox.try_pend() {
                Some(limit) => {
                    debug!("counting: limit {} received", limit);
                    self.state = CountingState::AwaitGo { limit };
                    Step::Continue
                }
                None => Step::Blocked,
            },
            CountingState::AwaitGo { limit } => {
                if !self.fabric.flags.try_pend(PhaseFlags::COUNTING, PendMode::Consume) {
                    return Step::Blocked;
                }
                info!("counting: started, limit {}", limit);
                self.state = CountingState::Counting { limit, count: 0 };
                Step::Continue
            }
            CountingState::Counting { limit, count } => {
                if count > limit {
                    self.finish(count);
                    return Step::Continue;
                }

                cx.io.digits().show_number(count);
                cx.io.bar().show_level(bar_level(count, limit));

                let sample = clamp_sample(cx.io.sensor().sample());
                let count = if sample < DARKNESS_THRESHOLD {
                    count.saturating_add(1)
                } else {
                    count
                };
                trace!("counting: sample {} count {}", sample, count);

                self.state = CountingState::Counting { limit, count };
                Step::Sleep(POLL_INTERVAL_TICKS)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{mock_io, MockIo, ScriptedSensor};
    use crate::state::AlarmLatch;
    use crate::time::Instant;

    const DARK: u16 = 100;
    const BRIGHT: u16 = 1000;

    fn poll(phase: &mut CountingPhase<'_>, io: &mut MockIo) -> Step {
        let mut cx = Context { now: Instant::ZERO, io };
        phase.poll(&mut cx)
    }

    /// Hand `limit` to the phase and start it, as setup would.
    fn started(fabric: &Fabric, limit: u8) -> CountingPhase<'_> {
        fabric.mailbox.post(limit);
        fabric.flags.post(PhaseFlags::COUNTING);
        let mut phase = CountingPhase::new(fabric);
        let mut io = mock_io(BRIGHT);
        assert_eq!(poll(&mut phase, &mut io), Step::Continue);
        assert_eq!(poll(&mut phase, &mut io), Step::Continue);
        assert_eq!(phase.state(), CountingState::Counting { limit, count: 0 });
        phase
    }

    /// Poll until the phase leaves `Counting`. Returns the number of polls.
    fn run_to_finish(phase: &mut CountingPhase<'_>, io: &mut MockIo) -> u32 {
        let mut polls = 0;
        while matches!(phase.state(), CountingState::Counting { .. }) {
            poll(phase, io);
            polls += 1;
            assert!(polls < 1000, "counting never finished");
        }
        polls
    }

    #[test]
    fn test_needs_mailbox_then_flag() {
        let fabric = Fabric::new();
        let mut phase = CountingPhase::new(&fabric);
        let mut io = mock_io(DARK);

        fabric.flags.post(PhaseFlags::COUNTING);
        assert_eq!(poll(&mut phase, &mut io), Step::Blocked);
        assert_eq!(phase.state(), CountingState::AwaitLimit);

        fabric.flags.try_pend(PhaseFlags::COUNTING, PendMode::Consume);
        fabric.mailbox.post(4);
        assert_eq!(poll(&mut phase, &mut io), Step::Continue);
        assert_eq!(poll(&mut phase, &mut io), Step::Blocked);
        assert_eq!(phase.state(), CountingState::AwaitGo { limit: 4 });

        fabric.flags.post(PhaseFlags::COUNTING);
        assert_eq!(poll(&mut phase, &mut io), Step::Continue);
        assert!(!fabric.flags.current().contains(PhaseFlags::COUNTING));
        assert!(io.digits.numbers.is_empty());
    }

    #[test]
    fn test_limit_five_renders_six_times() {
        let fabric = Fabric::new();
        let mut phase = started(&fabric, 5);
        let mut io = mock_io(DARK);

        let polls = run_to_finish(&mut phase, &mut io);
        assert_eq!(polls, 7);
        assert_eq!(io.digits.numbers, [0, 1, 2, 3, 4, 5]);
        assert_eq!(io.bar.levels, [0, 1, 3, 4, 6, 8]);
        assert_eq!(io.sensor.samples, 6);
    }

    #[test]
    fn test_limit_zero_renders_once() {
        let fabric = Fabric::new();
        let mut phase = started(&fabric, 0);
        let mut io = mock_io(DARK);

        run_to_finish(&mut phase, &mut io);
        assert_eq!(io.digits.numbers, [0]);
        assert_eq!(io.bar.levels, [0]);
    }

    #[test]
    fn test_bright_samples_do_not_count() {
        let fabric = Fabric::new();
        let mut phase = started(&fabric, 2);
        let mut io = MockIo::new(
            Default::default(),
            Default::default(),
            ScriptedSensor::script(&[BRIGHT, DARK, BRIGHT, BRIGHT, DARK, DARK], BRIGHT),
        );

        run_to_finish(&mut phase, &mut io);
        assert_eq!(io.digits.numbers, [0, 0, 1, 1, 1, 2]);
        assert_eq!(io.sensor.samples, 6);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let fabric = Fabric::new();
        let mut phase = started(&fabric, 3);
        let mut io = MockIo::new(
            Default::default(),
            Default::default(),
            ScriptedSensor::script(&[DARKNESS_THRESHOLD, DARKNESS_THRESHOLD - 1], BRIGHT),
        );

        poll(&mut phase, &mut io);
        poll(&mut phase, &mut io);
        assert_eq!(phase.state(), CountingState::Counting { limit: 3, count: 1 });
    }

    #[test]
    fn test_out_of_range_sample_is_clamped() {
        assert_eq!(clamp_sample(0x0400), SENSOR_MAX);
        assert_eq!(clamp_sample(u16::MAX), SENSOR_MAX);
        assert_eq!(clamp_sample(512), 512);

        let fabric = Fabric::new();
        let mut phase = started(&fabric, 1);
        let mut io = mock_io(u16::MAX);
        poll(&mut phase, &mut io);
        assert_eq!(phase.state(), CountingState::Counting { limit: 1, count: 0 });
    }

    #[test]
    fn test_sleeps_between_samples() {
        let fabric = Fabric::new();
        let mut phase = started(&fabric, 3);
        let mut io = mock_io(BRIGHT);
        assert_eq!(poll(&mut phase, &mut io), Step::Sleep(POLL_INTERVAL_TICKS));
    }

    #[test]
    fn test_finish_raises_alarm() {
        let fabric = Fabric::new();
        let mut phase = started(&fabric, 1);
        let mut io = mock_io(DARK);

        assert!(!fabric.state.phase_over());
        run_to_finish(&mut phase, &mut io);

        assert!(fabric.state.phase_over());
        assert_eq!(fabric.state.alarm_latch(), AlarmLatch::Active);
        assert!(fabric.flags.current().contains(PhaseFlags::ALARM));
        assert_eq!(phase.state(), CountingState::AwaitLimit);
        assert_eq!(poll(&mut phase, &mut io), Step::Blocked);
    }
}
