use super::Fabric;
use crate::flags::{PendMode, PhaseFlags};
use crate::peripheral::{Board, DigitDisplay};
use crate::state::AdmissionPoll;
use crate::task::{Context, Step, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupState {
    /// Waiting for the `SETUP` bit.
    AwaitStart,
    /// Showing the limit while the operator adjusts it.
    Collecting { shown: u8 },
}

/// Lets the operator pick the admission limit, then hands it to counting.
pub struct SetupPhase<'a> {
    fabric: &'a Fabric,
    state: SetupState,
}

impl<'a> SetupPhase<'a> {
    pub const fn new(fabric: &'a Fabric) -> Self {
        Self {
            fabric,
            state: SetupState::AwaitStart,
        }
    }

    pub fn state(&self) -> SetupState {
        self.state
    }
}

impl<P: Board> Task<P> for SetupPhase<'_> {
    fn name(&self) -> &'static str {
        "setup"
    }

    fn poll(&mut self, cx: &mut Context<'_, P>) -> Step {
        match self.state {
            SetupState::AwaitStart => {
                if !self.fabric.flags.try_pend(PhaseFlags::SETUP, PendMode::Consume) {
                    return Step::Blocked;
                }
                self.fabric.state.reset_capacity();
                info!("setup: choose the admission limit");
                self.state = SetupState::Collecting { shown: 0 };
                Step::Continue
            }
            SetupState::Collecting { shown } => {
                cx.io.digits().show_number(shown);
                match self.fabric.state.poll_admission() {
                    AdmissionPoll::Adjusting(limit) => {
                        self.state = SetupState::Collecting { shown: limit };
                    }
                    AdmissionPoll::Confirmed(limit) => {
                        // Mailbox first: counting takes the limit before
                        // it waits on its bit.
                        self.fabric.mailbox.post(limit);
                        self.fabric.flags.post(PhaseFlags::COUNTING);
                        info!("setup: limit {} confirmed", limit);
                        self.state = SetupState::AwaitStart;
                    }
                }
                Step::Continue
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isr::{on_advance, on_increment, Debounce};
    use crate::mock::{mock_io, MockIo};
    use crate::time::Instant;

    fn poll(phase: &mut SetupPhase<'_>, io: &mut MockIo) -> Step {
        let mut cx = Context { now: Instant::ZERO, io };
        phase.poll(&mut cx)
    }

    #[test]
    fn test_blocks_until_setup_bit() {
        let fabric = Fabric::new();
        fabric.flags.try_pend(PhaseFlags::SETUP, PendMode::Consume);
        let mut phase = SetupPhase::new(&fabric);
        let mut io = mock_io(1000);

        assert_eq!(poll(&mut phase, &mut io), Step::Blocked);
        assert_eq!(phase.state(), SetupState::AwaitStart);
        assert!(io.digits.numbers.is_empty());

        fabric.flags.post(PhaseFlags::SETUP);
        assert_eq!(poll(&mut phase, &mut io), Step::Continue);
        assert_eq!(phase.state(), SetupState::Collecting { shown: 0 });
        assert!(!fabric.flags.current().contains(PhaseFlags::SETUP));
    }

    #[test]
    fn test_wake_resets_limit() {
        let fabric = Fabric::new();
        let debounce = Debounce::new();
        on_increment(&fabric.state, &debounce, Instant::ZERO);
        assert_eq!(fabric.state.capacity(), 1);

        let mut phase = SetupPhase::new(&fabric);
        poll(&mut phase, &mut mock_io(1000));
        assert_eq!(fabric.state.capacity(), 0);
    }

    #[test]
    fn test_display_follows_limit() {
        let fabric = Fabric::new();
        let debounce = Debounce::new();
        let mut phase = SetupPhase::new(&fabric);
        let mut io = mock_io(1000);

        poll(&mut phase, &mut io);
        let mut now = Instant::ZERO;
        for _ in 0..3 {
            poll(&mut phase, &mut io);
            on_increment(&fabric.state, &debounce, now);
            now = now.after(100);
        }
        poll(&mut phase, &mut io);
        // Each render shows the limit read by the previous poll.
        assert_eq!(io.digits.numbers, [0, 0, 1, 2]);
    }

    #[test]
    fn test_posts_limit_seen_at_advance() {
        let fabric = Fabric::new();
        let inc = Debounce::new();
        let adv = Debounce::new();
        let mut phase = SetupPhase::new(&fabric);
        let mut io = mock_io(1000);

        poll(&mut phase, &mut io);
        poll(&mut phase, &mut io);

        // Presses land between polls; the display is still one behind.
        let mut now = Instant::from_ticks(10);
        for _ in 0..3 {
            on_increment(&fabric.state, &inc, now);
            now = now.after(100);
        }
        on_advance(&fabric.state, &adv, now);
        on_increment(&fabric.state, &inc, now.after(100));

        assert_eq!(poll(&mut phase, &mut io), Step::Continue);
        assert_eq!(io.digits.numbers.last(), Some(&0));
        assert_eq!(fabric.mailbox.try_pend(), Some(3));
        assert!(fabric.flags.current().contains(PhaseFlags::COUNTING));
        assert_eq!(phase.state(), SetupState::AwaitStart);
    }

    #[test]
    fn test_runs_once() {
        let fabric = Fabric::new();
        let adv = Debounce::new();
        let mut phase = SetupPhase::new(&fabric);
        let mut io = mock_io(1000);

        poll(&mut phase, &mut io);
        on_advance(&fabric.state, &adv, Instant::ZERO);
        poll(&mut phase, &mut io);
        assert_eq!(fabric.mailbox.try_pend(), Some(0));

        for _ in 0..5 {
            assert_eq!(poll(&mut phase, &mut io), Step::Blocked);
        }
        assert!(!fabric.mailbox.is_full());
    }
}
