//! # capmon Firmware
//!
//! Board entry point: brings up the STM32F411 peripherals, spawns the
//! three phase tasks and runs the kernel, sleeping with `wfi` whenever a
//! scheduling pass finds nothing to do.
//!
//! | Vector | Handler |
//! |--------|---------|
//! | SysTick | advance the monotonic clock |
//! | EXTI1 | increment button |
//! | EXTI4 | advance button |
//! | TIM3 | tone timer |
//!
//! Device interrupts arrive through `DefaultHandler` and are dispatched by
//! IRQ number.

#![no_std]
#![no_main]

use cortex_m_rt::{entry, exception};
#[cfg(feature = "defmt")]
use defmt_rtt as _;
use panic_halt as _;

use capmon::arch::board::{self, Buzzer, ADVANCE_LINE, INCREMENT_LINE};
use capmon::arch::cortex_m4::{self, Irq};
use capmon::isr::{self, Debounce};
use capmon::kernel::Kernel;
use capmon::peripheral::Peripherals;
use capmon::phases::{Fabric, Pipeline};
use capmon::segment::{LedBar, MultiplexedDisplay};
use capmon::sync::CancelToken;
use capmon::time::Monotonic;

static FABRIC: Fabric = Fabric::new();
static MONOTONIC: Monotonic = Monotonic::new();
static INCREMENT_DEBOUNCE: Debounce = Debounce::new();
static ADVANCE_DEBOUNCE: Debounce = Debounce::new();
/// Never cancelled on this board; the kernel runs for the life of the
/// power cycle.
static SHUTDOWN: CancelToken = CancelToken::new();

#[entry]
fn main() -> ! {
    let mut cp = cortex_m::Peripherals::take().expect("core peripherals already taken");

    let parts = board::init();
    let mut io = Peripherals::new(
        MultiplexedDisplay::new(parts.segments),
        LedBar::new(parts.leds),
        parts.sensor,
    );

    let mut pipeline = Pipeline::new(&FABRIC);
    let mut kernel = Kernel::new(&MONOTONIC);
    pipeline.spawn(&mut kernel).expect("failed to spawn phase tasks");

    cortex_m4::configure_systick(&mut cp.SYST);
    cortex_m4::set_interrupt_priorities(&mut cp.NVIC);

    #[cfg(feature = "defmt")]
    defmt::info!("capmon: started");

    if let Err(_e) = kernel.run(&mut io, &SHUTDOWN, |_| cortex_m4::idle()) {
        #[cfg(feature = "defmt")]
        defmt::error!("capmon: kernel stopped: {}", _e);
    }

    loop {
        cortex_m4::idle();
    }
}

#[exception]
fn SysTick() {
    MONOTONIC.tick();
}

#[exception]
unsafe fn DefaultHandler(irqn: i16) {
    match Irq::from_number(irqn) {
        Some(Irq::Exti1) => {
            if board::take_exti(INCREMENT_LINE) {
                isr::on_increment(&FABRIC.state, &INCREMENT_DEBOUNCE, MONOTONIC.now());
            }
        }
        Some(Irq::Exti4) => {
            if board::take_exti(ADVANCE_LINE) {
                isr::on_advance(&FABRIC.state, &ADVANCE_DEBOUNCE, MONOTONIC.now());
            }
        }
        Some(Irq::Tim3) => {
            board::ack_tone_timer();
            let mut buzzer = Buzzer::steal();
            isr::on_tone_timer(&FABRIC.state, &mut buzzer);
        }
        None => {}
    }
}
