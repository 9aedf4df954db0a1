//! # Cortex-M4 Port Layer
//!
//! Core-peripheral setup for the ARM Cortex-M4: the SysTick tick source,
//! interrupt priorities, idle and busy-wait helpers.
//!
//! ## Interrupt Priorities
//!
//! - SysTick: 0x10, above everything else so the clock never stalls
//! - Tone timer: 0x20
//! - Buttons: 0x40
//!
//! Critical sections mask all of them (`critical-section-single-core`).

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{NVIC, SYST};

use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};

/// Device interrupt lines the firmware uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Irq {
    /// Increment button, PA1.
    Exti1 = 7,
    /// Advance button, PA4.
    Exti4 = 10,
    /// Tone timer overflow.
    Tim3 = 29,
}

impl Irq {
    pub fn from_number(irqn: i16) -> Option<Self> {
        match irqn {
            7 => Some(Irq::Exti1),
            10 => Some(Irq::Exti4),
            29 => Some(Irq::Tim3),
            _ => None,
        }
    }
}

// SAFETY: the discriminants are valid STM32F411 interrupt numbers.
unsafe impl InterruptNumber for Irq {
    #[inline]
    fn number(self) -> u16 {
        self as u16
    }
}

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Configure SysTick to fire at `TICK_HZ` from the processor clock. Each
/// tick advances the kernel's monotonic clock.
pub fn configure_systick(syst: &mut SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

// ---------------------------------------------------------------------------
// Interrupt priority configuration
// ---------------------------------------------------------------------------

/// Set SysTick, tone timer and button priorities and unmask the device
/// interrupts.
pub fn set_interrupt_priorities(nvic: &mut NVIC) {
    unsafe {
        // System Handler Priority Register 3 (SHPR3): 0xE000_ED20
        // Bits [31:24] = SysTick priority
        let shpr3: *mut u32 = 0xE000_ED20 as *mut u32;
        let val = core::ptr::read_volatile(shpr3) & !(0xFF << 24);
        core::ptr::write_volatile(shpr3, val | (0x10 << 24));

        nvic.set_priority(Irq::Tim3, 0x20);
        nvic.set_priority(Irq::Exti1, 0x40);
        nvic.set_priority(Irq::Exti4, 0x40);

        NVIC::unmask(Irq::Tim3);
        NVIC::unmask(Irq::Exti1);
        NVIC::unmask(Irq::Exti4);
    }
}

/// Sleep until the next interrupt.
#[inline]
pub fn idle() {
    cortex_m::asm::wfi();
}

/// Busy-wait for roughly `us` microseconds.
#[inline]
pub fn delay_us(us: u32) {
    cortex_m::asm::delay(us.saturating_mul(SYSTEM_CLOCK_HZ / 1_000_000));
}
