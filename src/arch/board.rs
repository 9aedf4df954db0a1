//! # STM32F411 Board Port
//!
//! Register-level drivers for the capacity monitor board (Nucleo-F411RE at
//! the reset 16 MHz HSI clock):
//!
//! | Signal | Pins | Peripheral |
//! |--------|------|------------|
//! | segments a..g, dp | PB0..PB7 | GPIOB output |
//! | LED bar | PB8..PB15 | GPIOB output |
//! | digit select | PC0..PC3 | GPIOC output |
//! | buzzer | PC8 | GPIOC output, toggled by TIM3 |
//! | light sensor | PA0 | ADC1 channel 0, 10-bit |
//! | increment button | PA1 | EXTI1, falling edge, pull-up |
//! | advance button | PA4 | EXTI4, falling edge, pull-up |

use core::ptr::{read_volatile, write_volatile};

use super::cortex_m4::delay_us;
use crate::peripheral::{LedPort, LightSensor, SegmentBus, ToneDriver};

const RCC_BASE: u32 = 0x4002_3800;
const RCC_AHB1ENR: *mut u32 = (RCC_BASE + 0x30) as *mut u32;
const RCC_APB1ENR: *mut u32 = (RCC_BASE + 0x40) as *mut u32;
const RCC_APB2ENR: *mut u32 = (RCC_BASE + 0x44) as *mut u32;

const GPIOA: u32 = 0x4002_0000;
const GPIOB: u32 = 0x4002_0400;
const GPIOC: u32 = 0x4002_0800;
const GPIO_MODER: u32 = 0x00;
const GPIO_PUPDR: u32 = 0x0C;
const GPIO_BSRR: u32 = 0x18;

const ADC1: u32 = 0x4001_2000;
const ADC_SR: *mut u32 = ADC1 as *mut u32;
const ADC_CR1: *mut u32 = (ADC1 + 0x04) as *mut u32;
const ADC_CR2: *mut u32 = (ADC1 + 0x08) as *mut u32;
const ADC_SQR3: *mut u32 = (ADC1 + 0x34) as *mut u32;
const ADC_DR: *mut u32 = (ADC1 + 0x4C) as *mut u32;
const ADC_SR_EOC: u32 = 1 << 1;
const ADC_CR2_ADON: u32 = 1 << 0;
const ADC_CR2_SWSTART: u32 = 1 << 30;
const ADC_CR1_RES_10BIT: u32 = 0b01 << 24;

const TIM3: u32 = 0x4000_0400;
const TIM3_CR1: *mut u32 = TIM3 as *mut u32;
const TIM3_DIER: *mut u32 = (TIM3 + 0x0C) as *mut u32;
const TIM3_SR: *mut u32 = (TIM3 + 0x10) as *mut u32;
const TIM3_EGR: *mut u32 = (TIM3 + 0x14) as *mut u32;
const TIM3_PSC: *mut u32 = (TIM3 + 0x28) as *mut u32;
const TIM3_ARR: *mut u32 = (TIM3 + 0x2C) as *mut u32;
/// 16 MHz / 32 = 500 kHz, the rate of the 8-bit tone counter.
const TONE_PRESCALER: u32 = 31;

const EXTI_BASE: u32 = 0x4001_3C00;
const EXTI_IMR: *mut u32 = EXTI_BASE as *mut u32;
const EXTI_FTSR: *mut u32 = (EXTI_BASE + 0x0C) as *mut u32;
const EXTI_PR: *mut u32 = (EXTI_BASE + 0x14) as *mut u32;

/// EXTI line of the increment button.
pub const INCREMENT_LINE: u32 = 1;
/// EXTI line of the advance button.
pub const ADVANCE_LINE: u32 = 4;

const BUZZER_PIN: u32 = 8;
const ADC_TIMEOUT: u32 = 10_000;

#[inline]
fn reg(base: u32, offset: u32) -> *mut u32 {
    (base + offset) as *mut u32
}

/// Read-modify-write helper.
///
/// # Safety
/// `addr` must be a valid peripheral register.
#[inline]
unsafe fn modify(addr: *mut u32, clear: u32, set: u32) {
    let v = read_volatile(addr);
    write_volatile(addr, (v & !clear) | set);
}

/// Put `pins` of the port at `base` into general-purpose output mode.
unsafe fn set_outputs(base: u32, pins: core::ops::Range<u32>) {
    for pin in pins {
        modify(reg(base, GPIO_MODER), 0b11 << (pin * 2), 0b01 << (pin * 2));
    }
}

/// Value for BSRR that drives the `width` pins starting at `shift` to
/// `bits`: set bits in the low half, reset bits in the high half.
#[inline]
fn bsrr_word(bits: u32, shift: u32, width: u32) -> u32 {
    let mask = ((1u32 << width) - 1) << shift;
    let set = (bits << shift) & mask;
    set | ((mask & !set) << 16)
}

// ---------------------------------------------------------------------------
// Bring-up
// ---------------------------------------------------------------------------

/// The parts handed to the kernel after [`init`].
pub struct BoardParts {
    pub segments: SegmentPort,
    pub leds: BarPort,
    pub sensor: AdcSensor,
}

/// Enable clocks and configure every peripheral the firmware uses. The
/// tone timer starts counting immediately; its handler stays silent until
/// counting has finished.
///
/// Call once, before interrupts are unmasked.
pub fn init() -> BoardParts {
    unsafe {
        // GPIOA, GPIOB, GPIOC
        modify(RCC_AHB1ENR, 0, 0b111);
        // TIM3
        modify(RCC_APB1ENR, 0, 1 << 1);
        // ADC1, SYSCFG
        modify(RCC_APB2ENR, 0, (1 << 8) | (1 << 14));
        let _ = read_volatile(RCC_APB2ENR);

        set_outputs(GPIOB, 0..16);
        set_outputs(GPIOC, 0..4);
        set_outputs(GPIOC, BUZZER_PIN..BUZZER_PIN + 1);

        // PA0 analog; PA1, PA4 input with pull-up.
        modify(reg(GPIOA, GPIO_MODER), 0b11, 0b11);
        for line in [INCREMENT_LINE, ADVANCE_LINE] {
            modify(reg(GPIOA, GPIO_MODER), 0b11 << (line * 2), 0);
            modify(reg(GPIOA, GPIO_PUPDR), 0b11 << (line * 2), 0b01 << (line * 2));
        }

        // SYSCFG_EXTICR resets to port A for every line. Unmask both
        // lines on the falling edge.
        let lines = (1 << INCREMENT_LINE) | (1 << ADVANCE_LINE);
        modify(EXTI_FTSR, 0, lines);
        modify(EXTI_IMR, 0, lines);
        write_volatile(EXTI_PR, lines);

        write_volatile(ADC_CR1, ADC_CR1_RES_10BIT);
        write_volatile(ADC_SQR3, 0);
        write_volatile(ADC_CR2, ADC_CR2_ADON);

        write_volatile(TIM3_PSC, TONE_PRESCALER);
        write_volatile(TIM3_ARR, 0xFF);
        write_volatile(TIM3_EGR, 1);
        write_volatile(TIM3_SR, 0);
        write_volatile(TIM3_DIER, 1);
        write_volatile(TIM3_CR1, 1);
    }

    info!("board: peripherals configured");
    BoardParts {
        segments: SegmentPort { _private: () },
        leds: BarPort { _private: () },
        sensor: AdcSensor { _private: () },
    }
}

/// Clear the pending bit of EXTI `line`. Returns whether it was pending.
pub fn take_exti(line: u32) -> bool {
    unsafe {
        let pending = read_volatile(EXTI_PR) & (1 << line) != 0;
        if pending {
            write_volatile(EXTI_PR, 1 << line);
        }
        pending
    }
}

/// Clear the tone timer update flag.
pub fn ack_tone_timer() {
    unsafe { write_volatile(TIM3_SR, 0) };
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

pub struct SegmentPort {
    _private: (),
}

impl SegmentBus for SegmentPort {
    fn drive(&mut self, segments: u8, select: u8) {
        unsafe {
            write_volatile(reg(GPIOB, GPIO_BSRR), bsrr_word(segments.into(), 0, 8));
            write_volatile(reg(GPIOC, GPIO_BSRR), bsrr_word(select.into(), 0, 4));
        }
    }

    fn hold(&mut self, us: u32) {
        delay_us(us);
    }
}

pub struct BarPort {
    _private: (),
}

impl LedPort for BarPort {
    fn write(&mut self, pattern: u8) {
        unsafe { write_volatile(reg(GPIOB, GPIO_BSRR), bsrr_word(pattern.into(), 8, 8)) };
    }
}

pub struct AdcSensor {
    _private: (),
}

impl LightSensor for AdcSensor {
    fn sample(&mut self) -> u16 {
        unsafe {
            modify(ADC_CR2, 0, ADC_CR2_SWSTART);
            let mut spins = 0;
            while read_volatile(ADC_SR) & ADC_SR_EOC == 0 {
                spins += 1;
                if spins == ADC_TIMEOUT {
                    warn!("adc: conversion timed out");
                    break;
                }
            }
            // Reading DR clears EOC.
            (read_volatile(ADC_DR) & 0xFFFF) as u16
        }
    }
}

/// Buzzer pin plus the TIM3 reload. Stateless, so the tone timer handler
/// builds one on every overflow.
pub struct Buzzer {
    _private: (),
}

impl Buzzer {
    /// # Safety
    /// Only the tone timer handler may drive the buzzer.
    pub unsafe fn steal() -> Self {
        Buzzer { _private: () }
    }
}

impl ToneDriver for Buzzer {
    fn set_period(&mut self, reload: u8) {
        // The tone counter runs from `reload` up to 256.
        let ticks = 256 - u32::from(reload);
        unsafe { write_volatile(TIM3_ARR, ticks - 1) };
    }

    fn set_output(&mut self, high: bool) {
        let bit = if high { 1 << BUZZER_PIN } else { 1 << (BUZZER_PIN + 16) };
        unsafe { write_volatile(reg(GPIOC, GPIO_BSRR), bit) };
    }
}
