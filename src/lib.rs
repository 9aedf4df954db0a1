//! # capmon: Room Capacity Monitor
//!
//! Firmware core for a small admission counter. An operator picks a
//! capacity limit with two buttons, a light sensor counts people walking
//! past it, and once the count passes the limit the device flashes "OVER"
//! and sounds a buzzer.
//!
//! ## Overview
//!
//! The work is split into three cooperative phase tasks that hand off to
//! each other through an event-flag group and a single-slot mailbox, the
//! way they would under a small RTOS:
//!
//! - **Setup**: shows the limit while the operator adjusts it, then posts it
//! - **Counting**: samples the sensor every 200 ms until the limit is passed
//! - **Alarm**: cycles the "OVER" glyphs and the alarm melody forever
//!
//! Button presses and the buzzer tone are handled in interrupt handlers
//! that share state with the tasks through critical sections and
//! single-word atomics.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │        Phase Tasks (phases/: setup, counting, alarm)    │
//! ├────────────────────────────────────────────────────────┤
//! │               Kernel API (kernel.rs)                    │
//! │      new() · create_task() · run_once() · run()        │
//! ├──────────────┬────────────────────┬───────────────────┤
//! │  Scheduler   │  Sync Fabric       │  Shared State     │
//! │  scheduler.rs│  flags.rs          │  state.rs         │
//! │  ─ step()    │  mailbox.rs        │  ─ admission      │
//! │  ─ cancel()  │  sync.rs           │  ─ tone, latch    │
//! ├──────────────┴────────────────────┴───────────────────┤
//! │   Task Model (task.rs) · Clock (time.rs) · ISRs (isr.rs)│
//! ├────────────────────────────────────────────────────────┤
//! │  Adapters (peripheral.rs, segment.rs, tone.rs)          │
//! ├────────────────────────────────────────────────────────┤
//! │  Arch Port (arch/: SysTick, NVIC, STM32F4 registers)    │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Memory Model
//!
//! - **No heap**: all state is statically allocated or lives on the main stack
//! - **Fixed-size TCB array**: `[TaskControlBlock; MAX_TASKS]`
//! - **Critical sections**: `critical-section` crate; the single-core
//!   Cortex-M implementation on target, the `std` one under `cargo test`
//!
//! Everything outside `arch` builds and tests on the host.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod flags;
pub mod isr;
pub mod kernel;
pub mod mailbox;
pub mod peripheral;
pub mod phases;
pub mod scheduler;
pub mod segment;
pub mod state;
pub mod sync;
pub mod task;
pub mod time;
pub mod tone;

#[cfg(target_arch = "arm")]
pub mod arch;

#[cfg(test)]
mod mock;
