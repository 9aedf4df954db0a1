//! # Architecture Abstraction Layer
//!
//! Target-only code. `cortex_m4` holds the core-peripheral setup (SysTick,
//! NVIC priorities, idle); `board` implements the peripheral adapter traits
//! over STM32F411 registers.

pub mod board;
pub mod cortex_m4;
