//! STM32G0 implementation of the G0 MCAL low-level traits
//!
//! This crate owns every register access of the MCAL. It provides:
//!
//! - [`regs`] - the register map: volatile word cells grouped into
//!   `#[repr(C)]` blocks whose offsets are checked at compile time
//! - [`nvic`] - interrupt enable, pending and priority control
//! - One `mcal-hal` trait implementation per driver, each borrowing the
//!   register blocks it drives
//!
//! # Usage
//!
//! On the target, build each arch with its `steal()` constructor. Host
//! tests own register blocks in RAM and pass references to `new()`:
//!
//! ```
//! use mcal_core::config::{GptChannelConfig, GptMode, GptTimer};
//! use mcal_hal::GptArch;
//! use mcal_hal_stm32g0::gpt::Stm32g0Gpt;
//! use mcal_hal_stm32g0::regs::TimRegisters;
//!
//! let (tim6, tim7) = (TimRegisters::new(), TimRegisters::new());
//! let mut gpt = Stm32g0Gpt::new([&tim6, &tim7]);
//! let channel = GptChannelConfig {
//!     channel_id: 0,
//!     timer: GptTimer::Tim6,
//!     mode: GptMode::Continuous,
//!     prescaler: 0,
//!     notification: None,
//! };
//! gpt.start_timer(&channel, 0xF000);
//! assert_eq!(tim6.arr.read(), 0xF000);
//! ```

#![no_std]

pub mod dio;
pub mod fls;
pub mod gpt;
pub mod mcu;
pub mod nvic;
pub mod port;
pub mod pwm;
pub mod regs;

pub use dio::Stm32g0Dio;
pub use fls::Stm32g0Flash;
pub use gpt::Stm32g0Gpt;
pub use mcu::Stm32g0Mcu;
pub use nvic::Nvic;
pub use port::Stm32g0Port;
pub use pwm::Stm32g0Pwm;
