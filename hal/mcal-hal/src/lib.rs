//! G0 MCAL low-level driver traits
//!
//! Every upper driver in `mcal-drivers` validates its arguments, tracks its
//! lifecycle and reports development errors, then hands the actual hardware
//! work to one of the traits defined here. A chip crate implements them
//! against its register map.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (mcal-firmware, etc.)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  mcal-drivers (PORT, DIO, GPT, ...)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  mcal-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │   mcal-hal-   │
//!             │    stm32g0    │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`port::PortArch`] - Pin configuration
//! - [`dio::DioArch`] - Runtime pin access
//! - [`gpt::GptArch`] - One-shot and continuous timer channels
//! - [`pwm::PwmArch`] - Pulse-width modulation channels
//! - [`mcu::McuArch`] - Clock tree, reset and power modes
//! - [`fls::FlsArch`] - Internal flash erase/program/read

#![no_std]
#![deny(unsafe_code)]

pub mod dio;
pub mod fls;
pub mod gpt;
pub mod mcu;
pub mod port;
pub mod pwm;

// Re-export key traits at crate root for convenience
pub use dio::DioArch;
pub use fls::{FlsArch, FlsArchError};
pub use gpt::GptArch;
pub use mcu::{McuArch, McuArchError};
pub use port::PortArch;
pub use pwm::{PwmArch, PwmEvents};
