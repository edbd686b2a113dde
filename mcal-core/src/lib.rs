//! Board-agnostic core of the G0 MCAL
//!
//! This crate contains everything the drivers share that does not touch
//! hardware:
//!
//! - Platform types and the standard return vocabulary
//! - Bit-field operations (Bfx)
//! - CRC computation
//! - The Default Error Tracer interface and sinks
//! - The hardware-unit lifecycle object
//! - Configuration type definitions for every driver

#![no_std]
#![deny(unsafe_code)]

pub mod bfx;
pub mod config;
pub mod crc;
pub mod det;
pub mod state;
pub mod types;

pub use bfx::{Bfx, BfxSigned};
pub use det::{Det, DetConfig, DetReport, ReportKind};
pub use state::{DriverState, HwUnit, LifecycleError};
pub use types::{Level, NotOk, StdReturn, VersionInfo, E_NOT_OK, E_OK};
