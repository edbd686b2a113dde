//! G0 MCAL upper drivers
//!
//! One driver per peripheral class, each generic over its `mcal-hal`
//! arch trait and a [`Det`] sink:
//!
//! - [`port::Port`] - Pin configuration
//! - [`dio::Dio`] - Runtime pin access, plus `embedded-hal` pin handles
//! - [`gpt::Gpt`] - Timer channels with interrupt notifications
//! - [`pwm::Pwm`] - PWM channels and power states
//! - [`mcu::Mcu`] - Clocks, RAM sections, reset and power modes
//! - [`fls::Fls`] - Asynchronous internal flash jobs
//!
//! Drivers check the lifecycle and every argument before touching
//! hardware. A rejected call is reported to the DET and returns
//! [`NotOk`](mcal_core::NotOk) or a neutral value; it never panics.
//! Optional services are Cargo features, all enabled by default.

#![no_std]
#![deny(unsafe_code)]

pub mod dio;
pub mod fls;
pub mod gpt;
pub mod mcu;
pub mod port;
pub mod pwm;

use mcal_core::Det;
#[cfg(feature = "version-info-api")]
use mcal_core::VersionInfo;

/// Instance id of every report; each driver exists once
pub const INSTANCE_ID: u8 = 0;

/// Report a development error when error detection is enabled
#[inline]
pub(crate) fn report_error<D: Det + ?Sized>(det: &D, module_id: u16, api_id: u8, error_id: u8) {
    #[cfg(feature = "dev-error-detect")]
    {
        let _ = det.report_error(module_id, INSTANCE_ID, api_id, error_id);
    }
    #[cfg(not(feature = "dev-error-detect"))]
    {
        let _ = (det, module_id, api_id, error_id);
    }
}

/// Report a runtime error
#[inline]
pub(crate) fn report_runtime_error<D: Det + ?Sized>(
    det: &D,
    module_id: u16,
    api_id: u8,
    error_id: u8,
) {
    let _ = det.report_runtime_error(module_id, INSTANCE_ID, api_id, error_id);
}

/// Fill `out` with the version of `module_id`, or report `error_id`
#[cfg(feature = "version-info-api")]
pub(crate) fn write_version_info<D: Det + ?Sized>(
    det: &D,
    module_id: u16,
    api_id: u8,
    error_id: u8,
    out: Option<&mut VersionInfo>,
) {
    match out {
        Some(out) => *out = VersionInfo::for_module(module_id),
        None => report_error(det, module_id, api_id, error_id),
    }
}
