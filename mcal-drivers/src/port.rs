//! PORT driver
//!
//! Applies the pin configuration table once at start-up and offers the
//! runtime services the table allows: direction and mode changes on
//! changeable pins, and a periodic refresh of fixed directions.
//!
//! The `pin` argument of every service is an index into
//! [`PortConfig::pins`].

use mcal_core::config::{PinDirection, PinMode, PortConfig, PortPinConfig};
#[cfg(feature = "version-info-api")]
use mcal_core::VersionInfo;
use mcal_core::{Det, HwUnit, NotOk, StdReturn};
use mcal_hal::PortArch;

use crate::report_error;

pub const MODULE_ID: u16 = 124;

/// Service ids
pub mod api {
    pub const INIT: u8 = 0x00;
    pub const SET_PIN_DIRECTION: u8 = 0x01;
    pub const REFRESH_PORT_DIRECTION: u8 = 0x02;
    pub const GET_VERSION_INFO: u8 = 0x03;
    pub const SET_PIN_MODE: u8 = 0x04;
}

/// Development error codes
pub mod error {
    pub const PARAM_PIN: u8 = 0x0A;
    pub const DIRECTION_UNCHANGEABLE: u8 = 0x0B;
    pub const INIT_FAILED: u8 = 0x0C;
    pub const PARAM_INVALID_MODE: u8 = 0x0D;
    pub const MODE_UNCHANGEABLE: u8 = 0x0E;
    pub const UNINIT: u8 = 0x0F;
    pub const PARAM_POINTER: u8 = 0x10;
    pub const ALREADY_INITIALIZED: u8 = 0x11;
}

/// Index of a pin in the configuration table
pub type PortPinIndex = u16;

/// PORT driver
pub struct Port<'a, A, D: ?Sized> {
    arch: A,
    det: &'a D,
    unit: HwUnit<'a, PortConfig<'a>>,
}

impl<'a, A: PortArch, D: Det + ?Sized> Port<'a, A, D> {
    pub fn new(arch: A, det: &'a D) -> Self {
        Self {
            arch,
            det,
            unit: HwUnit::new(),
        }
    }

    fn report<T>(&self, api_id: u8, error_id: u8) -> Result<T, NotOk> {
        report_error(self.det, MODULE_ID, api_id, error_id);
        Err(NotOk)
    }

    /// Configured record of `pin`, reporting the usual errors
    fn pin_config(&self, api_id: u8, pin: PortPinIndex) -> Result<&'a PortPinConfig, NotOk> {
        let Some(config) = self.unit.config() else {
            return self.report(api_id, error::UNINIT);
        };
        match config.pins.get(usize::from(pin)) {
            Some(record) => Ok(record),
            None => self.report(api_id, error::PARAM_PIN),
        }
    }

    /// Configure every pin of `config`
    ///
    /// `None` reports `INIT_FAILED` and changes nothing.
    pub fn init(&mut self, config: Option<&'a PortConfig<'a>>) -> StdReturn {
        let Some(config) = config else {
            return self.report(api::INIT, error::INIT_FAILED);
        };
        if self.unit.init(config).is_err() {
            return self.report(api::INIT, error::ALREADY_INITIALIZED);
        }
        for pin in config.pins {
            self.arch.init_pin(pin);
        }
        Ok(())
    }

    pub fn is_init(&self) -> bool {
        self.unit.is_init()
    }

    #[cfg(feature = "port-set-pin-direction-api")]
    pub fn set_pin_direction(&mut self, pin: PortPinIndex, direction: PinDirection) -> StdReturn {
        let record = self.pin_config(api::SET_PIN_DIRECTION, pin)?;
        if !record.direction_changeable {
            return self.report(api::SET_PIN_DIRECTION, error::DIRECTION_UNCHANGEABLE);
        }
        self.arch.set_pin_direction(record, direction);
        Ok(())
    }

    /// Re-assert the direction of fixed-direction digital pins
    pub fn refresh_port_direction(&mut self) -> StdReturn {
        let Some(config) = self.unit.config() else {
            return self.report(api::REFRESH_PORT_DIRECTION, error::UNINIT);
        };
        for pin in config.pins {
            if !pin.direction_changeable && pin.mode.is_digital_io() {
                self.arch.refresh_pin_direction(pin);
            }
        }
        Ok(())
    }

    #[cfg(feature = "port-set-pin-mode-api")]
    pub fn set_pin_mode(&mut self, pin: PortPinIndex, mode: PinMode) -> StdReturn {
        let record = self.pin_config(api::SET_PIN_MODE, pin)?;
        if !record.mode_changeable {
            return self.report(api::SET_PIN_MODE, error::MODE_UNCHANGEABLE);
        }
        if !mode.is_valid() {
            return self.report(api::SET_PIN_MODE, error::PARAM_INVALID_MODE);
        }
        self.arch
            .set_pin_mode(record, mode.kind(), mode.alternate_function());
        Ok(())
    }

    #[cfg(feature = "version-info-api")]
    pub fn get_version_info(&self, out: Option<&mut VersionInfo>) {
        crate::write_version_info(
            self.det,
            MODULE_ID,
            api::GET_VERSION_INFO,
            error::PARAM_POINTER,
            out,
        );
    }
}
