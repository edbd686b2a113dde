//! MCU driver
//!
//! Clock settings, RAM sections and power modes are selected by their
//! index in the configuration. The reset cause is latched at `init` and
//! the hardware flags are cleared, so it survives only until the next
//! reset.

use mcal_core::config::{McuConfig, PllStatus, RamState, ResetReason};
#[cfg(feature = "version-info-api")]
use mcal_core::VersionInfo;
use mcal_core::{Det, HwUnit, NotOk, StdReturn};
use mcal_hal::{McuArch, McuArchError};

use crate::{report_error, report_runtime_error};

pub const MODULE_ID: u16 = 101;

/// Service ids
pub mod api {
    pub const INIT: u8 = 0x00;
    pub const INIT_RAM_SECTION: u8 = 0x01;
    pub const INIT_CLOCK: u8 = 0x02;
    pub const DISTRIBUTE_PLL_CLOCK: u8 = 0x03;
    pub const GET_PLL_STATUS: u8 = 0x04;
    pub const GET_RESET_REASON: u8 = 0x05;
    pub const GET_RESET_RAW_VALUE: u8 = 0x06;
    pub const PERFORM_RESET: u8 = 0x07;
    pub const SET_MODE: u8 = 0x08;
    pub const GET_VERSION_INFO: u8 = 0x09;
    pub const GET_RAM_STATE: u8 = 0x0A;
}

/// Development error codes
pub mod error {
    pub const PARAM_CONFIG: u8 = 0x0A;
    pub const PARAM_CLOCK: u8 = 0x0B;
    pub const PARAM_MODE: u8 = 0x0C;
    pub const PARAM_RAMSECTION: u8 = 0x0D;
    pub const PLL_NOT_LOCKED: u8 = 0x0E;
    pub const UNINIT: u8 = 0x0F;
    pub const PARAM_POINTER: u8 = 0x10;
    pub const INIT_FAILED: u8 = 0x11;
    pub const ALREADY_INITIALIZED: u8 = 0x12;
}

/// Raw reset value returned before `init`
pub const RESET_RAW_VALUE_UNDEFINED: u32 = 0xFFFF_FFFF;

pub type McuClockId = u8;
pub type McuRamSectionId = u8;
pub type McuModeId = u8;

/// MCU driver
pub struct Mcu<'a, A, D: ?Sized> {
    arch: A,
    det: &'a D,
    unit: HwUnit<'a, McuConfig<'a>>,
    reset_raw: u32,
    reset_reason: ResetReason,
}

impl<'a, A: McuArch, D: Det + ?Sized> Mcu<'a, A, D> {
    pub fn new(arch: A, det: &'a D) -> Self {
        Self {
            arch,
            det,
            unit: HwUnit::new(),
            reset_raw: RESET_RAW_VALUE_UNDEFINED,
            reset_reason: ResetReason::Undefined,
        }
    }

    fn report<T>(&self, api_id: u8, error_id: u8) -> Result<T, NotOk> {
        report_error(self.det, MODULE_ID, api_id, error_id);
        Err(NotOk)
    }

    fn config(&self, api_id: u8) -> Result<&'a McuConfig<'a>, NotOk> {
        match self.unit.config() {
            Some(config) => Ok(config),
            None => self.report(api_id, error::UNINIT),
        }
    }

    /// Latch the reset cause and clear the hardware reset flags
    pub fn init(&mut self, config: Option<&'a McuConfig<'a>>) -> StdReturn {
        let Some(config) = config else {
            return self.report(api::INIT, error::INIT_FAILED);
        };
        if self.unit.init(config).is_err() {
            return self.report(api::INIT, error::ALREADY_INITIALIZED);
        }
        self.reset_raw = self.arch.reset_raw_value();
        self.reset_reason = self.arch.reset_reason();
        self.arch.clear_reset_flags();
        Ok(())
    }

    pub fn is_init(&self) -> bool {
        self.unit.is_init()
    }

    /// Fill RAM section `section` with its default value
    pub fn init_ram_section(&mut self, section: McuRamSectionId) -> StdReturn {
        let config = self.config(api::INIT_RAM_SECTION)?;
        let Some(section) = config.ram_sections.get(usize::from(section)) else {
            return self.report(api::INIT_RAM_SECTION, error::PARAM_RAMSECTION);
        };
        self.arch.init_ram_section(section);
        Ok(())
    }

    /// Apply clock setting `setting`
    ///
    /// A PLL setting starts the PLL; switch to it with
    /// [`Mcu::distribute_pll_clock`] once [`Mcu::get_pll_status`] reports
    /// it locked.
    pub fn init_clock(&mut self, setting: McuClockId) -> StdReturn {
        let config = self.config(api::INIT_CLOCK)?;
        let Some(clock) = config.clock_settings.get(usize::from(setting)) else {
            return self.report(api::INIT_CLOCK, error::PARAM_CLOCK);
        };
        match self.arch.init_clock(clock) {
            Ok(()) => Ok(()),
            Err(McuArchError::InvalidClock) => self.report(api::INIT_CLOCK, error::PARAM_CLOCK),
            Err(McuArchError::PllTimeout | McuArchError::ClockSwitchTimeout) => {
                report_runtime_error(self.det, MODULE_ID, api::INIT_CLOCK, error::PLL_NOT_LOCKED);
                Err(NotOk)
            }
        }
    }

    /// Switch the system clock to the PLL; refused while it is unlocked
    pub fn distribute_pll_clock(&mut self) -> StdReturn {
        self.config(api::DISTRIBUTE_PLL_CLOCK)?;
        if !self.arch.pll_locked() {
            return self.report(api::DISTRIBUTE_PLL_CLOCK, error::PLL_NOT_LOCKED);
        }
        self.arch.distribute_pll_clock();
        Ok(())
    }

    pub fn get_pll_status(&self) -> PllStatus {
        if self.config(api::GET_PLL_STATUS).is_err() {
            return PllStatus::Undefined;
        }
        if self.arch.pll_locked() {
            PllStatus::Locked
        } else {
            PllStatus::Unlocked
        }
    }

    /// Reset cause latched at `init`
    pub fn get_reset_reason(&self) -> ResetReason {
        match self.config(api::GET_RESET_REASON) {
            Ok(_) => self.reset_reason,
            Err(NotOk) => ResetReason::Undefined,
        }
    }

    /// Reset flags latched at `init`
    pub fn get_reset_raw_value(&self) -> u32 {
        match self.config(api::GET_RESET_RAW_VALUE) {
            Ok(_) => self.reset_raw,
            Err(NotOk) => RESET_RAW_VALUE_UNDEFINED,
        }
    }

    /// Request a system reset; does not return on the target
    pub fn perform_reset(&mut self) {
        if self.config(api::PERFORM_RESET).is_ok() {
            self.arch.perform_reset();
        }
    }

    /// Enter power mode `mode`; returns after wake-up
    pub fn set_mode(&mut self, mode: McuModeId) {
        let Ok(config) = self.config(api::SET_MODE) else {
            return;
        };
        match config.modes.get(usize::from(mode)) {
            Some(&mode) => self.arch.set_mode(mode),
            None => report_error(self.det, MODULE_ID, api::SET_MODE, error::PARAM_MODE),
        }
    }

    pub fn get_ram_state(&self) -> RamState {
        match self.config(api::GET_RAM_STATE) {
            Ok(_) => RamState::Valid,
            Err(NotOk) => RamState::Invalid,
        }
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
