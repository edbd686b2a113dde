//! Clock tree, reset and power modes

use mcal_core::config::{McuClockConfig, McuMode, McuRamSection, ResetReason};

/// Errors from MCU hardware operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum McuArchError {
    /// The PLL did not stop within the polling limit
    PllTimeout,
    /// The requested clock setting cannot be programmed
    InvalidClock,
    /// SYSCLK did not leave the PLL within the polling limit
    ClockSwitchTimeout,
}

/// Drives the reset and clock controller
pub trait McuArch {
    /// Program flash latency, peripheral clock gates and the PLL
    ///
    /// Starts the PLL but does not wait for it to lock.
    fn init_clock(&mut self, clock: &McuClockConfig) -> Result<(), McuArchError>;

    /// Switch the system clock to the PLL output
    fn distribute_pll_clock(&mut self);

    fn pll_locked(&self) -> bool;

    /// Raw reset flags
    fn reset_raw_value(&self) -> u32;

    /// Decoded reset cause
    fn reset_reason(&self) -> ResetReason;

    /// Clear the latched reset flags
    fn clear_reset_flags(&mut self);

    /// Fill a RAM section with its default value
    fn init_ram_section(&mut self, section: &McuRamSection);

    /// Request a system reset
    fn perform_reset(&mut self);

    fn set_mode(&mut self, mode: McuMode);
}
