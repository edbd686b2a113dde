//! Pin configuration

use mcal_core::config::{PinDirection, PortPinConfig};

/// Writes pin configuration registers
///
/// Implementations only touch the registers of the pin they are given and
/// never validate; the PORT driver has done that already.
pub trait PortArch {
    /// Apply the full configuration of one pin
    ///
    /// Register write order is pull, output type, speed, mode, then the
    /// alternate function.
    fn init_pin(&mut self, pin: &PortPinConfig);

    /// Switch a pin between input and output
    fn set_pin_direction(&mut self, pin: &PortPinConfig, direction: PinDirection);

    /// Set the mode field to `kind` and the alternate function to `alternate`
    fn set_pin_mode(&mut self, pin: &PortPinConfig, kind: u8, alternate: u8);

    /// Write the configured mode back into the mode field
    fn refresh_pin_direction(&mut self, pin: &PortPinConfig);
}
