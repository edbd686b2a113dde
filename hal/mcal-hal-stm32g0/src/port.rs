//! PORT arch: GPIO configuration registers

use mcal_core::config::{PinDirection, PortId, PortPinConfig, PORT_COUNT};
use mcal_core::Bfx;
use mcal_hal::PortArch;

use crate::regs::{GpioRegisters, Reg};

/// Configures pins through the GPIO configuration view
pub struct Stm32g0Port<'r> {
    gpio: [&'r GpioRegisters; PORT_COUNT],
}

impl Stm32g0Port<'static> {
    /// # Safety
    ///
    /// Only valid on the target.
    pub unsafe fn steal() -> Self {
        Self::new(PortId::ALL.map(|port| unsafe { GpioRegisters::steal(port) }))
    }
}

impl<'r> Stm32g0Port<'r> {
    /// Register blocks indexed by [`PortId`]
    pub fn new(gpio: [&'r GpioRegisters; PORT_COUNT]) -> Self {
        Self { gpio }
    }

    fn regs(&self, pin: &PortPinConfig) -> &'r GpioRegisters {
        self.gpio[pin.pin.port().index()]
    }

    fn write_mode(&self, pin: &PortPinConfig, kind: u8) {
        let regs = self.regs(pin);
        let number = pin.pin.pin();
        regs.moder.modify(|v| v.put_bits(2 * number, 2, u32::from(kind & 0x03)));
    }

    fn write_alternate(&self, pin: &PortPinConfig, alternate: u8) {
        let regs = self.regs(pin);
        let number = pin.pin.pin();
        let (reg, lane): (&Reg, u8) = if number < 8 {
            (&regs.afrl, number)
        } else {
            (&regs.afrh, number - 8)
        };
        reg.modify(|v| v.put_bits(4 * lane, 4, u32::from(alternate)));
    }
}

impl PortArch for Stm32g0Port<'_> {
    fn init_pin(&mut self, pin: &PortPinConfig) {
        let regs = self.regs(pin);
        let number = pin.pin.pin();

        regs.pupdr.modify(|v| v.put_bits(2 * number, 2, pin.pull as u32));
        regs.otyper.modify(|v| v.put_bit(number, pin.output_drive as u8 != 0));
        regs.ospeedr.modify(|v| v.put_bits(2 * number, 2, pin.speed as u32));
        self.write_mode(pin, pin.mode.kind());
        self.write_alternate(pin, pin.mode.alternate_function());
    }

    fn set_pin_direction(&mut self, pin: &PortPinConfig, direction: PinDirection) {
        self.write_mode(pin, direction as u8);
    }

    fn set_pin_mode(&mut self, pin: &PortPinConfig, kind: u8, alternate: u8) {
        self.write_mode(pin, kind);
        self.write_alternate(pin, alternate);
    }

    fn refresh_pin_direction(&mut self, pin: &PortPinConfig) {
        self.write_mode(pin, pin.mode.kind());
    }
}
