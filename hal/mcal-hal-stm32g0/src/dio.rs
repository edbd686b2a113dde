//! DIO arch: GPIO data registers

use mcal_core::config::{ChannelGroup, PortId, PORT_COUNT};
use mcal_core::{Bfx, Level};
use mcal_hal::DioArch;

use crate::regs::{DioRegisters, GpioRegisters};

/// Data registers occupy the low half-word of each port
const PORT_MASK: u32 = 0xFFFF;
/// BSRR reset bits start here
const BSRR_RESET_SHIFT: u8 = 16;

/// Accesses pins through the GPIO data view
pub struct Stm32g0Dio<'r> {
    gpio: [&'r DioRegisters; PORT_COUNT],
}

impl Stm32g0Dio<'static> {
    /// # Safety
    ///
    /// Only valid on the target.
    pub unsafe fn steal() -> Self {
        Self::new(PortId::ALL.map(|port| unsafe { GpioRegisters::steal(port) }.as_dio()))
    }
}

impl<'r> Stm32g0Dio<'r> {
    /// Register blocks indexed by [`PortId`]
    pub fn new(gpio: [&'r DioRegisters; PORT_COUNT]) -> Self {
        Self { gpio }
    }

    /// Data views over configuration-view blocks
    pub fn from_gpio(gpio: [&'r GpioRegisters; PORT_COUNT]) -> Self {
        Self::new(gpio.map(GpioRegisters::as_dio))
    }

    fn regs(&self, port: PortId) -> &'r DioRegisters {
        self.gpio[port.index()]
    }
}

impl DioArch for Stm32g0Dio<'_> {
    fn read_channel(&self, port: PortId, pin: u8) -> Level {
        self.regs(port).idr.read().get_bit(pin).into()
    }

    fn write_channel(&self, port: PortId, pin: u8, level: Level) {
        self.regs(port).odr.modify(|v| v.put_bit(pin, level.is_high()));
    }

    fn read_output_channel(&self, port: PortId, pin: u8) -> Level {
        self.regs(port).odr.read().get_bit(pin).into()
    }

    fn flip_channel(&self, port: PortId, pin: u8) -> Level {
        let regs = self.regs(port);
        let before = Level::from(regs.idr.read().get_bit(pin));
        let bit = match before {
            Level::Low => pin,
            Level::High => pin + BSRR_RESET_SHIFT,
        };
        regs.bsrr.write(1 << bit);
        before
    }

    fn read_port(&self, port: PortId) -> u32 {
        self.regs(port).idr.read()
    }

    fn write_port(&self, port: PortId, level: u32) {
        self.regs(port).odr.write(level);
    }

    fn read_channel_group(&self, group: &ChannelGroup) -> u32 {
        (self.regs(group.port).idr.read() & group.mask) >> group.offset
    }

    fn write_channel_group(&self, group: &ChannelGroup, level: u32) {
        self.regs(group.port)
            .odr
            .modify(|v| v.put_bits_mask(level << group.offset, group.mask));
    }

    fn masked_write_port(&self, port: PortId, level: u32, mask: u32) {
        let mask = mask & PORT_MASK;
        let set = level & mask;
        let reset = !level & mask;
        self.regs(port).bsrr.write(set | (reset << BSRR_RESET_SHIFT));
    }
}
