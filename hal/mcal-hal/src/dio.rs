//! Runtime pin access
//!
//! All methods take `&self`: the data registers are the synchronization
//! point, so a DIO arch can be shared between thread and interrupt context.

use mcal_core::config::{ChannelGroup, PortId};
use mcal_core::Level;

/// Reads and writes GPIO data registers
pub trait DioArch {
    /// Input level of one pin
    fn read_channel(&self, port: PortId, pin: u8) -> Level;

    /// Drive one pin through the output data register
    fn write_channel(&self, port: PortId, pin: u8, level: Level);

    /// Level one pin is driven to by the output data register
    fn read_output_channel(&self, port: PortId, pin: u8) -> Level;

    /// Toggle one pin through the set/reset register
    ///
    /// Returns the input level observed before the toggle.
    fn flip_channel(&self, port: PortId, pin: u8) -> Level;

    /// Whole input data word of a port
    fn read_port(&self, port: PortId) -> u32;

    /// Replace the whole output data word of a port
    fn write_port(&self, port: PortId, level: u32);

    /// `(input & mask) >> offset`
    fn read_channel_group(&self, group: &ChannelGroup) -> u32;

    /// Write `level` into the group's bits of the output data register
    fn write_channel_group(&self, group: &ChannelGroup, level: u32);

    /// Change only the output bits selected by `mask`, in a single write
    fn masked_write_port(&self, port: PortId, level: u32, mask: u32);
}
