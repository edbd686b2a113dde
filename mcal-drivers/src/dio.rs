//! DIO driver
//!
//! Reads and drives pins configured by PORT. DIO has no lifecycle of its
//! own: the configuration only lists which channels, ports and channel
//! groups may be addressed. Every service takes `&self`, so the driver
//! can be shared with interrupt handlers.

use core::convert::Infallible;

use mcal_core::config::{ChannelGroup, ChannelId, DioConfig, PortId};
#[cfg(feature = "version-info-api")]
use mcal_core::VersionInfo;
use mcal_core::{Det, Level};
use mcal_hal::DioArch;

use crate::report_error;

pub const MODULE_ID: u16 = 120;

/// Service ids
pub mod api {
    pub const READ_CHANNEL: u8 = 0x00;
    pub const WRITE_CHANNEL: u8 = 0x01;
    pub const READ_PORT: u8 = 0x02;
    pub const WRITE_PORT: u8 = 0x03;
    pub const READ_CHANNEL_GROUP: u8 = 0x04;
    pub const WRITE_CHANNEL_GROUP: u8 = 0x05;
    pub const FLIP_CHANNEL: u8 = 0x11;
    pub const GET_VERSION_INFO: u8 = 0x12;
    pub const MASKED_WRITE_PORT: u8 = 0x13;
}

/// Development error codes
pub mod error {
    pub const PARAM_INVALID_CHANNEL_ID: u8 = 0x0A;
    pub const PARAM_INVALID_PORT_ID: u8 = 0x14;
    pub const PARAM_INVALID_GROUP: u8 = 0x1F;
    pub const PARAM_POINTER: u8 = 0x20;
}

/// DIO driver
pub struct Dio<'a, A, D: ?Sized> {
    arch: A,
    det: &'a D,
    config: &'a DioConfig<'a>,
}

impl<'a, A: DioArch, D: Det + ?Sized> Dio<'a, A, D> {
    pub fn new(arch: A, config: &'a DioConfig<'a>, det: &'a D) -> Self {
        Self { arch, det, config }
    }

    /// Port and pin of a configured channel
    fn channel(&self, api_id: u8, channel: ChannelId) -> Option<(PortId, u8)> {
        match channel.port() {
            Some(port) if self.config.has_channel(channel) => Some((port, channel.pin())),
            _ => {
                report_error(self.det, MODULE_ID, api_id, error::PARAM_INVALID_CHANNEL_ID);
                None
            }
        }
    }

    fn port(&self, api_id: u8, port: PortId) -> Option<PortId> {
        if self.config.has_port(port) {
            Some(port)
        } else {
            report_error(self.det, MODULE_ID, api_id, error::PARAM_INVALID_PORT_ID);
            None
        }
    }

    fn group<'g>(&self, api_id: u8, group: Option<&'g ChannelGroup>) -> Option<&'g ChannelGroup> {
        let Some(group) = group else {
            report_error(self.det, MODULE_ID, api_id, error::PARAM_POINTER);
            return None;
        };
        if group.is_well_formed() && self.config.has_group(group) {
            Some(group)
        } else {
            report_error(self.det, MODULE_ID, api_id, error::PARAM_INVALID_GROUP);
            None
        }
    }

    /// Input level of `channel`; `Low` for an invalid channel
    pub fn read_channel(&self, channel: ChannelId) -> Level {
        self.channel(api::READ_CHANNEL, channel)
            .map_or(Level::Low, |(port, pin)| self.arch.read_channel(port, pin))
    }

    pub fn write_channel(&self, channel: ChannelId, level: Level) {
        if let Some((port, pin)) = self.channel(api::WRITE_CHANNEL, channel) {
            self.arch.write_channel(port, pin, level);
        }
    }

    /// Toggle `channel`, returning the level seen before the toggle
    pub fn flip_channel(&self, channel: ChannelId) -> Level {
        self.channel(api::FLIP_CHANNEL, channel)
            .map_or(Level::Low, |(port, pin)| self.arch.flip_channel(port, pin))
    }

    /// Whole input word of `port`; 0 for an invalid port
    pub fn read_port(&self, port: PortId) -> u32 {
        self.port(api::READ_PORT, port)
            .map_or(0, |port| self.arch.read_port(port))
    }

    pub fn write_port(&self, port: PortId, level: u32) {
        if let Some(port) = self.port(api::WRITE_PORT, port) {
            self.arch.write_port(port, level);
        }
    }

    /// Group bits, shifted down to bit 0; 0 for an invalid group
    pub fn read_channel_group(&self, group: Option<&ChannelGroup>) -> u32 {
        self.group(api::READ_CHANNEL_GROUP, group)
            .map_or(0, |group| self.arch.read_channel_group(group))
    }

    pub fn write_channel_group(&self, group: Option<&ChannelGroup>, level: u32) {
        if let Some(group) = self.group(api::WRITE_CHANNEL_GROUP, group) {
            self.arch.write_channel_group(group, level);
        }
    }

    /// Change only the bits of `port` selected by `mask`
    pub fn masked_write_port(&self, port: PortId, level: u32, mask: u32) {
        if let Some(port) = self.port(api::MASKED_WRITE_PORT, port) {
            self.arch.masked_write_port(port, level, mask);
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

    /// `embedded-hal` handle for one channel
    pub fn pin(&self, channel: ChannelId) -> DioPin<'_, 'a, A, D> {
        DioPin { dio: self, channel }
    }
}

/// One DIO channel as an `embedded-hal` digital pin
///
/// Invalid channels are reported to the DET like any other DIO call; the
/// pin operations themselves never fail.
pub struct DioPin<'d, 'a, A, D: ?Sized> {
    dio: &'d Dio<'a, A, D>,
    channel: ChannelId,
}

impl<A, D: ?Sized> DioPin<'_, '_, A, D> {
    pub fn channel(&self) -> ChannelId {
        self.channel
    }
}

impl<A: DioArch, D: Det + ?Sized> embedded_hal::digital::ErrorType for DioPin<'_, '_, A, D> {
    type Error = Infallible;
}

impl<A: DioArch, D: Det + ?Sized> embedded_hal::digital::OutputPin for DioPin<'_, '_, A, D> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.dio.write_channel(self.channel, Level::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.dio.write_channel(self.channel, Level::High);
        Ok(())
    }
}

impl<A: DioArch, D: Det + ?Sized> embedded_hal::digital::StatefulOutputPin
    for DioPin<'_, '_, A, D>
{
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        let level = self
            .dio
            .channel(api::READ_CHANNEL, self.channel)
            .map_or(Level::Low, |(port, pin)| self.dio.arch.read_output_channel(port, pin));
        Ok(level.is_high())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        self.is_set_high().map(|high| !high)
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.dio.flip_channel(self.channel);
        Ok(())
    }
}

impl<A: DioArch, D: Det + ?Sized> embedded_hal::digital::InputPin for DioPin<'_, '_, A, D> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.dio.read_channel(self.channel).is_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.dio.read_channel(self.channel).is_high())
    }
}
