//! DIO configuration types

use super::port::{PortId, PINS_PER_PORT};

/// DIO channel identifier, encoded `port << 4 | pin`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(pub u16);

impl ChannelId {
    /// Channel of `pin` on `port`
    pub const fn new(port: PortId, pin: u8) -> Self {
        Self(((port as u16) << 4) | (pin as u16 & 0x0F))
    }

    /// Port index encoded in the identifier
    pub const fn port_index(self) -> u16 {
        self.0 >> 4
    }

    /// Port of the channel, if the identifier names an existing port
    pub const fn port(self) -> Option<PortId> {
        if self.0 >> 4 > u8::MAX as u16 {
            return None;
        }
        PortId::from_index((self.0 >> 4) as u8)
    }

    /// Pin number inside the port
    pub const fn pin(self) -> u8 {
        (self.0 & 0x0F) as u8
    }
}

/// Contiguous subfield of a port's bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelGroup {
    pub port: PortId,
    /// Bits of the group, in port bit positions
    pub mask: u32,
    /// Position of the lowest group bit
    pub offset: u8,
}

impl ChannelGroup {
    /// Group of `width` bits starting at `offset`
    ///
    /// `None` when the group is empty or does not fit in one port.
    pub const fn new(port: PortId, offset: u8, width: u8) -> Option<Self> {
        if width == 0 || offset >= PINS_PER_PORT || width > PINS_PER_PORT - offset {
            return None;
        }
        Some(Self {
            port,
            mask: ((1u32 << width) - 1) << offset,
            offset,
        })
    }

    /// Check the mask is non-empty, starts at `offset` and fits the port
    pub const fn is_well_formed(&self) -> bool {
        self.mask != 0
            && self.offset < PINS_PER_PORT
            && self.mask.trailing_zeros() == self.offset as u32
            && self.mask >> PINS_PER_PORT == 0
    }
}

/// DIO driver configuration
///
/// DIO has no initialization of its own: pin modes come from PORT. The
/// configuration only lists which identifiers callers may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DioConfig<'a> {
    pub ports: &'a [PortId],
    pub channels: &'a [ChannelId],
    pub groups: &'a [ChannelGroup],
}

impl DioConfig<'_> {
    /// Check if `channel` is configured
    pub fn has_channel(&self, channel: ChannelId) -> bool {
        self.channels.contains(&channel)
    }

    /// Check if `port` is configured
    pub fn has_port(&self, port: PortId) -> bool {
        self.ports.contains(&port)
    }

    /// Check if `group` is one of the configured groups
    pub fn has_group(&self, group: &ChannelGroup) -> bool {
        self.groups.contains(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_encoding() {
        let pa7 = ChannelId::new(PortId::A, 7);
        assert_eq!(pa7.0, 0x07);
        let pd3 = ChannelId::new(PortId::D, 3);
        assert_eq!(pd3.0, 0x33);
        assert_eq!(pd3.port(), Some(PortId::D));
        assert_eq!(pd3.pin(), 3);
        assert_eq!(ChannelId(0x70).port(), None);
    }

    #[test]
    fn test_channel_group_shape() {
        let group = ChannelGroup::new(PortId::B, 4, 3).unwrap();
        assert_eq!(group.mask, 0x70);
        assert!(group.is_well_formed());

        let shifted = ChannelGroup {
            port: PortId::B,
            mask: 0x70,
            offset: 2,
        };
        assert!(!shifted.is_well_formed());
    }

    #[test]
    fn test_channel_group_must_fit_port() {
        assert_eq!(ChannelGroup::new(PortId::A, 32, 1), None);
        assert_eq!(ChannelGroup::new(PortId::A, 16, 1), None);
        assert_eq!(ChannelGroup::new(PortId::A, 15, 2), None);
        assert_eq!(ChannelGroup::new(PortId::A, 3, 0), None);

        let top = ChannelGroup::new(PortId::A, 15, 1).unwrap();
        assert_eq!(top.mask, 0x8000);
        let whole = ChannelGroup::new(PortId::C, 0, 16).unwrap();
        assert_eq!(whole.mask, 0xFFFF);
        assert!(top.is_well_formed() && whole.is_well_formed());
    }
}
