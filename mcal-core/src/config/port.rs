//! PORT configuration types

/// GPIO port of the STM32G0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PortId {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
}

/// Number of GPIO ports
pub const PORT_COUNT: usize = 6;

impl PortId {
    /// All ports, in register-map order
    pub const ALL: [PortId; PORT_COUNT] = [
        PortId::A,
        PortId::B,
        PortId::C,
        PortId::D,
        PortId::E,
        PortId::F,
    ];

    /// Port from its index (A = 0)
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(PortId::A),
            1 => Some(PortId::B),
            2 => Some(PortId::C),
            3 => Some(PortId::D),
            4 => Some(PortId::E),
            5 => Some(PortId::F),
            _ => None,
        }
    }

    /// Index of the port in the register map
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Pins per GPIO port
pub const PINS_PER_PORT: u8 = 16;

/// Physical pin of a PORT configuration record, encoded `port << 8 | pin`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortPin(u16);

impl PortPin {
    /// Encode a port/pin pair
    pub const fn new(port: PortId, pin: u8) -> Self {
        Self(((port as u16) << 8) | (pin as u16 & 0x0F))
    }

    /// Decode a raw identifier, rejecting unknown ports and pins
    pub const fn from_raw(raw: u16) -> Option<Self> {
        let pin = (raw & 0xFF) as u8;
        if pin >= PINS_PER_PORT {
            return None;
        }
        match PortId::from_index((raw >> 8) as u8) {
            Some(_) => Some(Self(raw)),
            None => None,
        }
    }

    /// Raw `port << 8 | pin` value
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Port of the pin
    pub const fn port(self) -> PortId {
        match PortId::from_index((self.0 >> 8) as u8) {
            Some(port) => port,
            None => PortId::A,
        }
    }

    /// Pin number inside the port (0-15)
    pub const fn pin(self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

/// Internal pull resistor (PUPDR encoding)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Pull {
    None = 0,
    Up = 1,
    Down = 2,
}

/// Output stage (OTYPER encoding)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OutputDrive {
    PushPull = 0,
    OpenDrain = 1,
}

/// Output slew rate (OSPEEDR encoding)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Speed {
    VeryLow = 0,
    Low = 1,
    High = 2,
    VeryHigh = 3,
}

/// Runtime pin direction (MODER encoding)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PinDirection {
    In = 0,
    Out = 1,
}

/// Pin mode byte
///
/// High nibble: mode kind written to MODER (0 = input, 1 = output,
/// 2 = alternate, 3 = analog). Low nibble: alternate function number,
/// only meaningful for alternate mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMode(pub u8);

/// Highest accepted mode kind (high nibble)
pub const PIN_MODE_KIND_MAX: u8 = 4;
/// Highest accepted alternate function (low nibble)
pub const PIN_ALTERNATE_MAX: u8 = 11;

impl PinMode {
    pub const INPUT: PinMode = PinMode(0x00);
    pub const OUTPUT: PinMode = PinMode(0x10);
    pub const ANALOG: PinMode = PinMode(0x30);

    /// Alternate function `af`
    pub const fn alternate(af: u8) -> Self {
        PinMode(0x20 | (af & 0x0F))
    }

    /// Mode kind (high nibble)
    pub const fn kind(self) -> u8 {
        self.0 >> 4
    }

    /// Alternate function number (low nibble)
    pub const fn alternate_function(self) -> u8 {
        self.0 & 0x0F
    }

    /// Check the nibbles against the accepted ranges
    pub const fn is_valid(self) -> bool {
        self.kind() <= PIN_MODE_KIND_MAX && self.alternate_function() <= PIN_ALTERNATE_MAX
    }

    /// Pure input or pure output mode
    pub const fn is_digital_io(self) -> bool {
        self.0 == Self::INPUT.0 || self.0 == Self::OUTPUT.0
    }
}

/// Configuration record of one pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortPinConfig {
    pub pin: PortPin,
    pub pull: Pull,
    pub output_drive: OutputDrive,
    pub speed: Speed,
    pub mode: PinMode,
    /// Direction may be changed at runtime
    pub direction_changeable: bool,
    /// Mode may be changed at runtime
    pub mode_changeable: bool,
}

impl PortPinConfig {
    /// Plain digital pin with fixed direction and mode
    pub const fn new(pin: PortPin, mode: PinMode) -> Self {
        Self {
            pin,
            pull: Pull::None,
            output_drive: OutputDrive::PushPull,
            speed: Speed::VeryLow,
            mode,
            direction_changeable: false,
            mode_changeable: false,
        }
    }
}

/// PORT driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortConfig<'a> {
    /// Pin records; the PORT API addresses pins by index into this slice
    pub pins: &'a [PortPinConfig],
}
