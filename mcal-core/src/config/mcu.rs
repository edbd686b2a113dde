//! MCU configuration types

/// System clock source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// Internal 16 MHz oscillator
    Hsi16,
    /// PLL R output, fed from HSI16
    Pll,
}

/// PLL dividers: `f = 16 MHz / m * n / r`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllConfig {
    /// Input divider, 1-8
    pub m: u8,
    /// VCO multiplier, 8-86
    pub n: u8,
    /// R output divider, 2-8
    pub r: u8,
}

impl PllConfig {
    /// Check the dividers against the hardware ranges
    pub const fn is_valid(&self) -> bool {
        self.m >= 1 && self.m <= 8 && self.n >= 8 && self.n <= 86 && self.r >= 2 && self.r <= 8
    }

    /// Output frequency in Hz
    pub const fn output_hz(&self) -> u32 {
        16_000_000 / self.m as u32 * self.n as u32 / self.r as u32
    }
}

/// One selectable clock setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct McuClockConfig {
    pub source: ClockSource,
    /// Required when `source` is [`ClockSource::Pll`]
    pub pll: Option<PllConfig>,
    /// Flash wait states for the resulting frequency
    pub flash_latency: u8,
    /// RCC_IOPENR bits to set (GPIO clock gates)
    pub iop_enable: u32,
    /// RCC_APBENR1 bits to set
    pub apb1_enable: u32,
    /// RCC_APBENR2 bits to set
    pub apb2_enable: u32,
}

impl McuClockConfig {
    /// Check the setting is self-consistent
    pub const fn is_valid(&self) -> bool {
        match (self.source, self.pll) {
            (ClockSource::Pll, Some(pll)) => pll.is_valid(),
            (ClockSource::Pll, None) => false,
            (ClockSource::Hsi16, _) => true,
        }
    }
}

/// RAM region initialized by `init_ram_section`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct McuRamSection {
    base: usize,
    size: usize,
    default_value: u8,
}

impl McuRamSection {
    /// Describe a RAM region
    ///
    /// # Safety
    ///
    /// `base..base + size` must be writable RAM that no live Rust object
    /// occupies whenever `init_ram_section` is called for this section.
    #[allow(unsafe_code)]
    pub const unsafe fn new(base: usize, size: usize, default_value: u8) -> Self {
        Self {
            base,
            size,
            default_value,
        }
    }

    pub const fn base(&self) -> usize {
        self.base
    }

    pub const fn size(&self) -> usize {
        self.size
    }

    pub const fn default_value(&self) -> u8 {
        self.default_value
    }
}

/// Power mode selectable with `set_mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum McuMode {
    Run,
    Sleep,
    Stop,
}

/// PLL lock state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllStatus {
    Locked,
    Unlocked,
    /// Driver not initialized
    Undefined,
}

/// Cause of the last reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetReason {
    PowerOn,
    Watchdog,
    Software,
    Pin,
    LowPower,
    OptionByte,
    Undefined,
}

/// Content state of RAM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RamState {
    Invalid,
    Valid,
}

/// MCU driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct McuConfig<'a> {
    /// Clock settings, selected by index
    pub clock_settings: &'a [McuClockConfig],
    /// RAM sections, selected by index
    pub ram_sections: &'a [McuRamSection],
    /// Power modes, selected by index
    pub modes: &'a [McuMode],
}
