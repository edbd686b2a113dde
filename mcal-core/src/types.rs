//! Platform and standard types
//!
//! Fixed-width vocabulary shared by every module. The target is a 32-bit,
//! little-endian, LSB-first Cortex-M0+.

/// Unsigned 8-bit integer
pub type Uint8 = u8;
/// Unsigned 16-bit integer
pub type Uint16 = u16;
/// Unsigned 32-bit integer
pub type Uint32 = u32;
/// Unsigned 64-bit integer
pub type Uint64 = u64;
/// Signed 8-bit integer
pub type Sint8 = i8;
/// Signed 16-bit integer
pub type Sint16 = i16;
/// Signed 32-bit integer
pub type Sint32 = i32;
/// Signed 64-bit integer
pub type Sint64 = i64;
/// Single-precision float
pub type Float32 = f32;
/// Double-precision float
pub type Float64 = f64;

/// Register width of the CPU in bits
pub const CPU_TYPE: u8 = 32;

/// Bit ordering inside a register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

/// Byte ordering in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteOrder {
    HighByteFirst,
    LowByteFirst,
}

pub const CPU_BIT_ORDER: BitOrder = BitOrder::LsbFirst;
pub const CPU_BYTE_ORDER: ByteOrder = ByteOrder::LowByteFirst;

/// Numeric code of a successful standard return
pub const E_OK: u8 = 0;
/// Numeric code of a failed standard return
pub const E_NOT_OK: u8 = 1;

/// Failure half of [`StdReturn`]
///
/// Carries no payload: the reason has already been reported to the DET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NotOk;

/// Standard return of every fallible driver entry point (`E_OK` / `E_NOT_OK`)
pub type StdReturn = Result<(), NotOk>;

/// Convert a standard return into its numeric code
pub fn std_return_code(result: StdReturn) -> u8 {
    match result {
        Ok(()) => E_OK,
        Err(NotOk) => E_NOT_OK,
    }
}

/// Logic level of a pin (`STD_LOW` / `STD_HIGH`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Level {
    #[default]
    Low = 0,
    High = 1,
}

impl Level {
    /// Check if the level is high
    pub fn is_high(self) -> bool {
        self == Level::High
    }

    /// The opposite level
    pub fn flipped(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

/// Module version record filled in by every `get_version_info`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VersionInfo {
    pub vendor_id: u16,
    pub module_id: u16,
    pub sw_major_version: u8,
    pub sw_minor_version: u8,
    pub sw_patch_version: u8,
}

/// Vendor id used by every module of this MCAL
pub const VENDOR_ID: u16 = 0x00FE;

impl VersionInfo {
    /// Version record for a module of this MCAL
    pub const fn for_module(module_id: u16) -> Self {
        Self {
            vendor_id: VENDOR_ID,
            module_id,
            sw_major_version: 1,
            sw_minor_version: 0,
            sw_patch_version: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_return_codes() {
        assert_eq!(std_return_code(Ok(())), 0);
        assert_eq!(std_return_code(Err(NotOk)), 1);
    }

    #[test]
    fn test_level_conversions() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from(false), Level::Low);
        assert!(bool::from(Level::High));
        assert_eq!(Level::Low.flipped(), Level::High);
        assert_eq!(Level::High as u8, 1);
    }

    #[test]
    fn test_version_info_for_module() {
        let info = VersionInfo::for_module(124);
        assert_eq!(info.module_id, 124);
        assert_eq!(info.vendor_id, VENDOR_ID);
        assert_eq!(info.sw_major_version, 1);
    }
}
