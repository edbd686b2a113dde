//! FLS configuration types and memory-interface vocabulary

use super::Notification;

/// Driver status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlsStatus {
    Uninit,
    Idle,
    Busy,
    BusyInternal,
}

/// Result of the last job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JobResult {
    Ok,
    Failed,
    Pending,
    Canceled,
    BlockInconsistent,
    BlockInvalid,
}

/// Throughput mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlsMode {
    Slow,
    Fast,
}

/// FLS driver configuration
///
/// Addresses passed to the FLS API are offsets from `erase_start`.
#[derive(Debug, Clone, Copy)]
pub struct FlsConfig {
    /// Base address of the flash device
    pub memory_base: u32,
    /// Absolute address of the first sector managed by the driver
    pub erase_start: u32,
    /// Erase granule in bytes
    pub sector_size: u32,
    pub sector_count: u32,
    /// Program granule in bytes
    pub page_size: u32,
    /// Content of an erased byte
    pub erased_value: u8,
    pub max_read_fast: u32,
    pub max_read_slow: u32,
    pub max_write_fast: u32,
    pub max_write_slow: u32,
    pub default_mode: FlsMode,
    pub job_end_notification: Option<Notification>,
    pub job_error_notification: Option<Notification>,
}

impl FlsConfig {
    /// Size of the managed area in bytes
    pub const fn total_size(&self) -> u32 {
        self.sector_size * self.sector_count
    }

    /// Bytes read (or compared) per main-function cycle in `mode`
    pub const fn read_budget(&self, mode: FlsMode) -> u32 {
        match mode {
            FlsMode::Slow => self.max_read_slow,
            FlsMode::Fast => self.max_read_fast,
        }
    }

    /// Bytes written per main-function cycle in `mode`
    pub const fn write_budget(&self, mode: FlsMode) -> u32 {
        match mode {
            FlsMode::Slow => self.max_write_slow,
            FlsMode::Fast => self.max_write_fast,
        }
    }

    /// Check the geometry is usable
    pub const fn is_valid(&self) -> bool {
        self.sector_size != 0
            && self.sector_count != 0
            && self.page_size != 0
            && self.sector_size % self.page_size == 0
            && self.erase_start >= self.memory_base
            && self.max_read_fast != 0
            && self.max_read_slow != 0
            && self.max_write_fast >= self.page_size
            && self.max_write_slow >= self.page_size
    }
}
