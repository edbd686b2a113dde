//! GPT configuration types

use super::Notification;

/// Timer peripheral backing a GPT channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum GptTimer {
    Tim6 = 0,
    Tim7 = 1,
}

/// Number of timers usable by GPT
pub const GPT_TIMER_COUNT: usize = 2;

impl GptTimer {
    /// Index into the timer lookup table
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Counting mode of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GptMode {
    /// Reloads and keeps counting after each period
    Continuous,
    /// Stops after the first period
    OneShot,
}

/// Configuration of one GPT channel
#[derive(Debug, Clone, Copy)]
pub struct GptChannelConfig {
    pub channel_id: u8,
    pub timer: GptTimer,
    pub mode: GptMode,
    pub prescaler: u16,
    /// Called from the update interrupt; `None` for no callback
    pub notification: Option<Notification>,
}

/// GPT driver configuration
#[derive(Debug, Clone, Copy)]
pub struct GptConfig<'a> {
    /// Channels, addressed by index
    pub channels: &'a [GptChannelConfig],
}
