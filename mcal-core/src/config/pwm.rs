//! PWM configuration types

use super::Notification;
use crate::types::Level;

/// Duty value for 100%
pub const PWM_DUTY_MAX: u16 = 0x8000;

/// Period/duty capabilities of a channel, fixed at configuration time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmChannelClass {
    /// Period and duty may both change at runtime
    VariablePeriod,
    /// Only the duty may change
    FixedPeriod,
    /// Only the duty may change; the edge is phase-shifted
    FixedPeriodShifted,
}

/// Level of the output during the active part of the period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmPolarity {
    High,
    Low,
}

/// Observed output level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmOutputState {
    High,
    Low,
}

impl From<Level> for PwmOutputState {
    fn from(level: Level) -> Self {
        match level {
            Level::High => PwmOutputState::High,
            Level::Low => PwmOutputState::Low,
        }
    }
}

/// Edge that triggers the channel notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmEdgeNotification {
    Rising,
    Falling,
    Both,
}

/// Power state of the PWM hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PwmPowerState {
    FullPower = 0,
    ReducedPower = 1,
}

impl PwmPowerState {
    /// Power state from its numeric value
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PwmPowerState::FullPower),
            1 => Some(PwmPowerState::ReducedPower),
            _ => None,
        }
    }
}

/// Outcome of a power-state request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerStateRequestResult {
    ServiceAccepted,
    NotInit,
    SequenceError,
    HwFailure,
    PowerStateNotSupported,
    TransitionNotPossible,
}

/// Configuration of one PWM channel
#[derive(Debug, Clone, Copy)]
pub struct PwmChannelConfig {
    /// Hardware compare channel (1-4)
    pub hw_channel: u8,
    pub class: PwmChannelClass,
    /// Default period in timer ticks
    pub period: u16,
    /// Default duty, 0..=0x8000
    pub duty: u16,
    pub polarity: PwmPolarity,
    /// Level forced by `set_output_to_idle`
    pub idle_state: Level,
    pub notification: Option<Notification>,
}

/// PWM driver configuration
#[derive(Debug, Clone, Copy)]
pub struct PwmConfig<'a> {
    /// Timer prescaler shared by all channels
    pub prescaler: u16,
    /// Channels; the PWM API numbers them from 1
    pub channels: &'a [PwmChannelConfig],
}
