//! PWM channels sharing one timer

use mcal_core::config::{
    PwmChannelConfig, PwmConfig, PwmEdgeNotification, PwmOutputState, PwmPowerState,
};

/// Interrupt sources latched by the PWM timer since the last acknowledge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmEvents {
    /// Counter wrapped (start of a period)
    pub update: bool,
    /// Bit `n - 1` set when compare channel `n` matched
    pub compare: u8,
}

impl PwmEvents {
    /// Whether compare channel `hw_channel` (1-4) matched
    pub const fn compare_matched(&self, hw_channel: u8) -> bool {
        hw_channel >= 1 && hw_channel <= 4 && self.compare & (1 << (hw_channel - 1)) != 0
    }
}

/// Drives the PWM timer
pub trait PwmArch {
    /// Program the prescaler, the common period and every channel, then
    /// start the counter
    fn init(&mut self, config: &PwmConfig);

    /// Stop the counter and disable every channel output
    fn deinit(&mut self, config: &PwmConfig);

    /// Load a new compare value for `duty` of `period`, restoring PWM mode
    fn set_duty_cycle(&mut self, channel: &PwmChannelConfig, period: u16, duty: u16);

    /// Change the common period and the compare value of `channel`
    fn set_period_and_duty(&mut self, channel: &PwmChannelConfig, period: u16, duty: u16);

    /// Force the output to the channel's idle level
    fn set_output_to_idle(&mut self, channel: &PwmChannelConfig);

    /// Current level of the output pin as driven by the timer
    fn output_state(&self, channel: &PwmChannelConfig) -> PwmOutputState;

    fn enable_notification(&mut self, channel: &PwmChannelConfig, edge: PwmEdgeNotification);

    /// Disable the channel's interrupt sources
    ///
    /// The update interrupt is shared by all channels and is only disabled
    /// when `keep_update` is false.
    fn disable_notification(&mut self, channel: &PwmChannelConfig, keep_update: bool);

    /// Read and clear the latched interrupt flags
    fn acknowledge(&mut self) -> PwmEvents;

    /// Apply a power state to the timer
    fn set_power_state(&mut self, state: PwmPowerState);
}
