//! Timer channels

use mcal_core::config::GptChannelConfig;

/// Drives the basic timers behind GPT channels
pub trait GptArch {
    /// Load prescaler and counting mode, clear the update flag
    fn init_channel(&mut self, channel: &GptChannelConfig);

    /// Return the timer to its reset configuration
    fn deinit_channel(&mut self, channel: &GptChannelConfig);

    /// Load the reload value and enable the counter
    fn start_timer(&mut self, channel: &GptChannelConfig, value: u16);

    /// Disable the counter
    fn stop_timer(&mut self, channel: &GptChannelConfig);

    /// Raw counter value
    fn time_elapsed(&self, channel: &GptChannelConfig) -> u16;

    /// Reload value minus counter value
    fn time_remaining(&self, channel: &GptChannelConfig) -> u16;

    fn enable_notification(&mut self, channel: &GptChannelConfig);

    fn disable_notification(&mut self, channel: &GptChannelConfig);

    /// Whether the update flag is set
    fn update_pending(&self, channel: &GptChannelConfig) -> bool;

    fn clear_update_flag(&mut self, channel: &GptChannelConfig);
}
