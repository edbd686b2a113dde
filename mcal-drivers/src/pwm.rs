//! PWM driver
//!
//! Channels share one timer and therefore one period. Channel numbers
//! start at 1. The timer interrupt must call [`Pwm::notification`].

use heapless::Vec;
use mcal_core::config::{
    PowerStateRequestResult, PwmChannelClass, PwmChannelConfig, PwmConfig, PwmEdgeNotification,
    PwmOutputState, PwmPolarity, PwmPowerState, PWM_DUTY_MAX,
};
#[cfg(feature = "version-info-api")]
use mcal_core::VersionInfo;
use mcal_core::{Det, HwUnit, NotOk, StdReturn};
use mcal_hal::PwmArch;

use crate::report_error;

pub const MODULE_ID: u16 = 121;

/// Service ids
pub mod api {
    pub const INIT: u8 = 0x00;
    pub const DEINIT: u8 = 0x01;
    pub const SET_DUTY_CYCLE: u8 = 0x02;
    pub const SET_PERIOD_AND_DUTY: u8 = 0x03;
    pub const SET_OUTPUT_TO_IDLE: u8 = 0x04;
    pub const GET_OUTPUT_STATE: u8 = 0x05;
    pub const DISABLE_NOTIFICATION: u8 = 0x06;
    pub const ENABLE_NOTIFICATION: u8 = 0x07;
    pub const GET_VERSION_INFO: u8 = 0x08;
    pub const SET_POWER_STATE: u8 = 0x09;
    pub const GET_CURRENT_POWER_STATE: u8 = 0x0A;
    pub const GET_TARGET_POWER_STATE: u8 = 0x0B;
    pub const PREPARE_POWER_STATE: u8 = 0x0C;
}

/// Development error codes
pub mod error {
    pub const INIT_FAILED: u8 = 0x10;
    pub const UNINIT: u8 = 0x11;
    pub const PARAM_CHANNEL: u8 = 0x12;
    pub const PERIOD_UNCHANGEABLE: u8 = 0x13;
    pub const ALREADY_INITIALIZED: u8 = 0x14;
    pub const PARAM_POINTER: u8 = 0x15;
    pub const POWER_STATE_NOT_SUPPORTED: u8 = 0x17;
    pub const TRANSITION_NOT_POSSIBLE: u8 = 0x18;
    pub const PERIPHERAL_NOT_PREPARED: u8 = 0x19;
}

/// Compare channels of the PWM timer
pub const PWM_MAX_CHANNELS: usize = 4;

/// Channel number, 1-based
pub type PwmChannel = u8;

/// Runtime state of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChannelRuntime {
    duty: u16,
    idle: bool,
    edge: Option<PwmEdgeNotification>,
}

/// Whether `edge` on a channel with `polarity` needs the update interrupt
fn uses_update(polarity: PwmPolarity, edge: PwmEdgeNotification) -> bool {
    matches!(
        (edge, polarity),
        (PwmEdgeNotification::Both, _)
            | (PwmEdgeNotification::Rising, PwmPolarity::High)
            | (PwmEdgeNotification::Falling, PwmPolarity::Low)
    )
}

/// Whether `edge` on a channel with `polarity` needs the compare interrupt
fn uses_compare(polarity: PwmPolarity, edge: PwmEdgeNotification) -> bool {
    matches!(
        (edge, polarity),
        (PwmEdgeNotification::Both, _)
            | (PwmEdgeNotification::Falling, PwmPolarity::High)
            | (PwmEdgeNotification::Rising, PwmPolarity::Low)
    )
}

/// PWM driver
pub struct Pwm<'a, A, D: ?Sized> {
    arch: A,
    det: &'a D,
    unit: HwUnit<'a, PwmConfig<'a>>,
    channels: Vec<ChannelRuntime, PWM_MAX_CHANNELS>,
    period: u16,
    current_power: PwmPowerState,
    target_power: PwmPowerState,
    prepared: bool,
}

impl<'a, A: PwmArch, D: Det + ?Sized> Pwm<'a, A, D> {
    pub fn new(arch: A, det: &'a D) -> Self {
        Self {
            arch,
            det,
            unit: HwUnit::new(),
            channels: Vec::new(),
            period: 0,
            current_power: PwmPowerState::FullPower,
            target_power: PwmPowerState::FullPower,
            prepared: false,
        }
    }

    fn report<T>(&self, api_id: u8, error_id: u8) -> Result<T, NotOk> {
        report_error(self.det, MODULE_ID, api_id, error_id);
        Err(NotOk)
    }

    /// Configuration of `channel` and its table index
    fn channel(
        &self,
        api_id: u8,
        channel: PwmChannel,
    ) -> Result<(usize, &'a PwmChannelConfig), NotOk> {
        let Some(config) = self.unit.config() else {
            return self.report(api_id, error::UNINIT);
        };
        let index = usize::from(channel).wrapping_sub(1);
        match config.channels.get(index) {
            Some(record) => Ok((index, record)),
            None => self.report(api_id, error::PARAM_CHANNEL),
        }
    }

    fn config_is_valid(config: &PwmConfig) -> bool {
        if config.channels.len() > PWM_MAX_CHANNELS {
            return false;
        }
        let mut used = 0u8;
        for channel in config.channels {
            let hw = channel.hw_channel;
            if !(1..=PWM_MAX_CHANNELS as u8).contains(&hw) || used & (1 << hw) != 0 {
                return false;
            }
            used |= 1 << hw;
        }
        true
    }

    /// Program the timer and start every channel at its default duty
    pub fn init(&mut self, config: Option<&'a PwmConfig<'a>>) -> StdReturn {
        let Some(config) = config else {
            return self.report(api::INIT, error::PARAM_POINTER);
        };
        if self.unit.is_init() {
            return self.report(api::INIT, error::ALREADY_INITIALIZED);
        }
        if !Self::config_is_valid(config) {
            return self.report(api::INIT, error::INIT_FAILED);
        }
        if self.unit.init(config).is_err() {
            return self.report(api::INIT, error::ALREADY_INITIALIZED);
        }

        self.arch.init(config);
        self.period = config.channels.first().map_or(0, |channel| channel.period);
        self.channels.clear();
        for channel in config.channels {
            // Capacity checked by config_is_valid
            let _ = self.channels.push(ChannelRuntime {
                duty: channel.duty.min(PWM_DUTY_MAX),
                idle: false,
                edge: None,
            });
        }
        self.current_power = PwmPowerState::FullPower;
        self.target_power = PwmPowerState::FullPower;
        self.prepared = false;
        Ok(())
    }

    /// Stop the timer and release every channel output
    #[cfg(feature = "pwm-de-init-api")]
    pub fn deinit(&mut self) -> StdReturn {
        let Some(config) = self.unit.config() else {
            return self.report(api::DEINIT, error::UNINIT);
        };
        self.arch.deinit(config);
        self.channels.clear();
        self.period = 0;
        let _ = self.unit.deinit();
        Ok(())
    }

    pub fn is_init(&self) -> bool {
        self.unit.is_init()
    }

    /// Common period in timer ticks
    pub fn period(&self) -> u16 {
        self.period
    }

    /// Duty last applied to `channel`
    pub fn duty(&self, channel: PwmChannel) -> Option<u16> {
        let index = usize::from(channel).checked_sub(1)?;
        self.channels.get(index).map(|runtime| runtime.duty)
    }

    /// Set the duty of `channel`; values above 0x8000 mean 100%
    #[cfg(feature = "pwm-set-duty-cycle")]
    pub fn set_duty_cycle(&mut self, channel: PwmChannel, duty: u16) -> StdReturn {
        let (index, record) = self.channel(api::SET_DUTY_CYCLE, channel)?;
        let duty = duty.min(PWM_DUTY_MAX);
        self.arch.set_duty_cycle(record, self.period, duty);
        if let Some(runtime) = self.channels.get_mut(index) {
            runtime.duty = duty;
            runtime.idle = false;
        }
        Ok(())
    }

    /// Change the common period and the duty of `channel`
    ///
    /// Only variable-period channels may do this. The other running
    /// channels keep their duty ratio at the new period. A period of 0
    /// drives `channel` inactive and leaves the timer period unchanged.
    #[cfg(feature = "pwm-set-period-and-duty")]
    pub fn set_period_and_duty(
        &mut self,
        channel: PwmChannel,
        period: u16,
        duty: u16,
    ) -> StdReturn {
        let (index, record) = self.channel(api::SET_PERIOD_AND_DUTY, channel)?;
        if record.class != PwmChannelClass::VariablePeriod {
            return self.report(api::SET_PERIOD_AND_DUTY, error::PERIOD_UNCHANGEABLE);
        }
        let duty = duty.min(PWM_DUTY_MAX);
        self.arch.set_period_and_duty(record, period, duty);
        if let Some(runtime) = self.channels.get_mut(index) {
            runtime.duty = duty;
            runtime.idle = period == 0;
        }
        if period == 0 {
            return Ok(());
        }

        self.period = period;
        let Some(config) = self.unit.config() else {
            return Ok(());
        };
        for (other, runtime) in config.channels.iter().zip(self.channels.iter()) {
            if core::ptr::eq(other, record) || runtime.idle {
                continue;
            }
            self.arch.set_duty_cycle(other, period, runtime.duty);
        }
        Ok(())
    }

    /// Force `channel` to its idle level until the next duty change
    #[cfg(feature = "pwm-set-output-to-idle")]
    pub fn set_output_to_idle(&mut self, channel: PwmChannel) -> StdReturn {
        let (index, record) = self.channel(api::SET_OUTPUT_TO_IDLE, channel)?;
        self.arch.set_output_to_idle(record);
        if let Some(runtime) = self.channels.get_mut(index) {
            runtime.idle = true;
        }
        Ok(())
    }

    /// Level of the output; `Low` on error
    #[cfg(feature = "pwm-get-output-state")]
    pub fn get_output_state(&self, channel: PwmChannel) -> PwmOutputState {
        self.channel(api::GET_OUTPUT_STATE, channel)
            .map_or(PwmOutputState::Low, |(_, record)| self.arch.output_state(record))
    }

    #[cfg(feature = "pwm-notification-supported")]
    pub fn enable_notification(
        &mut self,
        channel: PwmChannel,
        edge: PwmEdgeNotification,
    ) -> StdReturn {
        let (index, record) = self.channel(api::ENABLE_NOTIFICATION, channel)?;
        if record.notification.is_none() {
            return self.report(api::ENABLE_NOTIFICATION, error::PARAM_CHANNEL);
        }
        self.arch.enable_notification(record, edge);
        if let Some(runtime) = self.channels.get_mut(index) {
            runtime.edge = Some(edge);
        }
        Ok(())
    }

    /// Disable the notification of `channel`
    ///
    /// The shared update interrupt stays enabled while another channel
    /// still needs it.
    #[cfg(feature = "pwm-notification-supported")]
    pub fn disable_notification(&mut self, channel: PwmChannel) -> StdReturn {
        let (index, record) = self.channel(api::DISABLE_NOTIFICATION, channel)?;
        let Some(config) = self.unit.config() else {
            return Ok(());
        };
        let keep_update = config
            .channels
            .iter()
            .zip(self.channels.iter())
            .enumerate()
            .any(|(other, (other_record, runtime))| {
                other != index
                    && runtime
                        .edge
                        .is_some_and(|edge| uses_update(other_record.polarity, edge))
            });
        self.arch.disable_notification(record, keep_update);
        if let Some(runtime) = self.channels.get_mut(index) {
            runtime.edge = None;
        }
        Ok(())
    }

    /// Timer interrupt handler
    ///
    /// Acknowledges the latched events and calls the callback of every
    /// channel whose enabled edge occurred. Reports nothing.
    pub fn notification(&mut self) {
        let Some(config) = self.unit.config() else {
            return;
        };
        let events = self.arch.acknowledge();
        for (record, runtime) in config.channels.iter().zip(self.channels.iter()) {
            let (Some(edge), Some(callback)) = (runtime.edge, record.notification) else {
                continue;
            };
            let fired = (events.update && uses_update(record.polarity, edge))
                || (events.compare_matched(record.hw_channel)
                    && uses_compare(record.polarity, edge));
            if fired {
                callback();
            }
        }
    }

    fn power_precondition(&self, api_id: u8) -> Result<(), PowerStateRequestResult> {
        if self.unit.is_init() {
            Ok(())
        } else {
            report_error(self.det, MODULE_ID, api_id, error::UNINIT);
            Err(PowerStateRequestResult::NotInit)
        }
    }

    /// Record the power state the next [`Pwm::set_power_state`] enters
    #[cfg(feature = "pwm-power-state-supported")]
    pub fn prepare_power_state(&mut self, state: u8) -> Result<(), PowerStateRequestResult> {
        self.power_precondition(api::PREPARE_POWER_STATE)?;
        let Some(state) = PwmPowerState::from_u8(state) else {
            report_error(
                self.det,
                MODULE_ID,
                api::PREPARE_POWER_STATE,
                error::POWER_STATE_NOT_SUPPORTED,
            );
            return Err(PowerStateRequestResult::PowerStateNotSupported);
        };
        self.target_power = state;
        self.prepared = true;
        Ok(())
    }

    /// Enter the prepared power state
    ///
    /// Reduced power stops the timer, so it is refused while any channel
    /// notification is enabled.
    #[cfg(feature = "pwm-power-state-supported")]
    pub fn set_power_state(&mut self) -> Result<(), PowerStateRequestResult> {
        self.power_precondition(api::SET_POWER_STATE)?;
        if !self.prepared {
            report_error(
                self.det,
                MODULE_ID,
                api::SET_POWER_STATE,
                error::PERIPHERAL_NOT_PREPARED,
            );
            return Err(PowerStateRequestResult::SequenceError);
        }
        let notifying = self.channels.iter().any(|runtime| runtime.edge.is_some());
        if self.target_power == PwmPowerState::ReducedPower && notifying {
            report_error(
                self.det,
                MODULE_ID,
                api::SET_POWER_STATE,
                error::TRANSITION_NOT_POSSIBLE,
            );
            return Err(PowerStateRequestResult::TransitionNotPossible);
        }
        self.arch.set_power_state(self.target_power);
        self.current_power = self.target_power;
        self.prepared = false;
        Ok(())
    }

    #[cfg(feature = "pwm-power-state-supported")]
    pub fn get_current_power_state(&self) -> Result<PwmPowerState, PowerStateRequestResult> {
        self.power_precondition(api::GET_CURRENT_POWER_STATE)?;
        Ok(self.current_power)
    }

    #[cfg(feature = "pwm-power-state-supported")]
    pub fn get_target_power_state(&self) -> Result<PwmPowerState, PowerStateRequestResult> {
        self.power_precondition(api::GET_TARGET_POWER_STATE)?;
        Ok(self.target_power)
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

    /// `embedded-hal` handle for `channel`
    pub fn channel_handle(&mut self, channel: PwmChannel) -> PwmChannelHandle<'_, 'a, A, D> {
        PwmChannelHandle { pwm: self, channel }
    }
}

/// Error of [`PwmChannelHandle`]: the driver refused the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmRejected;

impl embedded_hal::pwm::Error for PwmRejected {
    fn kind(&self) -> embedded_hal::pwm::ErrorKind {
        embedded_hal::pwm::ErrorKind::Other
    }
}

/// One PWM channel as an `embedded-hal` duty-cycle sink
pub struct PwmChannelHandle<'p, 'a, A, D: ?Sized> {
    pwm: &'p mut Pwm<'a, A, D>,
    channel: PwmChannel,
}

impl<A, D: ?Sized> PwmChannelHandle<'_, '_, A, D> {
    pub fn channel(&self) -> PwmChannel {
        self.channel
    }
}

impl<A: PwmArch, D: Det + ?Sized> embedded_hal::pwm::ErrorType for PwmChannelHandle<'_, '_, A, D> {
    type Error = PwmRejected;
}

#[cfg(feature = "pwm-set-duty-cycle")]
impl<A: PwmArch, D: Det + ?Sized> embedded_hal::pwm::SetDutyCycle
    for PwmChannelHandle<'_, '_, A, D>
{
    fn max_duty_cycle(&self) -> u16 {
        PWM_DUTY_MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.pwm
            .set_duty_cycle(self.channel, duty)
            .map_err(|NotOk| PwmRejected)
    }
}
