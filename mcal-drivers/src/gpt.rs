//! GPT driver
//!
//! Timer channels counting up to a reload value, either once or
//! continuously. Each channel is `Stopped` or `Running`; starting a
//! running channel is refused. The update interrupt of a channel's timer
//! must call [`Gpt::notification`] for that channel.

use heapless::Vec;
use mcal_core::config::{GptChannelConfig, GptConfig, GptMode};
#[cfg(feature = "version-info-api")]
use mcal_core::VersionInfo;
use mcal_core::{Det, HwUnit, NotOk, StdReturn};
use mcal_hal::GptArch;

use crate::report_error;

pub const MODULE_ID: u16 = 100;

/// Service ids
pub mod api {
    pub const GET_VERSION_INFO: u8 = 0x00;
    pub const INIT: u8 = 0x01;
    pub const DEINIT: u8 = 0x02;
    pub const GET_TIME_ELAPSED: u8 = 0x03;
    pub const GET_TIME_REMAINING: u8 = 0x04;
    pub const START_TIMER: u8 = 0x05;
    pub const STOP_TIMER: u8 = 0x06;
    pub const ENABLE_NOTIFICATION: u8 = 0x07;
    pub const DISABLE_NOTIFICATION: u8 = 0x08;
}

/// Development error codes
pub mod error {
    pub const UNINIT: u8 = 0x0A;
    pub const BUSY: u8 = 0x0B;
    pub const ALREADY_INITIALIZED: u8 = 0x0D;
    pub const INIT_FAILED: u8 = 0x0E;
    pub const PARAM_CHANNEL: u8 = 0x14;
    pub const PARAM_VALUE: u8 = 0x15;
    pub const PARAM_POINTER: u8 = 0x16;
}

/// Most channels a configuration may hold
pub const GPT_MAX_CHANNELS: usize = 4;

/// Index of a channel in the configuration table
pub type GptChannel = u8;

/// Tick count; timers are 16 bits wide
pub type GptValue = u32;

/// Largest value accepted by [`Gpt::start_timer`]
pub const GPT_VALUE_MAX: GptValue = 0xFFFF;

/// Run state of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    Stopped,
    Running,
}

/// GPT driver
pub struct Gpt<'a, A, D: ?Sized> {
    arch: A,
    det: &'a D,
    unit: HwUnit<'a, GptConfig<'a>>,
    states: Vec<ChannelState, GPT_MAX_CHANNELS>,
}

impl<'a, A: GptArch, D: Det + ?Sized> Gpt<'a, A, D> {
    pub fn new(arch: A, det: &'a D) -> Self {
        Self {
            arch,
            det,
            unit: HwUnit::new(),
            states: Vec::new(),
        }
    }

    fn report<T>(&self, api_id: u8, error_id: u8) -> Result<T, NotOk> {
        report_error(self.det, MODULE_ID, api_id, error_id);
        Err(NotOk)
    }

    /// Configuration of `channel`, reporting the usual errors
    fn channel(&self, api_id: u8, channel: GptChannel) -> Result<&'a GptChannelConfig, NotOk> {
        let Some(config) = self.unit.config() else {
            return self.report(api_id, error::UNINIT);
        };
        match config.channels.get(usize::from(channel)) {
            Some(record) => Ok(record),
            None => self.report(api_id, error::PARAM_CHANNEL),
        }
    }

    fn set_state(&mut self, channel: GptChannel, state: ChannelState) {
        if let Some(slot) = self.states.get_mut(usize::from(channel)) {
            *slot = state;
        }
    }

    /// Configure every channel; all channels start `Stopped`
    pub fn init(&mut self, config: Option<&'a GptConfig<'a>>) -> StdReturn {
        let Some(config) = config else {
            return self.report(api::INIT, error::PARAM_POINTER);
        };
        if self.unit.is_init() {
            return self.report(api::INIT, error::ALREADY_INITIALIZED);
        }
        if config.channels.len() > GPT_MAX_CHANNELS {
            return self.report(api::INIT, error::INIT_FAILED);
        }
        if self.unit.init(config).is_err() {
            return self.report(api::INIT, error::ALREADY_INITIALIZED);
        }

        self.states.clear();
        for channel in config.channels {
            self.arch.init_channel(channel);
            // Capacity checked above
            let _ = self.states.push(ChannelState::Stopped);
        }
        Ok(())
    }

    /// Return every timer to its reset configuration
    ///
    /// Refused with `BUSY` while any channel is running.
    #[cfg(feature = "gpt-deinit-api")]
    pub fn deinit(&mut self) -> StdReturn {
        let Some(config) = self.unit.config() else {
            return self.report(api::DEINIT, error::UNINIT);
        };
        if self.states.contains(&ChannelState::Running) {
            return self.report(api::DEINIT, error::BUSY);
        }
        for channel in config.channels {
            self.arch.deinit_channel(channel);
        }
        self.states.clear();
        let _ = self.unit.deinit();
        Ok(())
    }

    pub fn is_init(&self) -> bool {
        self.unit.is_init()
    }

    /// State of `channel`, `None` when unknown
    pub fn channel_state(&self, channel: GptChannel) -> Option<ChannelState> {
        self.states.get(usize::from(channel)).copied()
    }

    /// Start `channel` counting up to `value` ticks
    pub fn start_timer(&mut self, channel: GptChannel, value: GptValue) -> StdReturn {
        let record = self.channel(api::START_TIMER, channel)?;
        if value == 0 || value > GPT_VALUE_MAX {
            return self.report(api::START_TIMER, error::PARAM_VALUE);
        }
        if self.channel_state(channel) == Some(ChannelState::Running) {
            return self.report(api::START_TIMER, error::BUSY);
        }
        self.arch.start_timer(record, value as u16);
        self.set_state(channel, ChannelState::Running);
        Ok(())
    }

    /// Stop `channel`
    ///
    /// The counter is halted whatever the state, since a one-shot channel
    /// is already `Stopped` when its notification ran.
    pub fn stop_timer(&mut self, channel: GptChannel) -> StdReturn {
        let record = self.channel(api::STOP_TIMER, channel)?;
        self.arch.stop_timer(record);
        if self.channel_state(channel) == Some(ChannelState::Running) {
            self.set_state(channel, ChannelState::Stopped);
        }
        Ok(())
    }

    /// Raw counter value of `channel`; 0 on error
    #[cfg(feature = "gpt-time-elapsed-api")]
    pub fn get_time_elapsed(&self, channel: GptChannel) -> GptValue {
        self.channel(api::GET_TIME_ELAPSED, channel)
            .map_or(0, |record| GptValue::from(self.arch.time_elapsed(record)))
    }

    /// Ticks left before the reload value; 0 on error
    #[cfg(feature = "gpt-time-remaining-api")]
    pub fn get_time_remaining(&self, channel: GptChannel) -> GptValue {
        self.channel(api::GET_TIME_REMAINING, channel)
            .map_or(0, |record| GptValue::from(self.arch.time_remaining(record)))
    }

    #[cfg(feature = "gpt-enable-disable-notification-api")]
    pub fn enable_notification(&mut self, channel: GptChannel) -> StdReturn {
        let record = self.channel(api::ENABLE_NOTIFICATION, channel)?;
        if record.notification.is_none() {
            return self.report(api::ENABLE_NOTIFICATION, error::PARAM_CHANNEL);
        }
        self.arch.enable_notification(record);
        Ok(())
    }

    #[cfg(feature = "gpt-enable-disable-notification-api")]
    pub fn disable_notification(&mut self, channel: GptChannel) -> StdReturn {
        let record = self.channel(api::DISABLE_NOTIFICATION, channel)?;
        if record.notification.is_none() {
            return self.report(api::DISABLE_NOTIFICATION, error::PARAM_CHANNEL);
        }
        self.arch.disable_notification(record);
        Ok(())
    }

    /// Update interrupt handler of `channel`
    ///
    /// Calls the channel's callback, then clears the update flag. A
    /// one-shot channel is `Stopped` afterwards. Runs in interrupt
    /// context and reports nothing.
    pub fn notification(&mut self, channel: GptChannel) {
        let Some(config) = self.unit.config() else {
            return;
        };
        let Some(record) = config.channels.get(usize::from(channel)) else {
            return;
        };
        if let Some(callback) = record.notification {
            callback();
        }
        self.arch.clear_update_flag(record);
        if record.mode == GptMode::OneShot {
            self.set_state(channel, ChannelState::Stopped);
        }
    }

    /// Dispatch the update interrupt of every channel whose flag is set
    pub fn notification_pending(&mut self) {
        let Some(config) = self.unit.config() else {
            return;
        };
        for (index, record) in config.channels.iter().enumerate() {
            if self.arch.update_pending(record) {
                self.notification(index as GptChannel);
            }
        }
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};
    use mcal_core::config::GptTimer;
    use mcal_core::det::RecordingDet;
    use mcal_hal_stm32g0::regs::{tim, TimRegisters};
    use mcal_hal_stm32g0::Stm32g0Gpt;

    static CALLS: AtomicU32 = AtomicU32::new(0);

    fn on_update() {
        CALLS.fetch_add(1, Ordering::SeqCst);
    }

    const CHANNELS: [GptChannelConfig; 2] = [
        GptChannelConfig {
            channel_id: 0,
            timer: GptTimer::Tim6,
            mode: GptMode::OneShot,
            prescaler: 15,
            notification: Some(on_update),
        },
        GptChannelConfig {
            channel_id: 1,
            timer: GptTimer::Tim7,
            mode: GptMode::Continuous,
            prescaler: 0,
            notification: None,
        },
    ];
    const CONFIG: GptConfig<'static> = GptConfig {
        channels: &CHANNELS,
    };

    #[test]
    fn test_init_configures_channels() {
        let (tim6, tim7) = (TimRegisters::new(), TimRegisters::new());
        let det = RecordingDet::<8>::new();
        let mut gpt = Gpt::new(Stm32g0Gpt::new([&tim6, &tim7]), &det);

        assert_eq!(gpt.init(Some(&CONFIG)), Ok(()));
        assert_eq!(tim6.psc.read(), 15);
        assert_eq!(tim6.cr1.read(), 1 << tim::CR1_OPM);
        assert_eq!(tim7.cr1.read(), 0);
        assert_eq!(gpt.channel_state(0), Some(ChannelState::Stopped));
        assert_eq!(gpt.channel_state(1), Some(ChannelState::Stopped));
    }

    #[test]
    fn test_init_rejects_null_and_double_init() {
        let (tim6, tim7) = (TimRegisters::new(), TimRegisters::new());
        let det = RecordingDet::<8>::new();
        let mut gpt = Gpt::new(Stm32g0Gpt::new([&tim6, &tim7]), &det);

        assert_eq!(gpt.init(None), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::INIT, error::PARAM_POINTER));

        gpt.init(Some(&CONFIG)).unwrap();
        let one = GptConfig {
            channels: &CHANNELS[1..],
        };
        assert_eq!(gpt.init(Some(&one)), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::INIT, error::ALREADY_INITIALIZED));
        assert_eq!(gpt.channel_state(1), Some(ChannelState::Stopped));
    }

    #[test]
    fn test_services_before_init_report_uninit() {
        let (tim6, tim7) = (TimRegisters::new(), TimRegisters::new());
        let det = RecordingDet::<16>::new();
        let mut gpt = Gpt::new(Stm32g0Gpt::new([&tim6, &tim7]), &det);

        assert_eq!(gpt.start_timer(0, 100), Err(NotOk));
        assert_eq!(gpt.stop_timer(0), Err(NotOk));
        assert_eq!(gpt.get_time_elapsed(0), 0);
        assert_eq!(gpt.get_time_remaining(0), 0);
        assert_eq!(gpt.enable_notification(0), Err(NotOk));
        assert_eq!(gpt.disable_notification(0), Err(NotOk));
        assert_eq!(gpt.deinit(), Err(NotOk));

        for api_id in [
            api::START_TIMER,
            api::STOP_TIMER,
            api::GET_TIME_ELAPSED,
            api::GET_TIME_REMAINING,
            api::ENABLE_NOTIFICATION,
            api::DISABLE_NOTIFICATION,
            api::DEINIT,
        ] {
            assert!(det.contains_error(MODULE_ID, api_id, error::UNINIT));
        }
        assert_eq!(tim6.arr.read(), 0xFFFF);
        assert_eq!(tim6.cr1.read(), 0);
    }

    #[test]
    fn test_start_timer() {
        let (tim6, tim7) = (TimRegisters::new(), TimRegisters::new());
        let det = RecordingDet::<8>::new();
        let mut gpt = Gpt::new(Stm32g0Gpt::new([&tim6, &tim7]), &det);
        gpt.init(Some(&CONFIG)).unwrap();

        assert_eq!(gpt.start_timer(0, 0xF000), Ok(()));
        assert_eq!(tim6.arr.read(), 0xF000);
        assert!(tim6.cr1.read() & (1 << tim::CR1_CEN) != 0);
        assert_eq!(gpt.channel_state(0), Some(ChannelState::Running));

        assert_eq!(gpt.start_timer(0, 0x1000), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::START_TIMER, error::BUSY));
        assert_eq!(tim6.arr.read(), 0xF000);

        assert_eq!(gpt.start_timer(1, 0), Err(NotOk));
        assert_eq!(gpt.start_timer(1, 0x1_0000), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::START_TIMER, error::PARAM_VALUE));
        assert_eq!(gpt.start_timer(2, 10), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::START_TIMER, error::PARAM_CHANNEL));

        assert_eq!(gpt.stop_timer(0), Ok(()));
        assert!(tim6.cr1.read() & (1 << tim::CR1_CEN) == 0);
        assert_eq!(gpt.channel_state(0), Some(ChannelState::Stopped));
    }

    #[test]
    fn test_time_elapsed_and_remaining() {
        let (tim6, tim7) = (TimRegisters::new(), TimRegisters::new());
        let det = RecordingDet::<8>::new();
        let mut gpt = Gpt::new(Stm32g0Gpt::new([&tim6, &tim7]), &det);
        gpt.init(Some(&CONFIG)).unwrap();

        gpt.start_timer(1, 4000).unwrap();
        tim7.cnt.write(1500);
        assert_eq!(gpt.get_time_elapsed(1), 1500);
        assert_eq!(gpt.get_time_remaining(1), 2500);
    }

    #[test]
    fn test_notification_calls_callback_and_clears_flag() {
        let (tim6, tim7) = (TimRegisters::new(), TimRegisters::new());
        let det = RecordingDet::<8>::new();
        let mut gpt = Gpt::new(Stm32g0Gpt::new([&tim6, &tim7]), &det);
        gpt.init(Some(&CONFIG)).unwrap();
        gpt.start_timer(0, 100).unwrap();
        let before = CALLS.load(Ordering::SeqCst);

        tim6.sr.write(0x01);
        gpt.notification(0);

        assert_eq!(CALLS.load(Ordering::SeqCst), before + 1);
        assert_eq!(tim6.sr.read(), 0x00);
        // One-shot channel
        assert_eq!(gpt.channel_state(0), Some(ChannelState::Stopped));
        assert!(det.is_empty());
    }

    #[test]
    fn test_stop_timer_halts_counter_after_one_shot_expiry() {
        let (tim6, tim7) = (TimRegisters::new(), TimRegisters::new());
        let det = RecordingDet::<8>::new();
        let mut gpt = Gpt::new(Stm32g0Gpt::new([&tim6, &tim7]), &det);
        gpt.init(Some(&CONFIG)).unwrap();
        gpt.start_timer(0, 100).unwrap();

        tim6.sr.write(0x01);
        gpt.notification(0);
        assert_eq!(gpt.channel_state(0), Some(ChannelState::Stopped));

        // Counter still enabled, as if OPM had not cleared it yet
        tim6.cr1.modify(|v| *v |= 1 << tim::CR1_CEN);
        assert_eq!(gpt.stop_timer(0), Ok(()));
        assert!(tim6.cr1.read() & (1 << tim::CR1_CEN) == 0);
        assert_eq!(gpt.channel_state(0), Some(ChannelState::Stopped));
        assert!(det.is_empty());
    }

    #[test]
    fn test_notification_without_callback_only_clears_flag() {
        let (tim6, tim7) = (TimRegisters::new(), TimRegisters::new());
        let det = RecordingDet::<8>::new();
        let mut gpt = Gpt::new(Stm32g0Gpt::new([&tim6, &tim7]), &det);
        gpt.init(Some(&CONFIG)).unwrap();
        gpt.start_timer(1, 100).unwrap();

        tim7.sr.write(0x01);
        gpt.notification_pending();

        assert_eq!(tim7.sr.read(), 0);
        assert_eq!(gpt.channel_state(1), Some(ChannelState::Running));
    }

    #[test]
    fn test_notification_enable_disable() {
        let (tim6, tim7) = (TimRegisters::new(), TimRegisters::new());
        let det = RecordingDet::<8>::new();
        let mut gpt = Gpt::new(Stm32g0Gpt::new([&tim6, &tim7]), &det);
        gpt.init(Some(&CONFIG)).unwrap();

        assert_eq!(gpt.disable_notification(0), Ok(()));
        assert!(tim6.cr1.read() & (1 << tim::CR1_UDIS) != 0);
        assert_eq!(gpt.enable_notification(0), Ok(()));
        assert!(tim6.cr1.read() & (1 << tim::CR1_UDIS) == 0);

        assert_eq!(gpt.enable_notification(1), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::ENABLE_NOTIFICATION, error::PARAM_CHANNEL));
    }

    #[test]
    fn test_deinit() {
        let (tim6, tim7) = (TimRegisters::new(), TimRegisters::new());
        let det = RecordingDet::<8>::new();
        let mut gpt = Gpt::new(Stm32g0Gpt::new([&tim6, &tim7]), &det);
        gpt.init(Some(&CONFIG)).unwrap();
        gpt.start_timer(1, 100).unwrap();

        assert_eq!(gpt.deinit(), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::DEINIT, error::BUSY));

        gpt.stop_timer(1).unwrap();
        assert_eq!(gpt.deinit(), Ok(()));
        assert!(!gpt.is_init());
        assert_eq!(tim6.psc.read(), 0);
        assert_eq!(tim6.arr.read(), 1);
        assert_eq!(tim7.arr.read(), 1);
        assert_eq!(gpt.channel_state(0), None);

        // A fresh init is accepted again
        assert_eq!(gpt.init(Some(&CONFIG)), Ok(()));
    }
}
