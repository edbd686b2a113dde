//! GPT arch: basic timers TIM6 and TIM7

use mcal_core::config::{GptChannelConfig, GptMode, GptTimer, GPT_TIMER_COUNT};
use mcal_core::Bfx;
use mcal_hal::GptArch;

use crate::regs::{tim, TimRegisters, TIM6_BASE, TIM7_BASE};

/// Auto-reload value left behind by `deinit_channel`
const ARR_DEINIT: u32 = 1;

/// Drives the timers behind GPT channels
pub struct Stm32g0Gpt<'r> {
    timers: [&'r TimRegisters; GPT_TIMER_COUNT],
}

impl Stm32g0Gpt<'static> {
    /// # Safety
    ///
    /// Only valid on the target, with the TIM6/TIM7 clocks enabled.
    pub unsafe fn steal() -> Self {
        unsafe { Self::new([TimRegisters::steal(TIM6_BASE), TimRegisters::steal(TIM7_BASE)]) }
    }
}

impl<'r> Stm32g0Gpt<'r> {
    /// Register blocks indexed by [`GptTimer`]
    pub fn new(timers: [&'r TimRegisters; GPT_TIMER_COUNT]) -> Self {
        Self { timers }
    }

    fn regs(&self, timer: GptTimer) -> &'r TimRegisters {
        self.timers[timer.index()]
    }
}

impl GptArch for Stm32g0Gpt<'_> {
    fn init_channel(&mut self, channel: &GptChannelConfig) {
        let regs = self.regs(channel.timer);
        regs.psc.write(u32::from(channel.prescaler));
        regs.cr1
            .modify(|v| v.put_bit(tim::CR1_OPM, channel.mode == GptMode::OneShot));
        regs.sr.modify(|v| v.clr_bit(tim::SR_UIF));
        regs.dier.modify(|v| v.set_bit(tim::DIER_UIE));
    }

    fn deinit_channel(&mut self, channel: &GptChannelConfig) {
        let regs = self.regs(channel.timer);
        regs.psc.write(0);
        regs.sr.modify(|v| v.clr_bit(tim::SR_UIF));
        regs.arr.write(ARR_DEINIT);
        regs.dier.modify(|v| v.clr_bit(tim::DIER_UIE));
    }

    fn start_timer(&mut self, channel: &GptChannelConfig, value: u16) {
        let regs = self.regs(channel.timer);
        regs.arr.write(u32::from(value));
        regs.cr1.modify(|v| v.set_bit(tim::CR1_CEN));
    }

    fn stop_timer(&mut self, channel: &GptChannelConfig) {
        self.regs(channel.timer).cr1.modify(|v| v.clr_bit(tim::CR1_CEN));
    }

    fn time_elapsed(&self, channel: &GptChannelConfig) -> u16 {
        self.regs(channel.timer).cnt.read() as u16
    }

    fn time_remaining(&self, channel: &GptChannelConfig) -> u16 {
        let regs = self.regs(channel.timer);
        (regs.arr.read() as u16).wrapping_sub(regs.cnt.read() as u16)
    }

    fn enable_notification(&mut self, channel: &GptChannelConfig) {
        self.regs(channel.timer).cr1.modify(|v| v.clr_bit(tim::CR1_UDIS));
    }

    fn disable_notification(&mut self, channel: &GptChannelConfig) {
        self.regs(channel.timer).cr1.modify(|v| v.set_bit(tim::CR1_UDIS));
    }

    fn update_pending(&self, channel: &GptChannelConfig) -> bool {
        self.regs(channel.timer).sr.read().get_bit(tim::SR_UIF)
    }

    fn clear_update_flag(&mut self, channel: &GptChannelConfig) {
        self.regs(channel.timer).sr.modify(|v| v.clr_bit(tim::SR_UIF));
    }
}
