//! PWM arch: TIM3 output-compare channels 1-4
//!
//! All channels share the TIM3 counter, so the period is common. Channels
//! run in PWM mode 1: the reference is active while `CNT < CCRx` and the
//! output polarity bit inverts it.

use mcal_core::config::{
    PwmChannelConfig, PwmConfig, PwmEdgeNotification, PwmOutputState, PwmPolarity, PwmPowerState,
    PWM_DUTY_MAX,
};
use mcal_core::{Bfx, Level};
use mcal_hal::{PwmArch, PwmEvents};

use crate::regs::{tim, Reg, TimRegisters, TIM3_BASE};

/// Compare value producing `duty` (0..=0x8000) of `period`
pub fn compare_value(period: u16, duty: u16) -> u32 {
    if duty >= PWM_DUTY_MAX {
        u32::from(period)
    } else {
        (u32::from(period) * u32::from(duty)) >> 15
    }
}

/// Drives PWM channels on TIM3
pub struct Stm32g0Pwm<'r> {
    tim: &'r TimRegisters,
}

impl Stm32g0Pwm<'static> {
    /// # Safety
    ///
    /// Only valid on the target, with the TIM3 clock enabled.
    pub unsafe fn steal() -> Self {
        Self::new(unsafe { TimRegisters::steal(TIM3_BASE) })
    }
}

impl<'r> Stm32g0Pwm<'r> {
    pub fn new(tim: &'r TimRegisters) -> Self {
        Self { tim }
    }

    fn mode_start(hw_channel: u8) -> u8 {
        (hw_channel.wrapping_sub(1) % 2) * tim::CCMR_CHANNEL_STRIDE + tim::CCMR_OC_MODE_LOW
    }

    fn ccer_start(hw_channel: u8) -> u8 {
        hw_channel.wrapping_sub(1) * tim::CCER_CHANNEL_STRIDE
    }

    fn write_mode(&self, hw_channel: u8, mode: u32) {
        let start = Self::mode_start(hw_channel);
        self.tim
            .ccmr(hw_channel)
            .modify(|v| v.put_bits(start, tim::CCMR_OC_MODE_LEN, mode));
    }

    fn read_mode(&self, hw_channel: u8) -> u32 {
        let start = Self::mode_start(hw_channel);
        self.tim
            .ccmr(hw_channel)
            .read()
            .get_bits(start, tim::CCMR_OC_MODE_LEN)
    }

    fn write_compare(&self, hw_channel: u8, value: u32) {
        if let Some(ccr) = self.tim.ccr(hw_channel) {
            ccr.write(value);
        }
    }

    fn polarity_low(&self, hw_channel: u8) -> bool {
        self.tim
            .ccer
            .read()
            .get_bit(Self::ccer_start(hw_channel) + tim::CCER_CCP_OFFSET)
    }

    fn configure_channel(&self, channel: &PwmChannelConfig, period: u16) {
        let hw = channel.hw_channel;
        if self.tim.ccr(hw).is_none() {
            return;
        }
        let preload = Self::mode_start(hw) - tim::CCMR_OC_MODE_LOW + tim::CCMR_OC_PRELOAD_LOW;
        self.tim.ccmr(hw).modify(|v| v.set_bit(preload));
        self.write_mode(hw, tim::OC_MODE_PWM1);
        self.write_compare(hw, compare_value(period, channel.duty));

        let start = Self::ccer_start(hw);
        self.tim.ccer.modify(|v| {
            v.set_bit(start);
            v.put_bit(start + tim::CCER_CCP_OFFSET, channel.polarity == PwmPolarity::Low);
        });
    }

    fn compare_interrupt_bit(hw_channel: u8) -> u8 {
        tim::DIER_CC1IE + hw_channel.wrapping_sub(1)
    }

    fn load_period(reg: &Reg, period: u16) {
        reg.write(u32::from(period.saturating_sub(1)));
    }
}

impl PwmArch for Stm32g0Pwm<'_> {
    fn init(&mut self, config: &PwmConfig) {
        self.tim.psc.write(u32::from(config.prescaler));
        let period = config.channels.first().map_or(0, |channel| channel.period);
        Self::load_period(&self.tim.arr, period);

        // The counter is shared, so every compare is scaled to one period
        for channel in config.channels {
            self.configure_channel(channel, period);
        }

        self.tim.cr1.modify(|v| v.set_bit(tim::CR1_ARPE));
        self.tim.egr.write(1 << tim::EGR_UG);
        self.tim.sr.write(0);
        self.tim.cr1.modify(|v| v.set_bit(tim::CR1_CEN));
    }

    fn deinit(&mut self, config: &PwmConfig) {
        self.tim.cr1.modify(|v| v.clr_bit(tim::CR1_CEN));
        self.tim.dier.write(0);
        for channel in config.channels {
            let hw = channel.hw_channel;
            if self.tim.ccr(hw).is_none() {
                continue;
            }
            let start = Self::ccer_start(hw);
            self.tim.ccer.modify(|v| v.put_bits(start, 2, 0));
            self.write_mode(hw, 0);
            self.write_compare(hw, 0);
        }
        self.tim.sr.write(0);
    }

    fn set_duty_cycle(&mut self, channel: &PwmChannelConfig, period: u16, duty: u16) {
        self.write_compare(channel.hw_channel, compare_value(period, duty));
        self.write_mode(channel.hw_channel, tim::OC_MODE_PWM1);
    }

    fn set_period_and_duty(&mut self, channel: &PwmChannelConfig, period: u16, duty: u16) {
        if period == 0 {
            self.write_mode(channel.hw_channel, tim::OC_MODE_FORCE_INACTIVE);
            return;
        }
        Self::load_period(&self.tim.arr, period);
        self.set_duty_cycle(channel, period, duty);
    }

    fn set_output_to_idle(&mut self, channel: &PwmChannelConfig) {
        // The output is the reference inverted by the polarity bit
        let active = channel.idle_state.is_high() != (channel.polarity == PwmPolarity::Low);
        let mode = if active {
            tim::OC_MODE_FORCE_ACTIVE
        } else {
            tim::OC_MODE_FORCE_INACTIVE
        };
        self.write_mode(channel.hw_channel, mode);
    }

    fn output_state(&self, channel: &PwmChannelConfig) -> PwmOutputState {
        let hw = channel.hw_channel;
        let reference = match self.read_mode(hw) {
            tim::OC_MODE_FORCE_ACTIVE => true,
            tim::OC_MODE_PWM1 => self
                .tim
                .ccr(hw)
                .is_some_and(|ccr| self.tim.cnt.read() < ccr.read()),
            _ => false,
        };
        Level::from(reference != self.polarity_low(hw)).into()
    }

    fn enable_notification(&mut self, channel: &PwmChannelConfig, edge: PwmEdgeNotification) {
        let inverted = channel.polarity == PwmPolarity::Low;
        let (rising, falling) = match edge {
            PwmEdgeNotification::Rising => (true, false),
            PwmEdgeNotification::Falling => (false, true),
            PwmEdgeNotification::Both => (true, true),
        };
        // Period start is the active edge, compare match the inactive one
        let (update, compare) = if inverted {
            (falling, rising)
        } else {
            (rising, falling)
        };
        let compare_bit = Self::compare_interrupt_bit(channel.hw_channel);

        // SR flags are rc_w0: writing 1 leaves the other flags alone
        self.tim
            .sr
            .write(!(1 << (tim::SR_CC1IF + channel.hw_channel.wrapping_sub(1))));
        self.tim.dier.modify(|v| {
            if update {
                v.set_bit(tim::DIER_UIE);
            }
            v.put_bit(compare_bit, compare);
        });
    }

    fn disable_notification(&mut self, channel: &PwmChannelConfig, keep_update: bool) {
        let compare_bit = Self::compare_interrupt_bit(channel.hw_channel);
        self.tim.dier.modify(|v| {
            v.clr_bit(compare_bit);
            if !keep_update {
                v.clr_bit(tim::DIER_UIE);
            }
        });
    }

    fn acknowledge(&mut self) -> PwmEvents {
        let status = self.tim.sr.read();
        let events = PwmEvents {
            update: status.get_bit(tim::SR_UIF),
            compare: status.get_bits(tim::SR_CC1IF, 4) as u8,
        };
        // Flags raised after the read stay set
        let handled = status & 0x1F;
        self.tim.sr.write(!handled);
        events
    }

    fn set_power_state(&mut self, state: PwmPowerState) {
        match state {
            PwmPowerState::FullPower => self.tim.cr1.modify(|v| v.set_bit(tim::CR1_CEN)),
            PwmPowerState::ReducedPower => self.tim.cr1.modify(|v| v.clr_bit(tim::CR1_CEN)),
        }
    }
}
