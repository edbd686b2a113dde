//! NUCLEO-G071RB configuration tables
//!
//! LD4 on PA5, the user button on PC13 and a PWM output on PA6
//! (TIM3_CH1, AF1). TIM6 paces the main loop; the last two flash pages
//! hold the boot record.

use mcal_core::config::{
    ChannelGroup, ChannelId, ClockSource, DioConfig, FlsConfig, FlsMode, GptChannelConfig,
    GptConfig, GptMode, GptTimer, McuClockConfig, McuConfig, McuMode, PinMode, PllConfig,
    PortConfig, PortId, PortPin, PortPinConfig, Pull, PwmChannelClass, PwmChannelConfig,
    PwmConfig, PwmPolarity, Speed,
};
use mcal_core::Level;
use mcal_hal_stm32g0::regs::rcc;

use crate::on_tick;

// ---------------------------------------------------------------------------
// Pins
// ---------------------------------------------------------------------------

pub const LED: ChannelId = ChannelId::new(PortId::A, 5);
pub const BUTTON: ChannelId = ChannelId::new(PortId::C, 13);

/// Alternate function of TIM3_CH1 on PA6
const AF_TIM3: u8 = 1;

static PINS: [PortPinConfig; 3] = [
    PortPinConfig {
        speed: Speed::Low,
        ..PortPinConfig::new(PortPin::new(PortId::A, 5), PinMode::OUTPUT)
    },
    PortPinConfig {
        pull: Pull::Up,
        ..PortPinConfig::new(PortPin::new(PortId::C, 13), PinMode::INPUT)
    },
    PortPinConfig {
        speed: Speed::High,
        ..PortPinConfig::new(PortPin::new(PortId::A, 6), PinMode::alternate(AF_TIM3))
    },
];

pub static PORT: PortConfig<'static> = PortConfig { pins: &PINS };

/// LD4 is bit 5 of port A
pub const LED_GROUP: ChannelGroup = match ChannelGroup::new(PortId::A, 5, 1) {
    Some(group) => group,
    None => panic!("LED group does not fit port A"),
};

pub static DIO: DioConfig<'static> = DioConfig {
    ports: &[PortId::A, PortId::C],
    channels: &[LED, BUTTON],
    groups: &[LED_GROUP],
};

// ---------------------------------------------------------------------------
// MCU
// ---------------------------------------------------------------------------

/// Clock setting index of the 64 MHz PLL configuration
pub const CLOCK_PLL_64MHZ: u8 = 0;
/// Mode index of sleep-until-interrupt
pub const MODE_SLEEP: u8 = 1;

static CLOCKS: [McuClockConfig; 1] = [McuClockConfig {
    source: ClockSource::Pll,
    // 16 MHz / 1 * 8 / 2
    pll: Some(PllConfig { m: 1, n: 8, r: 2 }),
    flash_latency: 2,
    // GPIOA, GPIOB, GPIOC
    iop_enable: 0b111,
    apb1_enable: rcc::APBENR1_TIM3EN
        | rcc::APBENR1_TIM6EN
        | rcc::APBENR1_TIM7EN
        | rcc::APBENR1_PWREN,
    apb2_enable: 0,
}];

pub static MCU: McuConfig<'static> = McuConfig {
    clock_settings: &CLOCKS,
    ram_sections: &[],
    modes: &[McuMode::Run, McuMode::Sleep],
};

// ---------------------------------------------------------------------------
// GPT
// ---------------------------------------------------------------------------

/// GPT channel on TIM6
pub const TICK_CHANNEL: u8 = 0;
/// 64 MHz / (63_999 + 1) = 1 kHz timer clock
const TICK_PRESCALER: u16 = 63_999;
/// Tick period in milliseconds
pub const TICK_PERIOD_MS: u32 = 250;

static GPT_CHANNELS: [GptChannelConfig; 1] = [GptChannelConfig {
    channel_id: TICK_CHANNEL,
    timer: GptTimer::Tim6,
    mode: GptMode::Continuous,
    prescaler: TICK_PRESCALER,
    notification: Some(on_tick),
}];

pub static GPT: GptConfig<'static> = GptConfig {
    channels: &GPT_CHANNELS,
};

// ---------------------------------------------------------------------------
// PWM
// ---------------------------------------------------------------------------

/// PWM channel number of PA6
pub const DIMMER: u8 = 1;

static PWM_CHANNELS: [PwmChannelConfig; 1] = [PwmChannelConfig {
    hw_channel: 1,
    class: PwmChannelClass::VariablePeriod,
    // 1 MHz timer clock, 1 kHz output
    period: 1000,
    duty: 0x2000,
    polarity: PwmPolarity::High,
    idle_state: Level::Low,
    notification: None,
}];

pub static PWM: PwmConfig<'static> = PwmConfig {
    // 64 MHz / (63 + 1)
    prescaler: 63,
    channels: &PWM_CHANNELS,
};

// ---------------------------------------------------------------------------
// FLS
// ---------------------------------------------------------------------------

/// Offset of the boot record inside the managed area
pub const BOOT_RECORD: u32 = 0;
/// Counter word followed by its CRC-32
pub const BOOT_RECORD_LEN: usize = 8;

pub static FLS: FlsConfig = FlsConfig {
    memory_base: 0x0800_0000,
    // Last two 2 KiB pages of the 128 KiB part
    erase_start: 0x0801_F000,
    sector_size: 2048,
    sector_count: 2,
    page_size: 8,
    erased_value: 0xFF,
    max_read_fast: 256,
    max_read_slow: 64,
    max_write_fast: 64,
    max_write_slow: 8,
    default_mode: FlsMode::Fast,
    job_end_notification: None,
    job_error_notification: None,
};
