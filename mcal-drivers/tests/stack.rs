//! Upper drivers over the STM32G0 arch layer, on RAM register blocks

use core::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::digital::{InputPin, OutputPin};
use mcal_core::config::{
    ChannelGroup, ChannelId, DioConfig, GptChannelConfig, GptConfig, GptMode, GptTimer,
    PinDirection, PinMode, PortConfig, PortId, PortPin, PortPinConfig, Pull, Speed, PORT_COUNT,
};
use mcal_core::det::RecordingDet;
use mcal_core::Level;
use mcal_drivers::dio::Dio;
use mcal_drivers::gpt::{ChannelState, Gpt};
use mcal_drivers::port::Port;
use mcal_hal_stm32g0::nvic::irq;
use mcal_hal_stm32g0::regs::{GpioRegisters, NvicRegisters, TimRegisters};
use mcal_hal_stm32g0::{Nvic, Stm32g0Dio, Stm32g0Gpt, Stm32g0Port};
use proptest::prelude::*;

const LED: ChannelId = ChannelId::new(PortId::A, 5);
const BUTTON: ChannelId = ChannelId::new(PortId::C, 13);
const BUS: ChannelGroup = match ChannelGroup::new(PortId::B, 0, 8) {
    Some(group) => group,
    None => panic!(),
};

const PINS: [PortPinConfig; 3] = [
    PortPinConfig {
        speed: Speed::High,
        ..PortPinConfig::new(PortPin::new(PortId::A, 5), PinMode::OUTPUT)
    },
    PortPinConfig {
        pull: Pull::Up,
        direction_changeable: true,
        ..PortPinConfig::new(PortPin::new(PortId::C, 13), PinMode::INPUT)
    },
    PortPinConfig {
        mode_changeable: true,
        ..PortPinConfig::new(PortPin::new(PortId::B, 13), PinMode::INPUT)
    },
];
const PORT_CONFIG: PortConfig<'static> = PortConfig { pins: &PINS };
const DIO_CONFIG: DioConfig<'static> = DioConfig {
    ports: &[PortId::A, PortId::B, PortId::C],
    channels: &[LED, BUTTON],
    groups: &[BUS],
};

fn blocks() -> [GpioRegisters; PORT_COUNT] {
    core::array::from_fn(|_| GpioRegisters::new())
}

/// Play the GPIO hardware: apply BSRR to ODR and loop ODR back to IDR
fn settle(gpio: &GpioRegisters) {
    let bsrr = gpio.bsrr.read();
    let odr = (gpio.odr.read() | (bsrr & 0xFFFF)) & !(bsrr >> 16);
    gpio.odr.write(odr);
    gpio.bsrr.write(0);
    gpio.idr.write(odr);
}

#[test]
fn test_port_and_dio_share_registers() {
    let gpio = blocks();
    let det = RecordingDet::<8>::new();
    let mut port = Port::new(Stm32g0Port::new(gpio.each_ref()), &det);
    let dio = Dio::new(Stm32g0Dio::from_gpio(gpio.each_ref()), &DIO_CONFIG, &det);
    let a = &gpio[PortId::A.index()];
    let c = &gpio[PortId::C.index()];

    port.init(Some(&PORT_CONFIG)).unwrap();
    assert_eq!(a.moder.read(), 0b01 << 10);
    assert_eq!(a.ospeedr.read(), 0b10 << 10);
    assert_eq!(c.pupdr.read(), 0b01 << 26);

    dio.write_channel(LED, Level::High);
    settle(a);
    assert_eq!(dio.read_channel(LED), Level::High);
    assert_eq!(dio.flip_channel(LED), Level::High);
    settle(a);
    assert_eq!(dio.read_channel(LED), Level::Low);

    // PC13 may become an output at runtime
    port.set_pin_direction(1, PinDirection::Out).unwrap();
    assert_eq!(c.moder.read(), 0b01 << 26);
    dio.write_channel(BUTTON, Level::High);
    assert_eq!(c.odr.read(), 1 << 13);
    assert!(det.is_empty());
}

#[test]
fn test_embedded_hal_pins_over_the_stack() {
    let gpio = blocks();
    let det = RecordingDet::<8>::new();
    let mut port = Port::new(Stm32g0Port::new(gpio.each_ref()), &det);
    let dio = Dio::new(Stm32g0Dio::from_gpio(gpio.each_ref()), &DIO_CONFIG, &det);
    port.init(Some(&PORT_CONFIG)).unwrap();

    let mut led = dio.pin(LED);
    let mut button = dio.pin(BUTTON);

    led.set_high().unwrap();
    assert_eq!(gpio[PortId::A.index()].odr.read(), 1 << 5);

    gpio[PortId::C.index()].idr.write(1 << 13);
    assert!(button.is_high().unwrap());
    gpio[PortId::C.index()].idr.write(0);
    assert!(button.is_low().unwrap());
}

#[test]
fn test_alternate_function_switch() {
    let gpio = blocks();
    let det = RecordingDet::<8>::new();
    let mut port = Port::new(Stm32g0Port::new(gpio.each_ref()), &det);
    port.init(Some(&PORT_CONFIG)).unwrap();

    let b = &gpio[PortId::B.index()];
    b.afrh.write(0x0000_0003);
    port.set_pin_mode(2, PinMode::alternate(7)).unwrap();
    assert_eq!(b.afrh.read(), 0x0070_0003);
}

static TICKS: AtomicU32 = AtomicU32::new(0);

fn on_tick() {
    TICKS.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn test_gpt_interrupt_path() {
    const CHANNELS: [GptChannelConfig; 1] = [GptChannelConfig {
        channel_id: 0,
        timer: GptTimer::Tim6,
        mode: GptMode::Continuous,
        prescaler: 15_999,
        notification: Some(on_tick),
    }];
    const CONFIG: GptConfig<'static> = GptConfig {
        channels: &CHANNELS,
    };

    let (tim6, tim7) = (TimRegisters::new(), TimRegisters::new());
    let nvic_regs = NvicRegisters::new();
    let nvic = Nvic::new(&nvic_regs);
    let det = RecordingDet::<8>::new();
    let mut gpt = Gpt::new(Stm32g0Gpt::new([&tim6, &tim7]), &det);

    nvic.set_priority(irq::TIM6_DAC_LPTIM1, 2);
    nvic.enable_irq(irq::TIM6_DAC_LPTIM1);
    assert_eq!(nvic_regs.iser[0].read(), 1 << irq::TIM6_DAC_LPTIM1);

    gpt.init(Some(&CONFIG)).unwrap();
    gpt.enable_notification(0).unwrap();
    gpt.start_timer(0, 1000).unwrap();
    assert_eq!(tim6.psc.read(), 15_999);
    assert_eq!(tim6.arr.read(), 1000);

    let before = TICKS.load(Ordering::SeqCst);
    for _ in 0..3 {
        // Counter wrapped: the hardware latches UIF and pends the IRQ
        tim6.sr.write(0x01);
        nvic.set_pending_irq(irq::TIM6_DAC_LPTIM1);
        if nvic.get_pending_irq(irq::TIM6_DAC_LPTIM1) {
            nvic.clear_pending_irq(irq::TIM6_DAC_LPTIM1);
            gpt.notification_pending();
        }
    }

    assert_eq!(TICKS.load(Ordering::SeqCst), before + 3);
    assert_eq!(tim6.sr.read(), 0);
    assert_eq!(gpt.channel_state(0), Some(ChannelState::Running));
    assert!(det.is_empty());
}

proptest! {
    #[test]
    fn prop_write_then_read_channel(levels in proptest::collection::vec(any::<bool>(), 1..16)) {
        let gpio = blocks();
        let det = RecordingDet::<4>::new();
        let dio = Dio::new(Stm32g0Dio::from_gpio(gpio.each_ref()), &DIO_CONFIG, &det);
        let a = &gpio[PortId::A.index()];

        for high in levels {
            let level = Level::from(high);
            dio.write_channel(LED, level);
            settle(a);
            prop_assert_eq!(dio.read_channel(LED), level);
        }
    }

    #[test]
    fn prop_flip_twice_is_identity(odr in 0u32..0x1_0000) {
        let gpio = blocks();
        let det = RecordingDet::<4>::new();
        let dio = Dio::new(Stm32g0Dio::from_gpio(gpio.each_ref()), &DIO_CONFIG, &det);
        let a = &gpio[PortId::A.index()];
        a.odr.write(odr);
        settle(a);

        dio.flip_channel(LED);
        settle(a);
        dio.flip_channel(LED);
        settle(a);

        prop_assert_eq!(a.odr.read(), odr);
        prop_assert_eq!(a.idr.read(), odr);
    }

    #[test]
    fn prop_channel_group_round_trip(value in 0u32..0x100, rest in 0u32..0x1_0000) {
        let gpio = blocks();
        let det = RecordingDet::<4>::new();
        let dio = Dio::new(Stm32g0Dio::from_gpio(gpio.each_ref()), &DIO_CONFIG, &det);
        let b = &gpio[PortId::B.index()];
        b.odr.write(rest);

        dio.write_channel_group(Some(&BUS), value);
        settle(b);

        prop_assert_eq!(dio.read_channel_group(Some(&BUS)), value);
        prop_assert_eq!(b.odr.read() & 0xFF00, rest & 0xFF00);
    }
}
