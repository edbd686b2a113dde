//! G0 MCAL demo firmware
//!
//! Brings the NUCLEO-G071RB up through the MCAL drivers: clocks, pins,
//! a periodic GPT tick, a dimmable PWM output and a boot counter kept in
//! the last flash pages.
//!
//! Interrupts are dispatched from `DefaultHandler`; there is no PAC, so
//! the vector table cortex-m-rt emits points every device interrupt there.

#![no_std]
#![no_main]

use core::cell::RefCell;

use cortex_m::interrupt::{self, Mutex};
use cortex_m_rt::{entry, exception};
use defmt::*;
use portable_atomic::{AtomicU32, Ordering};
use {defmt_rtt as _, panic_probe as _};

use mcal_core::config::{FlsStatus, JobResult, PllStatus, PWM_DUTY_MAX};
use mcal_core::crc::calculate_crc32;
use mcal_core::det::DefmtDet;
use mcal_core::{Det, DetConfig, Level};
use mcal_drivers::dio::Dio;
use mcal_drivers::fls::Fls;
use mcal_drivers::gpt::Gpt;
use mcal_drivers::mcu::Mcu;
use mcal_drivers::port::Port;
use mcal_drivers::pwm::Pwm;
use mcal_hal_stm32g0::dio::Stm32g0Dio;
use mcal_hal_stm32g0::fls::Stm32g0Flash;
use mcal_hal_stm32g0::gpt::Stm32g0Gpt;
use mcal_hal_stm32g0::mcu::Stm32g0Mcu;
use mcal_hal_stm32g0::nvic::{irq, Nvic};
use mcal_hal_stm32g0::port::Stm32g0Port;
use mcal_hal_stm32g0::pwm::Stm32g0Pwm;

mod board;

type BoardGpt = Gpt<'static, Stm32g0Gpt<'static>, DefmtDet>;
type BoardPwm = Pwm<'static, Stm32g0Pwm<'static>, DefmtDet>;
type BoardFls<'a> = Fls<'a, Stm32g0Flash<'static>, DefmtDet>;

static DET: DefmtDet = DefmtDet::new();

/// Drivers shared with interrupt context
static GPT: Mutex<RefCell<Option<BoardGpt>>> = Mutex::new(RefCell::new(None));
static PWM: Mutex<RefCell<Option<BoardPwm>>> = Mutex::new(RefCell::new(None));

/// GPT ticks since start-up
static TICKS: AtomicU32 = AtomicU32::new(0);

/// Notification of the tick channel
fn on_tick() {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

/// Duty steps of the dimmer, one per tick
const DIMMER_STEPS: [u16; 4] = [0x0800, 0x2000, 0x4000, PWM_DUTY_MAX];

#[entry]
fn main() -> ! {
    info!("G0 MCAL demo starting...");

    DET.init(&DetConfig::default());
    DET.start();

    // -----------------------------------------------------------------
    // Clocks
    // -----------------------------------------------------------------
    // SAFETY: each peripheral is stolen once, here, and owned by its driver
    let mut mcu = Mcu::new(unsafe { Stm32g0Mcu::steal() }, &DET);
    if mcu.init(Some(&board::MCU)).is_err() {
        error!("MCU init failed");
    }
    info!(
        "Reset: {} (RCC_CSR {=u32:#x})",
        mcu.get_reset_reason(),
        mcu.get_reset_raw_value()
    );

    if mcu.init_clock(board::CLOCK_PLL_64MHZ).is_ok() {
        while mcu.get_pll_status() != PllStatus::Locked {}
        if mcu.distribute_pll_clock().is_ok() {
            info!("SYSCLK from PLL, 64 MHz");
        }
    } else {
        warn!("PLL setup failed, staying on HSI16");
    }

    // -----------------------------------------------------------------
    // Pins
    // -----------------------------------------------------------------
    // SAFETY: GPIO clocks were enabled by init_clock
    let mut port = Port::new(unsafe { Stm32g0Port::steal() }, &DET);
    if port.init(Some(&board::PORT)).is_err() {
        error!("PORT init failed");
    }
    // SAFETY: DIO only touches IDR/ODR/BSRR, which PORT leaves alone
    let dio = Dio::new(unsafe { Stm32g0Dio::steal() }, &board::DIO, &DET);
    dio.write_channel(board::LED, Level::Low);

    // -----------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------
    // SAFETY: TIM6/TIM7 are only driven through this GPT instance
    let mut gpt = Gpt::new(unsafe { Stm32g0Gpt::steal() }, &DET);
    // SAFETY: TIM3 is only driven through this PWM instance
    let mut pwm = Pwm::new(unsafe { Stm32g0Pwm::steal() }, &DET);

    let gpt_ok = gpt.init(Some(&board::GPT)).is_ok()
        && gpt.enable_notification(board::TICK_CHANNEL).is_ok()
        && gpt
            .start_timer(board::TICK_CHANNEL, board::TICK_PERIOD_MS)
            .is_ok();
    if !gpt_ok {
        error!("GPT setup failed");
    }
    if pwm.init(Some(&board::PWM)).is_err() {
        error!("PWM init failed");
    }

    interrupt::free(|cs| {
        GPT.borrow(cs).replace(Some(gpt));
        PWM.borrow(cs).replace(Some(pwm));
    });

    // SAFETY: the NVIC is only touched here, before interrupts run
    let nvic = unsafe { Nvic::steal() };
    nvic.set_priority(irq::TIM6_DAC_LPTIM1, 2);
    nvic.set_priority(irq::TIM3, 3);
    nvic.enable_irq(irq::TIM6_DAC_LPTIM1);
    nvic.enable_irq(irq::TIM3);

    // -----------------------------------------------------------------
    // Boot record
    // -----------------------------------------------------------------
    let mut stored = [0u8; board::BOOT_RECORD_LEN];
    let mut record = [0u8; board::BOOT_RECORD_LEN];
    // SAFETY: the boot record pages are outside the image in memory.x
    let mut fls = Fls::new(unsafe { Stm32g0Flash::steal() }, &DET);
    if fls.init(Some(&board::FLS)).is_err() {
        error!("FLS init failed");
    }

    let boots = match read_record(&mut fls, &mut stored) {
        Some(count) => count.wrapping_add(1),
        None => 1,
    };
    encode_record(boots, &mut record);
    if write_record(&mut fls, &record) {
        info!("Boot #{}", boots);
    } else {
        warn!("Boot #{} not persisted", boots);
    }

    info!("Running");

    // -----------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------
    let mut seen = 0;
    loop {
        fls.main_function();

        let ticks = TICKS.load(Ordering::Relaxed);
        if ticks != seen {
            seen = ticks;
            dio.flip_channel(board::LED);

            let pressed = dio.read_channel(board::BUTTON) == Level::Low;
            let step = DIMMER_STEPS[ticks as usize % DIMMER_STEPS.len()];
            interrupt::free(|cs| {
                if let Some(pwm) = PWM.borrow(cs).borrow_mut().as_mut() {
                    let _ = if pressed {
                        pwm.set_output_to_idle(board::DIMMER)
                    } else {
                        pwm.set_duty_cycle(board::DIMMER, step)
                    };
                }
            });
        }

        // Sleep until the next interrupt
        mcu.set_mode(board::MODE_SLEEP);
    }
}

/// Run the pending FLS job to completion
fn finish_job(fls: &mut BoardFls<'_>) -> JobResult {
    while fls.get_status() == FlsStatus::Busy {
        fls.main_function();
    }
    fls.get_job_result()
}

/// Boot counter stored in flash, if the record is intact
fn read_record<'a>(fls: &mut BoardFls<'a>, buffer: &'a mut [u8]) -> Option<u32> {
    if fls.read(board::BOOT_RECORD, Some(buffer)).is_err() {
        return None;
    }
    let result = finish_job(fls);
    let stored = fls.take_buffer()?;
    if result != JobResult::Ok {
        return None;
    }

    let (count, crc) = stored.split_at(4);
    let count_bytes: [u8; 4] = count.try_into().ok()?;
    let crc_bytes: [u8; 4] = crc.try_into().ok()?;
    (calculate_crc32(count, 0, true) == u32::from_le_bytes(crc_bytes))
        .then(|| u32::from_le_bytes(count_bytes))
}

/// Counter word followed by its CRC-32, both little-endian
fn encode_record(count: u32, record: &mut [u8; board::BOOT_RECORD_LEN]) {
    let count = count.to_le_bytes();
    record[..4].copy_from_slice(&count);
    record[4..].copy_from_slice(&calculate_crc32(&count, 0, true).to_le_bytes());
}

/// Erase the record sector and program `record`
fn write_record<'a>(fls: &mut BoardFls<'a>, record: &'a [u8]) -> bool {
    if fls.erase(board::BOOT_RECORD, board::FLS.sector_size).is_err()
        || finish_job(fls) != JobResult::Ok
    {
        return false;
    }
    fls.write(board::BOOT_RECORD, Some(record)).is_ok() && finish_job(fls) == JobResult::Ok
}

#[exception]
unsafe fn DefaultHandler(irqn: i16) {
    let Ok(irqn) = u8::try_from(irqn) else {
        return;
    };
    interrupt::free(|cs| match irqn {
        irq::TIM6_DAC_LPTIM1 | irq::TIM7_LPTIM2 => {
            if let Some(gpt) = GPT.borrow(cs).borrow_mut().as_mut() {
                gpt.notification_pending();
            }
        }
        irq::TIM3 => {
            if let Some(pwm) = PWM.borrow(cs).borrow_mut().as_mut() {
                pwm.notification();
            }
        }
        _ => {}
    });
}

#[exception]
unsafe fn HardFault(frame: &cortex_m_rt::ExceptionFrame) -> ! {
    error!("HardFault at {=u32:#x}", frame.pc());
    loop {
        cortex_m::asm::bkpt();
    }
}
