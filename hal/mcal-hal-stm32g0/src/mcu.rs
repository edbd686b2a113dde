//! MCU arch: RCC, flash latency, reset and low-power entry

use mcal_core::config::{ClockSource, McuClockConfig, McuMode, McuRamSection, ResetReason};
use mcal_core::Bfx;
use mcal_hal::{McuArch, McuArchError};

use crate::regs::{flash, rcc, FlashRegisters, RccRegisters};

/// Polls of PLLRDY while waiting for the PLL to stop
const PLL_STOP_POLLS: u32 = 10_000;
/// Polls of CFGR.SWS while waiting for SYSCLK to leave the PLL
const CLOCK_SWITCH_POLLS: u32 = 10_000;

/// Drives RCC and the flash access control register
pub struct Stm32g0Mcu<'r> {
    rcc: &'r RccRegisters,
    flash: &'r FlashRegisters,
}

impl Stm32g0Mcu<'static> {
    /// # Safety
    ///
    /// Only valid on the target.
    pub unsafe fn steal() -> Self {
        unsafe { Self::new(RccRegisters::steal(), FlashRegisters::steal()) }
    }
}

impl<'r> Stm32g0Mcu<'r> {
    pub fn new(rcc: &'r RccRegisters, flash: &'r FlashRegisters) -> Self {
        Self { rcc, flash }
    }

    fn wait_pll_stopped(&self) -> Result<(), McuArchError> {
        for _ in 0..PLL_STOP_POLLS {
            if !self.pll_locked() {
                return Ok(());
            }
        }
        Err(McuArchError::PllTimeout)
    }

    fn running_from_pll(&self) -> bool {
        self.rcc.cfgr.read().get_bits(rcc::CFGR_SWS, rcc::CFGR_SW_LEN) == rcc::SW_PLLRCLK
    }

    /// Move SYSCLK to HSI16 so the PLL can be stopped
    fn switch_to_hsisys(&self) -> Result<(), McuArchError> {
        self.rcc
            .cfgr
            .modify(|v| v.put_bits(rcc::CFGR_SW, rcc::CFGR_SW_LEN, rcc::SW_HSISYS));
        for _ in 0..CLOCK_SWITCH_POLLS {
            if !self.running_from_pll() {
                return Ok(());
            }
        }
        Err(McuArchError::ClockSwitchTimeout)
    }
}

/// PLLCFGR word for HSI16 input and the R output enabled
fn pllcfgr_value(m: u8, n: u8, r: u8) -> u32 {
    let mut value = 0u32;
    value.put_bits(rcc::PLLCFGR_PLLSRC, 2, rcc::PLLSRC_HSI16);
    value.put_bits(rcc::PLLCFGR_PLLM, 3, u32::from(m - 1));
    value.put_bits(rcc::PLLCFGR_PLLN, 7, u32::from(n));
    value.set_bit(rcc::PLLCFGR_PLLREN);
    value.put_bits(rcc::PLLCFGR_PLLR, 3, u32::from(r - 1));
    value
}

impl McuArch for Stm32g0Mcu<'_> {
    fn init_clock(&mut self, clock: &McuClockConfig) -> Result<(), McuArchError> {
        if !clock.is_valid() {
            return Err(McuArchError::InvalidClock);
        }

        let latency = u32::from(clock.flash_latency);
        self.flash
            .acr
            .modify(|v| v.put_bits(flash::ACR_LATENCY, flash::ACR_LATENCY_LEN, latency));
        self.rcc.iopenr.modify(|v| v.set_bit_mask(clock.iop_enable));
        self.rcc.apbenr1.modify(|v| v.set_bit_mask(clock.apb1_enable));
        self.rcc.apbenr2.modify(|v| v.set_bit_mask(clock.apb2_enable));

        match (clock.source, clock.pll) {
            (ClockSource::Hsi16, _) => {
                self.rcc.cr.modify(|v| v.set_bit(rcc::CR_HSION));
                Ok(())
            }
            (ClockSource::Pll, Some(pll)) => {
                // PLLON cannot be cleared while the PLL clocks the core
                if self.running_from_pll() {
                    self.switch_to_hsisys()?;
                }
                self.rcc.cr.modify(|v| v.clr_bit(rcc::CR_PLLON));
                self.wait_pll_stopped()?;
                self.rcc.pllcfgr.write(pllcfgr_value(pll.m, pll.n, pll.r));
                self.rcc.cr.modify(|v| v.set_bit(rcc::CR_PLLON));
                Ok(())
            }
            (ClockSource::Pll, None) => Err(McuArchError::InvalidClock),
        }
    }

    fn distribute_pll_clock(&mut self) {
        self.rcc
            .cfgr
            .modify(|v| v.put_bits(rcc::CFGR_SW, rcc::CFGR_SW_LEN, rcc::SW_PLLRCLK));
    }

    fn pll_locked(&self) -> bool {
        self.rcc.cr.read().get_bit(rcc::CR_PLLRDY)
    }

    fn reset_raw_value(&self) -> u32 {
        self.rcc.csr.read() & rcc::CSR_RESET_FLAGS
    }

    fn reset_reason(&self) -> ResetReason {
        let csr = self.rcc.csr.read();
        // The pin flag accompanies every internal reset, so it is checked last
        if csr.get_bit(rcc::CSR_PWRRSTF) {
            ResetReason::PowerOn
        } else if csr.get_bit(rcc::CSR_IWDGRSTF) || csr.get_bit(rcc::CSR_WWDGRSTF) {
            ResetReason::Watchdog
        } else if csr.get_bit(rcc::CSR_SFTRSTF) {
            ResetReason::Software
        } else if csr.get_bit(rcc::CSR_LPWRRSTF) {
            ResetReason::LowPower
        } else if csr.get_bit(rcc::CSR_OBLRSTF) {
            ResetReason::OptionByte
        } else if csr.get_bit(rcc::CSR_PINRSTF) {
            ResetReason::Pin
        } else {
            ResetReason::Undefined
        }
    }

    fn clear_reset_flags(&mut self) {
        self.rcc.csr.modify(|v| v.set_bit(rcc::CSR_RMVF));
    }

    fn init_ram_section(&mut self, section: &McuRamSection) {
        // McuRamSection::new is unsafe and requires the region to be
        // writable and not owned by any live object.
        unsafe {
            core::ptr::write_bytes(
                section.base() as *mut u8,
                section.default_value(),
                section.size(),
            );
        }
    }

    fn perform_reset(&mut self) {
        cortex_m::peripheral::SCB::sys_reset();
    }

    fn set_mode(&mut self, mode: McuMode) {
        // Stop 0 is the reset value of PWR_CR1.LPMS
        let mut peripherals = unsafe { cortex_m::Peripherals::steal() };
        match mode {
            McuMode::Run => {}
            McuMode::Sleep => {
                peripherals.SCB.clear_sleepdeep();
                cortex_m::asm::wfi();
            }
            McuMode::Stop => {
                peripherals.SCB.set_sleepdeep();
                cortex_m::asm::wfi();
                peripherals.SCB.clear_sleepdeep();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcal_core::config::PllConfig;

    fn pll_clock() -> McuClockConfig {
        McuClockConfig {
            source: ClockSource::Pll,
            pll: Some(PllConfig { m: 1, n: 8, r: 2 }),
            flash_latency: 2,
            iop_enable: 0b1111,
            apb1_enable: rcc::APBENR1_TIM3EN | rcc::APBENR1_TIM6EN,
            apb2_enable: 0,
        }
    }

    #[test]
    fn test_init_clock_programs_pll() {
        let rcc_regs = RccRegisters::new();
        let flash_regs = FlashRegisters::new();
        let mut mcu = Stm32g0Mcu::new(&rcc_regs, &flash_regs);

        assert_eq!(mcu.init_clock(&pll_clock()), Ok(()));

        assert_eq!(rcc_regs.pllcfgr.read(), 0x3000_0802);
        assert!(rcc_regs.cr.read().get_bit(rcc::CR_PLLON));
        assert_eq!(flash_regs.acr.read(), 2);
        assert_eq!(rcc_regs.iopenr.read(), 0b1111);
        assert_eq!(rcc_regs.apbenr1.read(), 0b1_0010);
        assert_eq!(rcc_regs.cfgr.read(), 0);
    }

    #[test]
    fn test_init_clock_leaves_pll_before_reprogramming() {
        let rcc_regs = RccRegisters::new();
        let flash_regs = FlashRegisters::new();
        // Already running from a locked PLL
        rcc_regs
            .cfgr
            .write((rcc::SW_PLLRCLK << rcc::CFGR_SWS) | rcc::SW_PLLRCLK);
        rcc_regs
            .cr
            .write((1 << rcc::CR_PLLON) | (1 << rcc::CR_PLLRDY));
        let mut mcu = Stm32g0Mcu::new(&rcc_regs, &flash_regs);

        // SWS never follows in RAM, so the switch times out
        assert_eq!(
            mcu.init_clock(&pll_clock()),
            Err(McuArchError::ClockSwitchTimeout)
        );
        let cfgr = rcc_regs.cfgr.read();
        assert_eq!(cfgr.get_bits(rcc::CFGR_SW, rcc::CFGR_SW_LEN), rcc::SW_HSISYS);
        // The PLL feeding SYSCLK was left running and untouched
        assert!(rcc_regs.cr.read().get_bit(rcc::CR_PLLON));
        assert_eq!(rcc_regs.pllcfgr.read(), 0);
    }

    #[test]
    fn test_init_clock_times_out_when_pll_never_stops() {
        let rcc_regs = RccRegisters::new();
        let flash_regs = FlashRegisters::new();
        rcc_regs.cr.write(1 << rcc::CR_PLLRDY);
        let mut mcu = Stm32g0Mcu::new(&rcc_regs, &flash_regs);

        assert_eq!(mcu.init_clock(&pll_clock()), Err(McuArchError::PllTimeout));
        assert_eq!(rcc_regs.pllcfgr.read(), 0);
    }

    #[test]
    fn test_distribute_selects_pll() {
        let rcc_regs = RccRegisters::new();
        let flash_regs = FlashRegisters::new();
        let mut mcu = Stm32g0Mcu::new(&rcc_regs, &flash_regs);

        assert!(!mcu.pll_locked());
        rcc_regs.cr.write(1 << rcc::CR_PLLRDY);
        assert!(mcu.pll_locked());
        mcu.distribute_pll_clock();
        assert_eq!(rcc_regs.cfgr.read(), rcc::SW_PLLRCLK);
    }

    #[test]
    fn test_reset_reason() {
        let rcc_regs = RccRegisters::new();
        let flash_regs = FlashRegisters::new();
        let mut mcu = Stm32g0Mcu::new(&rcc_regs, &flash_regs);

        rcc_regs.csr.write((1 << rcc::CSR_PWRRSTF) | (1 << rcc::CSR_PINRSTF));
        assert_eq!(mcu.reset_reason(), ResetReason::PowerOn);
        assert_eq!(mcu.reset_raw_value(), 0x0C00_0000);

        rcc_regs.csr.write((1 << rcc::CSR_SFTRSTF) | (1 << rcc::CSR_PINRSTF) | 0x0000_0001);
        assert_eq!(mcu.reset_reason(), ResetReason::Software);
        assert_eq!(mcu.reset_raw_value(), 0x1400_0000);

        rcc_regs.csr.write(1 << rcc::CSR_PINRSTF);
        assert_eq!(mcu.reset_reason(), ResetReason::Pin);

        rcc_regs.csr.write(1 << rcc::CSR_IWDGRSTF);
        assert_eq!(mcu.reset_reason(), ResetReason::Watchdog);

        rcc_regs.csr.write(0);
        assert_eq!(mcu.reset_reason(), ResetReason::Undefined);

        mcu.clear_reset_flags();
        assert!(rcc_regs.csr.read().get_bit(rcc::CSR_RMVF));
    }

    #[test]
    fn test_init_ram_section_fills_region() {
        let rcc_regs = RccRegisters::new();
        let flash_regs = FlashRegisters::new();
        let mut mcu = Stm32g0Mcu::new(&rcc_regs, &flash_regs);
        let mut buffer = [0u8; 16];
        let section = unsafe { McuRamSection::new(buffer.as_mut_ptr() as usize + 4, 8, 0xA5) };

        mcu.init_ram_section(&section);

        assert_eq!(buffer[..4], [0; 4]);
        assert_eq!(buffer[4..12], [0xA5; 8]);
        assert_eq!(buffer[12..], [0; 4]);
    }
}
