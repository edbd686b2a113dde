//! STM32G0 register map
//!
//! Every register is a [`Reg`]: a 32-bit cell accessed only through
//! volatile loads and stores. Register blocks are `#[repr(C)]` records whose
//! field offsets are checked at compile time against the reference manual,
//! so a block can either be overlaid on its peripheral address or owned in
//! RAM by a host test.

use core::cell::UnsafeCell;
use core::mem::offset_of;
use core::ptr::{read_volatile, write_volatile};

use mcal_core::config::PortId;

/// One memory-mapped 32-bit register
#[repr(transparent)]
pub struct Reg(UnsafeCell<u32>);

// Accesses are single aligned words; the hardware serializes them.
unsafe impl Sync for Reg {}

impl Reg {
    pub const fn new(value: u32) -> Self {
        Self(UnsafeCell::new(value))
    }

    #[inline]
    pub fn read(&self) -> u32 {
        unsafe { read_volatile(self.0.get()) }
    }

    #[inline]
    pub fn write(&self, value: u32) {
        unsafe { write_volatile(self.0.get(), value) }
    }

    /// Read, let `f` change the value, write it back
    #[inline]
    pub fn modify(&self, f: impl FnOnce(&mut u32)) {
        let mut value = self.read();
        f(&mut value);
        self.write(value);
    }
}

impl Default for Reg {
    fn default() -> Self {
        Self::new(0)
    }
}

impl core::fmt::Debug for Reg {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#010x}", self.read())
    }
}

// ---------------------------------------------------------------------------
// Base addresses
// ---------------------------------------------------------------------------

pub const IOPORT_BASE: usize = 0x5000_0000;
/// Distance between consecutive GPIO ports
pub const GPIO_STRIDE: usize = 0x400;
pub const TIM3_BASE: usize = 0x4000_0400;
pub const TIM6_BASE: usize = 0x4000_1000;
pub const TIM7_BASE: usize = 0x4000_1400;
pub const RCC_BASE: usize = 0x4002_1000;
pub const FLASH_R_BASE: usize = 0x4002_2000;
pub const NVIC_BASE: usize = 0xE000_E100;

/// Start of the main flash memory
pub const FLASH_MEMORY_BASE: u32 = 0x0800_0000;
/// Size of the main flash (STM32G071xB)
pub const FLASH_MEMORY_SIZE: u32 = 128 * 1024;
/// Erase granule of the main flash
pub const FLASH_PAGE_SIZE: u32 = 2048;
/// Program granule of the main flash (one double word)
pub const FLASH_PROGRAM_SIZE: u32 = 8;

/// Address of the register block of `port`
pub const fn gpio_base(port: PortId) -> usize {
    IOPORT_BASE + GPIO_STRIDE * port as usize
}

// ---------------------------------------------------------------------------
// GPIO
// ---------------------------------------------------------------------------

/// GPIO port, configuration view (used by PORT)
#[derive(Debug, Default)]
#[repr(C)]
pub struct GpioRegisters {
    pub moder: Reg,
    pub otyper: Reg,
    pub ospeedr: Reg,
    pub pupdr: Reg,
    pub idr: Reg,
    pub odr: Reg,
    pub bsrr: Reg,
    pub lckr: Reg,
    pub afrl: Reg,
    pub afrh: Reg,
    pub brr: Reg,
}

/// GPIO port, data view (used by DIO)
///
/// Same memory as [`GpioRegisters`]; configuration words are opaque here.
#[derive(Debug)]
#[repr(C)]
pub struct DioRegisters {
    _config: [Reg; 4],
    pub idr: Reg,
    pub odr: Reg,
    pub bsrr: Reg,
    _lock_alternate: [Reg; 3],
    pub brr: Reg,
}

impl GpioRegisters {
    pub const fn new() -> Self {
        Self {
            moder: Reg::new(0),
            otyper: Reg::new(0),
            ospeedr: Reg::new(0),
            pupdr: Reg::new(0),
            idr: Reg::new(0),
            odr: Reg::new(0),
            bsrr: Reg::new(0),
            lckr: Reg::new(0),
            afrl: Reg::new(0),
            afrh: Reg::new(0),
            brr: Reg::new(0),
        }
    }

    /// Data view of the same port
    pub fn as_dio(&self) -> &DioRegisters {
        // Both views are #[repr(C)] sequences of the same number of `Reg`
        // cells, checked by the offset assertions below.
        unsafe { &*(self as *const Self as *const DioRegisters) }
    }

    /// Register block of `port` at its hardware address
    ///
    /// # Safety
    ///
    /// Only valid on the target, where the block is memory-mapped.
    pub unsafe fn steal(port: PortId) -> &'static Self {
        unsafe { &*(gpio_base(port) as *const Self) }
    }
}

const _: () = {
    assert!(offset_of!(GpioRegisters, moder) == 0x00);
    assert!(offset_of!(GpioRegisters, otyper) == 0x04);
    assert!(offset_of!(GpioRegisters, ospeedr) == 0x08);
    assert!(offset_of!(GpioRegisters, pupdr) == 0x0C);
    assert!(offset_of!(GpioRegisters, idr) == 0x10);
    assert!(offset_of!(GpioRegisters, odr) == 0x14);
    assert!(offset_of!(GpioRegisters, bsrr) == 0x18);
    assert!(offset_of!(GpioRegisters, lckr) == 0x1C);
    assert!(offset_of!(GpioRegisters, afrl) == 0x20);
    assert!(offset_of!(GpioRegisters, afrh) == 0x24);
    assert!(offset_of!(GpioRegisters, brr) == 0x28);
    assert!(offset_of!(DioRegisters, idr) == 0x10);
    assert!(offset_of!(DioRegisters, odr) == 0x14);
    assert!(offset_of!(DioRegisters, bsrr) == 0x18);
    assert!(offset_of!(DioRegisters, brr) == 0x28);
    assert!(core::mem::size_of::<GpioRegisters>() == core::mem::size_of::<DioRegisters>());
};

// ---------------------------------------------------------------------------
// General-purpose and basic timers
// ---------------------------------------------------------------------------

/// Timer register block (TIM3, TIM6, TIM7 share this layout up to CCR4)
#[derive(Debug)]
#[repr(C)]
pub struct TimRegisters {
    pub cr1: Reg,
    pub cr2: Reg,
    pub smcr: Reg,
    pub dier: Reg,
    pub sr: Reg,
    pub egr: Reg,
    pub ccmr1: Reg,
    pub ccmr2: Reg,
    pub ccer: Reg,
    pub cnt: Reg,
    pub psc: Reg,
    pub arr: Reg,
    pub rcr: Reg,
    pub ccr1: Reg,
    pub ccr2: Reg,
    pub ccr3: Reg,
    pub ccr4: Reg,
}

impl TimRegisters {
    pub const fn new() -> Self {
        Self {
            cr1: Reg::new(0),
            cr2: Reg::new(0),
            smcr: Reg::new(0),
            dier: Reg::new(0),
            sr: Reg::new(0),
            egr: Reg::new(0),
            ccmr1: Reg::new(0),
            ccmr2: Reg::new(0),
            ccer: Reg::new(0),
            cnt: Reg::new(0),
            psc: Reg::new(0),
            arr: Reg::new(0xFFFF),
            rcr: Reg::new(0),
            ccr1: Reg::new(0),
            ccr2: Reg::new(0),
            ccr3: Reg::new(0),
            ccr4: Reg::new(0),
        }
    }

    /// Register block at `base`
    ///
    /// # Safety
    ///
    /// `base` must be one of the timer base addresses and the code must run
    /// on the target.
    pub unsafe fn steal(base: usize) -> &'static Self {
        unsafe { &*(base as *const Self) }
    }

    /// Capture/compare register of channel 1-4
    pub fn ccr(&self, channel: u8) -> Option<&Reg> {
        match channel {
            1 => Some(&self.ccr1),
            2 => Some(&self.ccr2),
            3 => Some(&self.ccr3),
            4 => Some(&self.ccr4),
            _ => None,
        }
    }

    /// Capture/compare mode register holding channel 1-4
    pub fn ccmr(&self, channel: u8) -> &Reg {
        if channel <= 2 {
            &self.ccmr1
        } else {
            &self.ccmr2
        }
    }
}

impl Default for TimRegisters {
    fn default() -> Self {
        Self::new()
    }
}

const _: () = {
    assert!(offset_of!(TimRegisters, cr1) == 0x00);
    assert!(offset_of!(TimRegisters, cr2) == 0x04);
    assert!(offset_of!(TimRegisters, smcr) == 0x08);
    assert!(offset_of!(TimRegisters, dier) == 0x0C);
    assert!(offset_of!(TimRegisters, sr) == 0x10);
    assert!(offset_of!(TimRegisters, egr) == 0x14);
    assert!(offset_of!(TimRegisters, ccmr1) == 0x18);
    assert!(offset_of!(TimRegisters, ccmr2) == 0x1C);
    assert!(offset_of!(TimRegisters, ccer) == 0x20);
    assert!(offset_of!(TimRegisters, cnt) == 0x24);
    assert!(offset_of!(TimRegisters, psc) == 0x28);
    assert!(offset_of!(TimRegisters, arr) == 0x2C);
    assert!(offset_of!(TimRegisters, rcr) == 0x30);
    assert!(offset_of!(TimRegisters, ccr1) == 0x34);
    assert!(offset_of!(TimRegisters, ccr4) == 0x40);
};

/// Timer bit positions
pub mod tim {
    pub const CR1_CEN: u8 = 0;
    pub const CR1_UDIS: u8 = 1;
    pub const CR1_URS: u8 = 2;
    pub const CR1_OPM: u8 = 3;
    pub const CR1_ARPE: u8 = 7;

    pub const DIER_UIE: u8 = 0;
    /// CCxIE is at `DIER_CC1IE + x - 1`
    pub const DIER_CC1IE: u8 = 1;

    pub const SR_UIF: u8 = 0;
    /// CCxIF is at `SR_CC1IF + x - 1`
    pub const SR_CC1IF: u8 = 1;

    pub const EGR_UG: u8 = 0;

    /// Output compare mode field of the odd channel in a CCMR word
    pub const CCMR_OC_MODE_LOW: u8 = 4;
    /// Output compare preload enable of the odd channel in a CCMR word
    pub const CCMR_OC_PRELOAD_LOW: u8 = 3;
    /// Distance between the odd and even channel fields in a CCMR word
    pub const CCMR_CHANNEL_STRIDE: u8 = 8;
    pub const CCMR_OC_MODE_LEN: u8 = 3;

    pub const OC_MODE_FORCE_INACTIVE: u32 = 0b100;
    pub const OC_MODE_FORCE_ACTIVE: u32 = 0b101;
    pub const OC_MODE_PWM1: u32 = 0b110;

    /// CCxE is at `4 * (x - 1)`, CCxP one bit above
    pub const CCER_CHANNEL_STRIDE: u8 = 4;
    pub const CCER_CCP_OFFSET: u8 = 1;
}

// ---------------------------------------------------------------------------
// RCC
// ---------------------------------------------------------------------------

/// Reset and clock control
#[derive(Debug, Default)]
#[repr(C)]
pub struct RccRegisters {
    pub cr: Reg,
    pub icscr: Reg,
    pub cfgr: Reg,
    pub pllcfgr: Reg,
    _reserved0: Reg,
    pub crrcr: Reg,
    pub cier: Reg,
    pub cifr: Reg,
    pub cicr: Reg,
    pub ioprstr: Reg,
    pub ahbrstr: Reg,
    pub apbrstr1: Reg,
    pub apbrstr2: Reg,
    pub iopenr: Reg,
    pub ahbenr: Reg,
    pub apbenr1: Reg,
    pub apbenr2: Reg,
    pub iopsmenr: Reg,
    pub ahbsmenr: Reg,
    pub apbsmenr1: Reg,
    pub apbsmenr2: Reg,
    pub ccipr: Reg,
    _reserved1: Reg,
    pub bdcr: Reg,
    pub csr: Reg,
}

impl RccRegisters {
    pub const fn new() -> Self {
        Self {
            cr: Reg::new(0),
            icscr: Reg::new(0),
            cfgr: Reg::new(0),
            pllcfgr: Reg::new(0),
            _reserved0: Reg::new(0),
            crrcr: Reg::new(0),
            cier: Reg::new(0),
            cifr: Reg::new(0),
            cicr: Reg::new(0),
            ioprstr: Reg::new(0),
            ahbrstr: Reg::new(0),
            apbrstr1: Reg::new(0),
            apbrstr2: Reg::new(0),
            iopenr: Reg::new(0),
            ahbenr: Reg::new(0),
            apbenr1: Reg::new(0),
            apbenr2: Reg::new(0),
            iopsmenr: Reg::new(0),
            ahbsmenr: Reg::new(0),
            apbsmenr1: Reg::new(0),
            apbsmenr2: Reg::new(0),
            ccipr: Reg::new(0),
            _reserved1: Reg::new(0),
            bdcr: Reg::new(0),
            csr: Reg::new(0),
        }
    }

    /// # Safety
    ///
    /// Only valid on the target.
    pub unsafe fn steal() -> &'static Self {
        unsafe { &*(RCC_BASE as *const Self) }
    }
}

const _: () = {
    assert!(offset_of!(RccRegisters, cr) == 0x00);
    assert!(offset_of!(RccRegisters, cfgr) == 0x08);
    assert!(offset_of!(RccRegisters, pllcfgr) == 0x0C);
    assert!(offset_of!(RccRegisters, crrcr) == 0x14);
    assert!(offset_of!(RccRegisters, ioprstr) == 0x24);
    assert!(offset_of!(RccRegisters, iopenr) == 0x34);
    assert!(offset_of!(RccRegisters, apbenr1) == 0x3C);
    assert!(offset_of!(RccRegisters, apbenr2) == 0x40);
    assert!(offset_of!(RccRegisters, ccipr) == 0x54);
    assert!(offset_of!(RccRegisters, bdcr) == 0x5C);
    assert!(offset_of!(RccRegisters, csr) == 0x60);
};

/// RCC bit positions
pub mod rcc {
    pub const CR_HSION: u8 = 8;
    pub const CR_HSIRDY: u8 = 10;
    pub const CR_PLLON: u8 = 24;
    pub const CR_PLLRDY: u8 = 25;

    pub const CFGR_SW: u8 = 0;
    pub const CFGR_SWS: u8 = 3;
    pub const CFGR_SW_LEN: u8 = 3;
    pub const SW_HSISYS: u32 = 0b000;
    pub const SW_PLLRCLK: u32 = 0b010;

    pub const PLLCFGR_PLLSRC: u8 = 0;
    pub const PLLSRC_HSI16: u32 = 0b10;
    pub const PLLCFGR_PLLM: u8 = 4;
    pub const PLLCFGR_PLLN: u8 = 8;
    pub const PLLCFGR_PLLREN: u8 = 28;
    pub const PLLCFGR_PLLR: u8 = 29;

    pub const APBENR1_TIM3EN: u32 = 1 << 1;
    pub const APBENR1_TIM6EN: u32 = 1 << 4;
    pub const APBENR1_TIM7EN: u32 = 1 << 5;
    pub const APBENR1_PWREN: u32 = 1 << 28;

    pub const CSR_RMVF: u8 = 23;
    pub const CSR_OBLRSTF: u8 = 25;
    pub const CSR_PINRSTF: u8 = 26;
    pub const CSR_PWRRSTF: u8 = 27;
    pub const CSR_SFTRSTF: u8 = 28;
    pub const CSR_IWDGRSTF: u8 = 29;
    pub const CSR_WWDGRSTF: u8 = 30;
    pub const CSR_LPWRRSTF: u8 = 31;
    /// All reset cause flags
    pub const CSR_RESET_FLAGS: u32 = 0xFE00_0000;
}

// ---------------------------------------------------------------------------
// Flash interface
// ---------------------------------------------------------------------------

/// Embedded flash controller
#[derive(Debug, Default)]
#[repr(C)]
pub struct FlashRegisters {
    pub acr: Reg,
    _reserved0: Reg,
    pub keyr: Reg,
    pub optkeyr: Reg,
    pub sr: Reg,
    pub cr: Reg,
    pub eccr: Reg,
}

impl FlashRegisters {
    pub const fn new() -> Self {
        Self {
            acr: Reg::new(0),
            _reserved0: Reg::new(0),
            keyr: Reg::new(0),
            optkeyr: Reg::new(0),
            sr: Reg::new(0),
            cr: Reg::new(0),
            eccr: Reg::new(0),
        }
    }

    /// # Safety
    ///
    /// Only valid on the target.
    pub unsafe fn steal() -> &'static Self {
        unsafe { &*(FLASH_R_BASE as *const Self) }
    }
}

const _: () = {
    assert!(offset_of!(FlashRegisters, acr) == 0x00);
    assert!(offset_of!(FlashRegisters, keyr) == 0x08);
    assert!(offset_of!(FlashRegisters, sr) == 0x10);
    assert!(offset_of!(FlashRegisters, cr) == 0x14);
    assert!(offset_of!(FlashRegisters, eccr) == 0x18);
};

/// Flash interface bit positions
pub mod flash {
    pub const ACR_LATENCY: u8 = 0;
    pub const ACR_LATENCY_LEN: u8 = 3;

    pub const KEY1: u32 = 0x4567_0123;
    pub const KEY2: u32 = 0xCDEF_89AB;

    pub const SR_EOP: u8 = 0;
    pub const SR_OPERR: u8 = 1;
    pub const SR_PROGERR: u8 = 3;
    pub const SR_WRPERR: u8 = 4;
    pub const SR_PGAERR: u8 = 5;
    pub const SR_SIZERR: u8 = 6;
    pub const SR_PGSERR: u8 = 7;
    pub const SR_BSY1: u8 = 16;
    pub const SR_CFGBSY: u8 = 18;
    /// Error flags, cleared by writing 1
    pub const SR_ERRORS: u32 = (1 << SR_OPERR)
        | (1 << SR_PROGERR)
        | (1 << SR_WRPERR)
        | (1 << SR_PGAERR)
        | (1 << SR_SIZERR)
        | (1 << SR_PGSERR);

    pub const CR_PG: u8 = 0;
    pub const CR_PER: u8 = 1;
    pub const CR_PNB: u8 = 3;
    pub const CR_PNB_LEN: u8 = 7;
    pub const CR_STRT: u8 = 16;
    pub const CR_LOCK: u8 = 31;
}

// ---------------------------------------------------------------------------
// NVIC
// ---------------------------------------------------------------------------

/// Nested vectored interrupt controller (Cortex-M0+: one word per bank)
#[derive(Debug)]
#[repr(C)]
pub struct NvicRegisters {
    pub iser: [Reg; 1],
    _reserved0: [u32; 31],
    pub icer: [Reg; 1],
    _reserved1: [u32; 31],
    pub ispr: [Reg; 1],
    _reserved2: [u32; 31],
    pub icpr: [Reg; 1],
    _reserved3: [u32; 95],
    /// Priority words, four interrupts per word
    pub ip: [Reg; 8],
}

impl NvicRegisters {
    pub const fn new() -> Self {
        Self {
            iser: [Reg::new(0)],
            _reserved0: [0; 31],
            icer: [Reg::new(0)],
            _reserved1: [0; 31],
            ispr: [Reg::new(0)],
            _reserved2: [0; 31],
            icpr: [Reg::new(0)],
            _reserved3: [0; 95],
            ip: [const { Reg::new(0) }; 8],
        }
    }

    /// # Safety
    ///
    /// Only valid on the target.
    pub unsafe fn steal() -> &'static Self {
        unsafe { &*(NVIC_BASE as *const Self) }
    }
}

impl Default for NvicRegisters {
    fn default() -> Self {
        Self::new()
    }
}

const _: () = {
    assert!(offset_of!(NvicRegisters, iser) == 0x000);
    assert!(offset_of!(NvicRegisters, icer) == 0x080);
    assert!(offset_of!(NvicRegisters, ispr) == 0x100);
    assert!(offset_of!(NvicRegisters, icpr) == 0x180);
    assert!(offset_of!(NvicRegisters, ip) == 0x300);
};
