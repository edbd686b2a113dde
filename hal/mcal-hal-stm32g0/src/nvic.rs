//! Interrupt controller access
//!
//! Every operation silently ignores interrupt numbers outside
//! `NVIC_MIN_IRQ..=NVIC_MAX_IRQ`.

use mcal_core::Bfx;

use crate::regs::NvicRegisters;

/// Lowest interrupt number accepted
pub const NVIC_MIN_IRQ: u8 = 16;
/// Highest interrupt number accepted
pub const NVIC_MAX_IRQ: u8 = 30;
/// Returned by [`Nvic::get_priority`] for rejected interrupt numbers
pub const INVALID_PRIORITY: u8 = 0xFF;

/// Implemented priority bits, at the top of each priority byte
const PRIORITY_BITS: u8 = 2;
const PRIORITY_SHIFT: u8 = 8 - PRIORITY_BITS;

/// Device interrupt numbers used by the drivers
pub mod irq {
    pub const TIM3: u8 = 16;
    pub const TIM6_DAC_LPTIM1: u8 = 17;
    pub const TIM7_LPTIM2: u8 = 18;
}

/// NVIC handle
///
/// Holds no state besides the register block.
pub struct Nvic<'r> {
    regs: &'r NvicRegisters,
}

impl Nvic<'static> {
    /// # Safety
    ///
    /// Only valid on the target. Interrupt enables are global state; the
    /// caller must not race this handle with `cortex_m::peripheral::NVIC`.
    pub unsafe fn steal() -> Self {
        Self::new(unsafe { NvicRegisters::steal() })
    }
}

impl<'r> Nvic<'r> {
    pub fn new(regs: &'r NvicRegisters) -> Self {
        Self { regs }
    }

    fn accepts(irq: u8) -> bool {
        (NVIC_MIN_IRQ..=NVIC_MAX_IRQ).contains(&irq)
    }

    fn bit(irq: u8) -> u32 {
        1 << (irq & 0x1F)
    }

    /// Priority word index and bit position of the priority field of `irq`
    fn priority_field(irq: u8) -> (usize, u8) {
        let word = usize::from(irq >> 2);
        let lane = (irq & 0x03) * 8;
        (word, lane + PRIORITY_SHIFT)
    }

    /// Set the priority of `irq` (0 highest, 3 lowest)
    pub fn set_priority(&self, irq: u8, priority: u8) {
        if !Self::accepts(irq) {
            return;
        }
        let (word, start) = Self::priority_field(irq);
        let lane = start - PRIORITY_SHIFT;
        self.regs.ip[word].modify(|v| {
            v.put_bits(lane, 8, 0);
            v.put_bits(start, PRIORITY_BITS, u32::from(priority));
        });
    }

    pub fn get_priority(&self, irq: u8) -> u8 {
        if !Self::accepts(irq) {
            return INVALID_PRIORITY;
        }
        let (word, start) = Self::priority_field(irq);
        self.regs.ip[word].read().get_bits(start, PRIORITY_BITS) as u8
    }

    pub fn enable_irq(&self, irq: u8) {
        if Self::accepts(irq) {
            self.regs.iser[0].write(Self::bit(irq));
        }
    }

    pub fn disable_irq(&self, irq: u8) {
        if Self::accepts(irq) {
            self.regs.icer[0].write(Self::bit(irq));
        }
    }

    pub fn set_pending_irq(&self, irq: u8) {
        if Self::accepts(irq) {
            self.regs.ispr[0].write(Self::bit(irq));
        }
    }

    pub fn clear_pending_irq(&self, irq: u8) {
        if Self::accepts(irq) {
            self.regs.icpr[0].write(Self::bit(irq));
        }
    }

    /// Whether `irq` is pending; false for rejected interrupt numbers
    pub fn get_pending_irq(&self, irq: u8) -> bool {
        Self::accepts(irq) && self.regs.ispr[0].read() & Self::bit(irq) != 0
    }
}
