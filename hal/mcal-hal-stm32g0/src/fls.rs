//! FLS arch: page erase and double-word programming of the main flash

use mcal_core::Bfx;
use mcal_hal::{FlsArch, FlsArchError};

use crate::regs::{
    flash, FlashRegisters, FLASH_MEMORY_BASE, FLASH_MEMORY_SIZE, FLASH_PAGE_SIZE,
    FLASH_PROGRAM_SIZE,
};

/// Polls of BSY1 after each double-word program
const PROGRAM_POLLS: u32 = 10_000;

/// Drives the flash controller and accesses the flash array
pub struct Stm32g0Flash<'r> {
    regs: &'r FlashRegisters,
    memory: *mut u8,
    base: u32,
    size: u32,
}

impl Stm32g0Flash<'static> {
    /// # Safety
    ///
    /// Only valid on the target.
    pub unsafe fn steal() -> Self {
        unsafe {
            Self::new(
                FlashRegisters::steal(),
                FLASH_MEMORY_BASE as usize as *mut u8,
                FLASH_MEMORY_BASE,
                FLASH_MEMORY_SIZE,
            )
        }
    }
}

impl<'r> Stm32g0Flash<'r> {
    /// Flash array of `size` bytes at `memory`, addressed from `base`
    ///
    /// # Safety
    ///
    /// `memory..memory + size` must be valid for reads and writes for as
    /// long as this value exists, and must not be accessed through any
    /// other reference meanwhile.
    pub unsafe fn new(regs: &'r FlashRegisters, memory: *mut u8, base: u32, size: u32) -> Self {
        Self {
            regs,
            memory,
            base,
            size,
        }
    }

    /// Pointer to `len` bytes at absolute `address`, if they lie in the array
    fn pointer(&self, address: u32, len: usize) -> Option<*mut u8> {
        let offset = address.checked_sub(self.base)?;
        let end = (offset as usize).checked_add(len)?;
        if end > self.size as usize {
            return None;
        }
        Some(self.memory.wrapping_add(offset as usize))
    }

    fn unlock(&self) {
        if self.regs.cr.read().get_bit(flash::CR_LOCK) {
            self.regs.keyr.write(flash::KEY1);
            self.regs.keyr.write(flash::KEY2);
        }
    }

    fn clear_errors(&self) {
        let pending = self.regs.sr.read() & flash::SR_ERRORS;
        if pending != 0 {
            self.regs.sr.write(pending);
        }
    }

    fn wait_idle(&self) -> Result<(), FlsArchError> {
        for _ in 0..PROGRAM_POLLS {
            if !self.is_busy() {
                return Ok(());
            }
        }
        Err(FlsArchError::Timeout)
    }
}

impl FlsArch for Stm32g0Flash<'_> {
    fn init(&mut self) {
        self.unlock();
        self.clear_errors();
    }

    fn start_erase(&mut self, address: u32) -> Result<(), FlsArchError> {
        if self.is_busy() {
            return Err(FlsArchError::Busy);
        }
        if address % FLASH_PAGE_SIZE != 0 || self.pointer(address, 1).is_none() {
            return Err(FlsArchError::Alignment);
        }
        let page = (address - self.base) / FLASH_PAGE_SIZE;

        self.unlock();
        self.clear_errors();
        self.regs.cr.modify(|v| {
            v.clr_bit(flash::CR_PG);
            v.set_bit(flash::CR_PER);
            v.put_bits(flash::CR_PNB, flash::CR_PNB_LEN, page);
        });
        self.regs.cr.modify(|v| v.set_bit(flash::CR_STRT));
        Ok(())
    }

    fn program(&mut self, address: u32, data: &[u8]) -> Result<(), FlsArchError> {
        let granule = FLASH_PROGRAM_SIZE as usize;
        if address % FLASH_PROGRAM_SIZE != 0 || data.len() % granule != 0 {
            return Err(FlsArchError::Alignment);
        }
        let target = self
            .pointer(address, data.len())
            .ok_or(FlsArchError::Alignment)?;
        if self.is_busy() {
            return Err(FlsArchError::Busy);
        }

        self.unlock();
        self.clear_errors();
        self.regs.cr.modify(|v| {
            v.clr_bit(flash::CR_PER);
            v.set_bit(flash::CR_PG);
        });

        let mut result = Ok(());
        for (index, chunk) in data.chunks_exact(granule).enumerate() {
            let low = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let high = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
            let word = target.wrapping_add(index * granule) as *mut u32;
            // Bounds checked by `pointer`; the array is 8-byte aligned like `address`
            unsafe {
                core::ptr::write_volatile(word, low);
                core::ptr::write_volatile(word.wrapping_add(1), high);
            }
            result = self.wait_idle();
            if result.is_ok() {
                if let Some(error) = self.take_error() {
                    result = Err(error);
                }
            }
            if result.is_err() {
                break;
            }
        }

        self.regs.cr.modify(|v| v.clr_bit(flash::CR_PG));
        result
    }

    fn read(&self, address: u32, buffer: &mut [u8]) {
        if let Some(source) = self.pointer(address, buffer.len()) {
            // Bounds checked by `pointer`
            unsafe {
                core::ptr::copy_nonoverlapping(source, buffer.as_mut_ptr(), buffer.len());
            }
        }
    }

    fn is_busy(&self) -> bool {
        self.regs.sr.read().get_bit(flash::SR_BSY1)
    }

    fn take_error(&mut self) -> Option<FlsArchError> {
        let pending = self.regs.sr.read() & flash::SR_ERRORS;
        if pending == 0 {
            return None;
        }
        self.regs.sr.write(pending);
        Some(FlsArchError::Program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u32 = FLASH_MEMORY_BASE;

    #[test]
    fn test_start_erase_selects_page() {
        let regs = FlashRegisters::new();
        regs.cr.write(1 << flash::CR_LOCK);
        let mut memory = [0u64; 1024];
        let mut fls = unsafe {
            Stm32g0Flash::new(&regs, memory.as_mut_ptr() as *mut u8, BASE, 4 * FLASH_PAGE_SIZE)
        };

        assert_eq!(fls.start_erase(BASE + 3 * FLASH_PAGE_SIZE), Ok(()));

        let cr = regs.cr.read();
        assert!(cr.get_bit(flash::CR_PER));
        assert!(cr.get_bit(flash::CR_STRT));
        assert_eq!(cr.get_bits(flash::CR_PNB, flash::CR_PNB_LEN), 3);
        assert_eq!(regs.keyr.read(), flash::KEY2);
    }

    #[test]
    fn test_start_erase_rejects_misaligned_or_busy() {
        let regs = FlashRegisters::new();
        let mut memory = [0u64; 1024];
        let mut fls = unsafe {
            Stm32g0Flash::new(&regs, memory.as_mut_ptr() as *mut u8, BASE, 4 * FLASH_PAGE_SIZE)
        };

        assert_eq!(fls.start_erase(BASE + 8), Err(FlsArchError::Alignment));
        assert_eq!(fls.start_erase(BASE + 4 * FLASH_PAGE_SIZE), Err(FlsArchError::Alignment));
        regs.sr.write(1 << flash::SR_BSY1);
        assert!(fls.is_busy());
        assert_eq!(fls.start_erase(BASE), Err(FlsArchError::Busy));
    }

    #[test]
    fn test_program_and_read_back() {
        let regs = FlashRegisters::new();
        let mut memory = [u64::MAX; 4];
        let mut fls =
            unsafe { Stm32g0Flash::new(&regs, memory.as_mut_ptr() as *mut u8, BASE, 32) };
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];

        assert_eq!(fls.program(BASE + 8, &data), Ok(()));
        assert!(!regs.cr.read().get_bit(flash::CR_PG));

        let mut buffer = [0u8; 24];
        fls.read(BASE, &mut buffer);
        assert_eq!(buffer[..8], [0xFF; 8]);
        assert_eq!(buffer[8..], data);
    }

    #[test]
    fn test_program_rejects_bad_granule() {
        let regs = FlashRegisters::new();
        let mut memory = [0u64; 2];
        let mut fls =
            unsafe { Stm32g0Flash::new(&regs, memory.as_mut_ptr() as *mut u8, BASE, 16) };

        assert_eq!(fls.program(BASE + 4, &[0; 8]), Err(FlsArchError::Alignment));
        assert_eq!(fls.program(BASE, &[0; 6]), Err(FlsArchError::Alignment));
        assert_eq!(fls.program(BASE + 8, &[0; 16]), Err(FlsArchError::Alignment));
    }

    #[test]
    fn test_program_reports_controller_error() {
        let regs = FlashRegisters::new();
        let mut memory = [0u64; 2];
        let mut fls =
            unsafe { Stm32g0Flash::new(&regs, memory.as_mut_ptr() as *mut u8, BASE, 16) };

        regs.sr.write(1 << flash::SR_PGAERR);
        assert_eq!(fls.take_error(), Some(FlsArchError::Program));
    }
}
