//! CRC calculation
//!
//! Stateless byte-stream CRCs over seven polynomials. Every function takes
//! `(data, start_value, is_first_call)`:
//!
//! - `is_first_call == true`: the algorithm's initial value seeds the
//!   register and `start_value` is ignored.
//! - `is_first_call == false`: `start_value` is the result of a previous
//!   call of the same function over the preceding bytes. Algorithms with a
//!   final XOR undo it before continuing, so splitting a buffer anywhere
//!   and chaining calls yields the same result as a single call.
//!
//! The lookup tables are generated at compile time. All functions are pure
//! and reentrant from any context.

/// CRC-8/SAE-J1850 polynomial
pub const CRC8_POLYNOMIAL: u8 = 0x1D;
/// CRC-8/SAE-J1850 initial value
pub const CRC8_INITIAL_VALUE: u8 = 0xFF;
/// CRC-8/SAE-J1850 final XOR
pub const CRC8_XOR_VALUE: u8 = 0xFF;

/// CRC-8H2F (AUTOSAR) polynomial
pub const CRC8H2F_POLYNOMIAL: u8 = 0x2F;
/// CRC-8H2F initial value
pub const CRC8H2F_INITIAL_VALUE: u8 = 0xFF;
/// CRC-8H2F final XOR
pub const CRC8H2F_XOR_VALUE: u8 = 0xFF;

/// CRC-16/CCITT-FALSE polynomial
pub const CRC16_POLYNOMIAL: u16 = 0x1021;
/// CRC-16/CCITT-FALSE initial value
pub const CRC16_INITIAL_VALUE: u16 = 0xFFFF;

/// CRC-16/ARC polynomial, reflected form of 0x8005
pub const CRC16ARC_POLYNOMIAL: u16 = 0xA001;
/// CRC-16/ARC initial value
pub const CRC16ARC_INITIAL_VALUE: u16 = 0x0000;

/// CRC-32 (IEEE 802.3) polynomial, reflected form of 0x04C11DB7
pub const CRC32_POLYNOMIAL: u32 = 0xEDB8_8320;
/// CRC-32 initial value
pub const CRC32_INITIAL_VALUE: u32 = 0xFFFF_FFFF;
/// CRC-32 final XOR
pub const CRC32_XOR_VALUE: u32 = 0xFFFF_FFFF;

/// CRC-32/P4 (E2E profile 4) polynomial, reflected form of 0xF4ACFB13
pub const CRC32P4_POLYNOMIAL: u32 = 0xC8DF_352F;
/// CRC-32/P4 initial value
pub const CRC32P4_INITIAL_VALUE: u32 = 0xFFFF_FFFF;
/// CRC-32/P4 final XOR
pub const CRC32P4_XOR_VALUE: u32 = 0xFFFF_FFFF;

/// CRC-64/XZ (ECMA-182) polynomial, reflected form of 0x42F0E1EBA9EA3693
pub const CRC64_POLYNOMIAL: u64 = 0xC96C_5795_D787_0F42;
/// CRC-64/XZ initial value
pub const CRC64_INITIAL_VALUE: u64 = 0xFFFF_FFFF_FFFF_FFFF;
/// CRC-64/XZ final XOR
pub const CRC64_XOR_VALUE: u64 = 0xFFFF_FFFF_FFFF_FFFF;

const fn table8(poly: u8) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ poly } else { crc << 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const fn table16(poly: u16) -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ poly } else { crc << 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const fn table16_reflected(poly: u16) -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ poly } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const fn table32_reflected(poly: u32) -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ poly } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const fn table64_reflected(poly: u64) -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u64;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ poly } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC8_TABLE: [u8; 256] = table8(CRC8_POLYNOMIAL);
static CRC8H2F_TABLE: [u8; 256] = table8(CRC8H2F_POLYNOMIAL);
static CRC16_TABLE: [u16; 256] = table16(CRC16_POLYNOMIAL);
static CRC16ARC_TABLE: [u16; 256] = table16_reflected(CRC16ARC_POLYNOMIAL);
static CRC32_TABLE: [u32; 256] = table32_reflected(CRC32_POLYNOMIAL);
static CRC32P4_TABLE: [u32; 256] = table32_reflected(CRC32P4_POLYNOMIAL);
static CRC64_TABLE: [u64; 256] = table64_reflected(CRC64_POLYNOMIAL);

fn run8(table: &[u8; 256], mut crc: u8, data: &[u8]) -> u8 {
    for &byte in data {
        crc = table[usize::from(crc ^ byte)];
    }
    crc
}

/// CRC-8/SAE-J1850
///
/// Zero-length input returns `start_value` on a continuation and `0x00`
/// (initial value after the final XOR) on a first call.
pub fn calculate_crc8(data: &[u8], start_value: u8, is_first_call: bool) -> u8 {
    let seed = if is_first_call {
        CRC8_INITIAL_VALUE
    } else {
        start_value ^ CRC8_XOR_VALUE
    };
    run8(&CRC8_TABLE, seed, data) ^ CRC8_XOR_VALUE
}

/// CRC-8H2F (polynomial 0x2F)
pub fn calculate_crc8h2f(data: &[u8], start_value: u8, is_first_call: bool) -> u8 {
    let seed = if is_first_call {
        CRC8H2F_INITIAL_VALUE
    } else {
        start_value ^ CRC8H2F_XOR_VALUE
    };
    run8(&CRC8H2F_TABLE, seed, data) ^ CRC8H2F_XOR_VALUE
}

/// CRC-16/CCITT-FALSE
///
/// No final XOR, so the running value is used unchanged as the seed of a
/// continuation.
pub fn calculate_crc16(data: &[u8], start_value: u16, is_first_call: bool) -> u16 {
    let mut crc = if is_first_call {
        CRC16_INITIAL_VALUE
    } else {
        start_value
    };
    for &byte in data {
        let index = ((crc >> 8) as u8) ^ byte;
        crc = (crc << 8) ^ CRC16_TABLE[usize::from(index)];
    }
    crc
}

/// CRC-16/ARC (reflected, zero initial value)
pub fn calculate_crc16_arc(data: &[u8], start_value: u16, is_first_call: bool) -> u16 {
    let mut crc = if is_first_call {
        CRC16ARC_INITIAL_VALUE
    } else {
        start_value
    };
    for &byte in data {
        let index = (crc as u8) ^ byte;
        crc = (crc >> 8) ^ CRC16ARC_TABLE[usize::from(index)];
    }
    crc
}

fn run32_reflected(table: &[u32; 256], mut crc: u32, data: &[u8]) -> u32 {
    for &byte in data {
        let index = (crc as u8) ^ byte;
        crc = (crc >> 8) ^ table[usize::from(index)];
    }
    crc
}

/// CRC-32 (IEEE 802.3)
///
/// On a continuation the start value is XORed with all-ones to recover the
/// in-progress register before processing.
pub fn calculate_crc32(data: &[u8], start_value: u32, is_first_call: bool) -> u32 {
    let seed = if is_first_call {
        CRC32_INITIAL_VALUE
    } else {
        start_value ^ CRC32_XOR_VALUE
    };
    run32_reflected(&CRC32_TABLE, seed, data) ^ CRC32_XOR_VALUE
}

/// CRC-32/P4 (E2E profile 4)
pub fn calculate_crc32p4(data: &[u8], start_value: u32, is_first_call: bool) -> u32 {
    let seed = if is_first_call {
        CRC32P4_INITIAL_VALUE
    } else {
        start_value ^ CRC32P4_XOR_VALUE
    };
    run32_reflected(&CRC32P4_TABLE, seed, data) ^ CRC32P4_XOR_VALUE
}

/// CRC-64/XZ
pub fn calculate_crc64(data: &[u8], start_value: u64, is_first_call: bool) -> u64 {
    let mut crc = if is_first_call {
        CRC64_INITIAL_VALUE
    } else {
        start_value ^ CRC64_XOR_VALUE
    };
    for &byte in data {
        let index = (crc as u8) ^ byte;
        crc = (crc >> 8) ^ CRC64_TABLE[usize::from(index)];
    }
    crc ^ CRC64_XOR_VALUE
}
