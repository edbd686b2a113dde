//! Bit-field operations (Bfx)
//!
//! Pure helpers over unsigned integers used by every register manipulation
//! in the MCAL. Mutating operations take `&mut self`, queries return a value.
//!
//! Bit positions at or beyond the type width are no-ops for the mutating
//! operations and read as zero/false for the queries, so no operation can
//! panic on overflowing shifts.

/// Bit-field operations on unsigned integers
pub trait Bfx: Copy + Sized {
    /// Width of the type in bits
    const WIDTH: u8;

    /// Set bit `bit`
    fn set_bit(&mut self, bit: u8);

    /// Clear bit `bit`
    fn clr_bit(&mut self, bit: u8);

    /// Read bit `bit`
    fn get_bit(self, bit: u8) -> bool;

    /// Set `[start, start + len)` to all ones (`status == 1`) or all zeros
    /// (`status == 0`). Any other status leaves the data unchanged.
    fn set_bits(&mut self, start: u8, len: u8, status: u8);

    /// Extract `[start, start + len)`, right-aligned
    fn get_bits(self, start: u8, len: u8) -> Self;

    /// `data |= mask`
    fn set_bit_mask(&mut self, mask: Self);

    /// `data &= !mask`
    fn clr_bit_mask(&mut self, mask: Self);

    /// True if every bit of `mask` is set
    fn tst_bit_mask(self, mask: Self) -> bool;

    /// True if at least one bit of `mask` is set
    fn tst_bit_ln_mask(self, mask: Self) -> bool;

    /// True if the number of set bits is even
    fn tst_parity_even(self) -> bool;

    /// One's complement
    fn toggle_bits(&mut self);

    /// Flip the bits selected by `mask`
    fn toggle_bit_mask(&mut self, mask: Self);

    /// Logical shift right
    fn shift_bit_rt(&mut self, count: u8);

    /// Logical shift left
    fn shift_bit_lt(&mut self, count: u8);

    /// Rotate right by `count` modulo width
    fn rot_bit_rt(&mut self, count: u8);

    /// Rotate left by `count` modulo width
    fn rot_bit_lt(&mut self, count: u8);

    /// Copy bit `src_pos` of `src` into bit `dst_pos`
    fn copy_bit(&mut self, dst_pos: u8, src: Self, src_pos: u8);

    /// Write the low `len` bits of `pattern` into `[start, start + len)`
    fn put_bits(&mut self, start: u8, len: u8, pattern: Self);

    /// Copy the bits of `pattern` selected by `mask`
    fn put_bits_mask(&mut self, pattern: Self, mask: Self);

    /// Set or clear bit `bit`
    fn put_bit(&mut self, bit: u8, status: bool);

    /// Number of consecutive ones starting at the MSB
    fn count_leading_ones(self) -> u8;

    /// Number of consecutive zeros starting at the MSB
    fn count_leading_zeros(self) -> u8;
}

macro_rules! impl_bfx {
    ($($t:ty),*) => {$(
        impl Bfx for $t {
            const WIDTH: u8 = <$t>::BITS as u8;

            #[inline]
            fn set_bit(&mut self, bit: u8) {
                *self |= single_bit::<$t>(bit);
            }

            #[inline]
            fn clr_bit(&mut self, bit: u8) {
                *self &= !single_bit::<$t>(bit);
            }

            #[inline]
            fn get_bit(self, bit: u8) -> bool {
                self & single_bit::<$t>(bit) != 0
            }

            #[inline]
            fn set_bits(&mut self, start: u8, len: u8, status: u8) {
                let mask = field_mask::<$t>(start, len);
                match status {
                    0 => *self &= !mask,
                    1 => *self |= mask,
                    _ => {}
                }
            }

            #[inline]
            fn get_bits(self, start: u8, len: u8) -> Self {
                self.checked_shr(u32::from(start)).unwrap_or(0) & low_mask::<$t>(len)
            }

            #[inline]
            fn set_bit_mask(&mut self, mask: Self) {
                *self |= mask;
            }

            #[inline]
            fn clr_bit_mask(&mut self, mask: Self) {
                *self &= !mask;
            }

            #[inline]
            fn tst_bit_mask(self, mask: Self) -> bool {
                self & mask == mask
            }

            #[inline]
            fn tst_bit_ln_mask(self, mask: Self) -> bool {
                self & mask != 0
            }

            #[inline]
            fn tst_parity_even(self) -> bool {
                self.count_ones() % 2 == 0
            }

            #[inline]
            fn toggle_bits(&mut self) {
                *self = !*self;
            }

            #[inline]
            fn toggle_bit_mask(&mut self, mask: Self) {
                *self ^= mask;
            }

            #[inline]
            fn shift_bit_rt(&mut self, count: u8) {
                *self = self.checked_shr(u32::from(count)).unwrap_or(0);
            }

            #[inline]
            fn shift_bit_lt(&mut self, count: u8) {
                *self = self.checked_shl(u32::from(count)).unwrap_or(0);
            }

            #[inline]
            fn rot_bit_rt(&mut self, count: u8) {
                *self = self.rotate_right(u32::from(count));
            }

            #[inline]
            fn rot_bit_lt(&mut self, count: u8) {
                *self = self.rotate_left(u32::from(count));
            }

            #[inline]
            fn copy_bit(&mut self, dst_pos: u8, src: Self, src_pos: u8) {
                self.put_bit(dst_pos, src.get_bit(src_pos));
            }

            #[inline]
            fn put_bits(&mut self, start: u8, len: u8, pattern: Self) {
                let mask = field_mask::<$t>(start, len);
                let shifted = pattern.checked_shl(u32::from(start)).unwrap_or(0);
                *self = (*self & !mask) | (shifted & mask);
            }

            #[inline]
            fn put_bits_mask(&mut self, pattern: Self, mask: Self) {
                *self = (*self & !mask) | (pattern & mask);
            }

            #[inline]
            fn put_bit(&mut self, bit: u8, status: bool) {
                if status {
                    self.set_bit(bit);
                } else {
                    self.clr_bit(bit);
                }
            }

            #[inline]
            fn count_leading_ones(self) -> u8 {
                self.leading_ones() as u8
            }

            #[inline]
            fn count_leading_zeros(self) -> u8 {
                self.leading_zeros() as u8
            }
        }

        impl Mask for $t {
            const ZERO: Self = 0;
            const ONES: Self = <$t>::MAX;
            const ONE: Self = 1;

            #[inline]
            fn shl_or_zero(self, count: u8) -> Self {
                self.checked_shl(u32::from(count)).unwrap_or(0)
            }
        }
    )*};
}

/// Mask building blocks shared by the [`Bfx`] implementations
trait Mask: Copy + core::ops::Not<Output = Self> + core::ops::BitAnd<Output = Self> {
    const ZERO: Self;
    const ONES: Self;
    const ONE: Self;

    fn shl_or_zero(self, count: u8) -> Self;
}

#[inline]
fn single_bit<T: Mask>(bit: u8) -> T {
    T::ONE.shl_or_zero(bit)
}

/// `len` ones, right-aligned
#[inline]
fn low_mask<T: Mask + Bfx>(len: u8) -> T {
    if len >= T::WIDTH {
        T::ONES
    } else {
        !T::ONES.shl_or_zero(len)
    }
}

/// `len` ones starting at `start`
#[inline]
fn field_mask<T: Mask + Bfx>(start: u8, len: u8) -> T {
    if start >= T::WIDTH {
        return T::ZERO;
    }
    low_mask::<T>(len).shl_or_zero(start)
}

impl_bfx!(u8, u16, u32, u64);

/// Bit-field operations specific to signed integers
pub trait BfxSigned: Copy + Sized {
    /// Number of bits following the sign bit that equal the sign bit
    fn count_leading_signs(self) -> u8;

    /// Arithmetic shift with saturation
    ///
    /// A positive `count` shifts left and clamps to the type's min/max on
    /// overflow; a negative `count` shifts right, filling with the sign bit.
    fn shift_bit_sat(self, count: i8) -> Self;
}

macro_rules! impl_bfx_signed {
    ($($t:ty),*) => {$(
        impl BfxSigned for $t {
            #[inline]
            fn count_leading_signs(self) -> u8 {
                let magnitude = if self < 0 { !self } else { self };
                (magnitude.leading_zeros() - 1) as u8
            }

            #[inline]
            fn shift_bit_sat(self, count: i8) -> Self {
                let width = <$t>::BITS as i8;
                if count >= 0 {
                    if self == 0 {
                        return 0;
                    }
                    if count >= width {
                        return if self < 0 { <$t>::MIN } else { <$t>::MAX };
                    }
                    let wide = i128::from(self) << count;
                    if wide > i128::from(<$t>::MAX) {
                        <$t>::MAX
                    } else if wide < i128::from(<$t>::MIN) {
                        <$t>::MIN
                    } else {
                        wide as $t
                    }
                } else {
                    let shift = (-(i16::from(count))).min(i16::from(width) - 1);
                    self >> shift
                }
            }
        }
    )*};
}

impl_bfx_signed!(i8, i16, i32, i64);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_set_clr_get_bit() {
        let mut data: u8 = 0;
        data.set_bit(3);
        assert_eq!(data, 0x08);
        assert!(data.get_bit(3));
        assert!(!data.get_bit(2));
        data.clr_bit(3);
        assert_eq!(data, 0);
    }

    #[test]
    fn test_out_of_range_bit_is_noop() {
        let mut data: u8 = 0x5A;
        data.set_bit(8);
        data.clr_bit(200);
        assert_eq!(data, 0x5A);
        assert!(!data.get_bit(9));
    }

    #[test]
    fn test_set_bits_status() {
        let mut data: u16 = 0;
        data.set_bits(4, 4, 1);
        assert_eq!(data, 0x00F0);
        data.set_bits(4, 2, 0);
        assert_eq!(data, 0x00C0);
        data.set_bits(0, 16, 7);
        assert_eq!(data, 0x00C0);
    }

    #[test]
    fn test_get_bits() {
        let data: u32 = 0xABCD_1234;
        assert_eq!(data.get_bits(16, 16), 0xABCD);
        assert_eq!(data.get_bits(4, 8), 0x23);
        assert_eq!(data.get_bits(0, 32), data);
        assert_eq!(data.get_bits(32, 4), 0);
    }

    #[test]
    fn test_masks() {
        let mut data: u8 = 0b1010_0000;
        assert!(data.tst_bit_mask(0b1000_0000));
        assert!(!data.tst_bit_mask(0b1100_0000));
        assert!(data.tst_bit_ln_mask(0b1100_0000));
        assert!(!data.tst_bit_ln_mask(0b0101_0000));
        data.set_bit_mask(0b0000_0011);
        assert_eq!(data, 0b1010_0011);
        data.clr_bit_mask(0b1000_0001);
        assert_eq!(data, 0b0010_0010);
        data.toggle_bit_mask(0b0000_1111);
        assert_eq!(data, 0b0010_1101);
    }

    #[test]
    fn test_shift_and_rotate() {
        let mut data: u8 = 0b1000_0001;
        data.rot_bit_lt(1);
        assert_eq!(data, 0b0000_0011);
        data.rot_bit_rt(2);
        assert_eq!(data, 0b1100_0000);
        data.rot_bit_rt(8);
        assert_eq!(data, 0b1100_0000);
        data.shift_bit_rt(6);
        assert_eq!(data, 0b0000_0011);
        data.shift_bit_lt(7);
        assert_eq!(data, 0b1000_0000);
        data.shift_bit_lt(8);
        assert_eq!(data, 0);
    }

    #[test]
    fn test_put_bits() {
        let mut data: u32 = 0xFFFF_FFFF;
        data.put_bits(20, 4, 7);
        assert_eq!(data, 0xFF7F_FFFF);
        data.put_bits(0, 2, 0b1111);
        assert_eq!(data, 0xFF7F_FFFF);
        data.put_bits(0, 2, 0b00);
        assert_eq!(data, 0xFF7F_FFFC);
    }

    #[test]
    fn test_put_bits_mask_and_copy_bit() {
        let mut data: u8 = 0b1111_0000;
        data.put_bits_mask(0b0101_0101, 0b0011_1100);
        assert_eq!(data, 0b1101_0100);

        let mut dst: u8 = 0;
        dst.copy_bit(7, 0b0000_0100, 2);
        assert_eq!(dst, 0b1000_0000);
        dst.copy_bit(7, 0, 2);
        assert_eq!(dst, 0);
    }

    #[test]
    fn test_count_leading() {
        assert_eq!(0xF0u8.count_leading_ones(), 4);
        assert_eq!(0x0Fu8.count_leading_ones(), 0);
        assert_eq!(0x0Fu8.count_leading_zeros(), 4);
        assert_eq!(0u8.count_leading_zeros(), 8);
        assert_eq!(0xFFu8.count_leading_ones(), 8);
    }

    #[test]
    fn test_count_leading_signs() {
        assert_eq!(0i8.count_leading_signs(), 7);
        assert_eq!((-1i8).count_leading_signs(), 7);
        assert_eq!(1i8.count_leading_signs(), 6);
        assert_eq!((-128i8).count_leading_signs(), 0);
        assert_eq!(0x0Fi16.count_leading_signs(), 11);
    }

    #[test]
    fn test_shift_bit_sat() {
        assert_eq!(0x20i8.shift_bit_sat(1), 0x40);
        assert_eq!(0x20i8.shift_bit_sat(2), i8::MAX);
        assert_eq!((-0x20i8).shift_bit_sat(2), i8::MIN);
        assert_eq!((-0x21i8).shift_bit_sat(2), i8::MIN);
        assert_eq!((-8i8).shift_bit_sat(-2), -2);
        assert_eq!((-1i8).shift_bit_sat(-7), -1);
        assert_eq!((-1i8).shift_bit_sat(-100), -1);
        assert_eq!(1i32.shift_bit_sat(40), i32::MAX);
        assert_eq!(0i16.shift_bit_sat(40), 0);
    }

    proptest! {
        #[test]
        fn prop_set_bit_only_touches_target(data: u32, bit in 0u8..32) {
            let mut set = data;
            set.set_bit(bit);
            prop_assert!(set.get_bit(bit));
            prop_assert_eq!(set & !(1 << bit), data & !(1 << bit));

            let mut cleared = data;
            cleared.clr_bit(bit);
            prop_assert!(!cleared.get_bit(bit));
            prop_assert_eq!(cleared & !(1 << bit), data & !(1 << bit));
        }

        #[test]
        fn prop_toggle_is_involution(data: u16) {
            let mut value = data;
            value.toggle_bits();
            value.toggle_bits();
            prop_assert_eq!(value, data);
        }

        #[test]
        fn prop_parity_matches_popcount(data: u8) {
            prop_assert_eq!(data.tst_parity_even(), data.count_ones() % 2 == 0);
        }

        #[test]
        fn prop_put_then_get_bits(data: u32, start in 0u8..32, len in 1u8..=32, pattern: u32) {
            let mut value = data;
            value.put_bits(start, len, pattern);
            let width = len.min(32 - start);
            let expected = if width == 32 { pattern } else { pattern & ((1u32 << width) - 1) };
            prop_assert_eq!(value.get_bits(start, width), expected);
        }
    }
}
