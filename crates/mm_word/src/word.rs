use std::cmp::Ordering;
use std::fmt;

use crate::error::ArithError;
use crate::flags::Flags;

/// An unsigned bit pattern of a fixed width, 1..=64 bits.
///
/// `Word` carries no signedness of its own; `as_signed`/`as_unsigned` project the
/// stored bits into the two interpretations a guest program might choose between.
/// The invariant `0 <= raw < 2^width` holds for every live `Word`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Word {
    width: u32,
    raw: u64,
}

fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

impl Word {
    pub const MAX_WIDTH: u32 = 64;

    /// Build a word from a raw unsigned value, truncating it to `width` bits.
    pub fn from_unsigned(width: u32, value: u64) -> Self {
        debug_assert!((1..=Self::MAX_WIDTH).contains(&width));
        Self { width, raw: value & mask(width) }
    }

    /// Build a word from a signed value, wrapping it into `width` bits.
    pub fn from_signed(width: u32, value: i64) -> Self {
        Self::from_unsigned(width, value as u64)
    }

    pub fn zero(width: u32) -> Self {
        Self::from_unsigned(width, 0)
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn as_unsigned(self) -> u64 {
        self.raw
    }

    pub fn as_signed(self) -> i64 {
        // At width 64 the stored bits already are an i64 in two's complement;
        // `1i64 << 64` below would be a shift-amount overflow.
        if self.width == Self::MAX_WIDTH {
            return self.raw as i64;
        }
        let sign_bit = 1u64 << (self.width - 1);
        if self.raw & sign_bit != 0 {
            (self.raw as i64) - (1i64 << self.width)
        } else {
            self.raw as i64
        }
    }

    fn require_same_width(self, other: Self) {
        assert_eq!(
            self.width, other.width,
            "mismatched word widths: {} vs {}", self.width, other.width,
        );
    }

    fn min_signed(width: u32) -> i64 {
        -(1i64 << (width - 1))
    }

    fn max_signed(width: u32) -> i64 {
        (1i64 << (width - 1)) - 1
    }

    /// Modular addition. Sets `carry` on unsigned overflow and `overflow` on signed
    /// overflow of the addition.
    pub fn add(self, other: Self) -> (Self, Flags) {
        self.require_same_width(other);
        let wide_sum = self.raw as u128 + other.raw as u128;
        let result = Self::from_unsigned(self.width, wide_sum as u64);

        let carry = wide_sum > mask(self.width) as u128;
        let signed_sum = self.as_signed() as i128 + other.as_signed() as i128;
        let overflow = signed_sum < Self::min_signed(self.width) as i128
            || signed_sum > Self::max_signed(self.width) as i128;

        let mut flags = Flags::new();
        flags.set_arith(result.raw == 0, result.is_negative(), carry, overflow);
        (result, flags)
    }

    /// Modular subtraction, `self - other`. `carry` is set when the unsigned
    /// subtraction borrows, i.e. when `self < other` unsigned — this is the
    /// convention jump predicates like `ujl` rely on.
    pub fn sub(self, other: Self) -> (Self, Flags) {
        self.require_same_width(other);
        let diff = self.raw.wrapping_sub(other.raw) & mask(self.width);
        let result = Self::from_unsigned(self.width, diff);

        let carry = self.raw < other.raw;
        let signed_diff = self.as_signed() as i128 - other.as_signed() as i128;
        let overflow = signed_diff < Self::min_signed(self.width) as i128
            || signed_diff > Self::max_signed(self.width) as i128;

        let mut flags = Flags::new();
        flags.set_arith(result.raw == 0, result.is_negative(), carry, overflow);
        (result, flags)
    }

    /// Signed multiplication, computed at double width and truncated to `width`
    /// bits. `overflow` is set when truncation lost significant bits.
    pub fn smul(self, other: Self) -> (Self, Flags) {
        self.require_same_width(other);
        let wide = (self.as_signed() as i128) * (other.as_signed() as i128);
        let truncated = wide as u64 & mask(self.width);
        let result = Self::from_unsigned(self.width, truncated);
        let overflow = wide != (result.as_signed() as i128);

        let mut flags = Flags::new();
        flags.set_arith(result.raw == 0, result.is_negative(), false, overflow);
        (result, flags)
    }

    /// Unsigned multiplication, computed at double width and truncated to `width`
    /// bits. `overflow` is set when truncation lost significant bits.
    pub fn umul(self, other: Self) -> (Self, Flags) {
        self.require_same_width(other);
        let wide = (self.raw as u128) * (other.raw as u128);
        let truncated = (wide as u64) & mask(self.width);
        let result = Self::from_unsigned(self.width, truncated);
        let overflow = wide != (truncated as u128);

        let mut flags = Flags::new();
        flags.set_arith(result.raw == 0, result.is_negative(), overflow, false);
        (result, flags)
    }

    /// Truncated signed division: `q = trunc(a/b)`, `r = a - b*q`.
    pub fn divmod_signed(self, other: Self) -> Result<(Self, Self), ArithError> {
        self.require_same_width(other);
        if other.raw == 0 {
            return Err(ArithError::DivisionByZero);
        }
        let (a, b) = (self.as_signed(), other.as_signed());
        if a == Self::min_signed(self.width) && b == -1 {
            return Err(ArithError::SignedOverflow);
        }
        let q = a / b;
        let r = a - b * q;
        Ok((Self::from_signed(self.width, q), Self::from_signed(self.width, r)))
    }

    /// Unsigned division: `q = a/b`, `r = a - b*q`.
    pub fn divmod_unsigned(self, other: Self) -> Result<(Self, Self), ArithError> {
        self.require_same_width(other);
        if other.raw == 0 {
            return Err(ArithError::DivisionByZero);
        }
        let q = self.raw / other.raw;
        let r = self.raw - other.raw * q;
        Ok((Self::from_unsigned(self.width, q), Self::from_unsigned(self.width, r)))
    }

    pub fn sdiv(self, other: Self) -> Result<Self, ArithError> {
        self.divmod_signed(other).map(|(q, _)| q)
    }

    pub fn udiv(self, other: Self) -> Result<Self, ArithError> {
        self.divmod_unsigned(other).map(|(q, _)| q)
    }

    pub fn eq_bits(self, other: Self) -> bool {
        self.require_same_width(other);
        self.raw == other.raw
    }

    pub fn cmp_signed(self, other: Self) -> Ordering {
        self.require_same_width(other);
        self.as_signed().cmp(&other.as_signed())
    }

    pub fn cmp_unsigned(self, other: Self) -> Ordering {
        self.require_same_width(other);
        self.raw.cmp(&other.raw)
    }

    /// Flags that `cmp`/`sub` would produce, without keeping the result around.
    pub fn compare_flags(self, other: Self) -> Flags {
        self.sub(other).1
    }

    pub fn neg(self) -> (Self, Flags) {
        Self::zero(self.width).sub(self)
    }

    fn is_negative(self) -> bool {
        self.raw & (1u64 << (self.width - 1)) != 0
    }

    /// Big-endian byte serialisation, `ceil(width / 8)` bytes long.
    pub fn to_bytes_be(self) -> Vec<u8> {
        let n = (self.width as usize + 7) / 8;
        (0..n).rev().map(|i| (self.raw >> (8 * i)) as u8).collect()
    }

    pub fn from_bytes_be(width: u32, bytes: &[u8]) -> Self {
        let raw = bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
        Self::from_unsigned(width, raw)
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Word{{{}, width={}}}", self.raw, self.width)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_signed())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        for width in [1, 7, 8, 13, 16, 32, 64] {
            let w = Word::from_unsigned(width, 0xdead_beef_cafe_babeu64);
            let bytes = w.to_bytes_be();
            assert_eq!(Word::from_bytes_be(width, &bytes), w);
        }
    }

    #[test]
    fn as_signed_at_max_width_does_not_overflow_the_shift() {
        let w = Word::from_signed(64, -42);
        assert_eq!(w.as_signed(), -42);
        assert_eq!(w.as_unsigned(), (-42i64) as u64);
    }

    #[test]
    fn add_and_sub_are_inverses() {
        let a = Word::from_signed(16, -123);
        let b = Word::from_signed(16, 456);
        let (sum, _) = a.add(b);
        let (back, _) = sum.sub(b);
        assert_eq!(back, a);
    }

    #[test]
    fn divmod_signed_satisfies_identity() {
        let a = Word::from_signed(16, -123);
        let b = Word::from_signed(16, 50);
        let (q, r) = a.divmod_signed(b).unwrap();
        let (recombined, _) = b.smul(q).0.add(r);
        assert_eq!(recombined, a);
        assert!(r.as_signed().abs() < b.as_signed().abs());
    }

    #[test]
    fn divmod_unsigned_satisfies_identity() {
        let a = Word::from_unsigned(16, 12345);
        let b = Word::from_unsigned(16, 7);
        let (q, r) = a.divmod_unsigned(b).unwrap();
        let (recombined, _) = b.umul(q).0.add(r);
        assert_eq!(recombined, a);
        assert!(r.as_unsigned() < b.as_unsigned());
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let a = Word::from_signed(16, 10);
        let zero = Word::zero(16);
        assert_eq!(a.divmod_signed(zero), Err(ArithError::DivisionByZero));
        assert_eq!(a.divmod_unsigned(zero), Err(ArithError::DivisionByZero));
    }

    #[test]
    fn signed_division_overflow_is_an_error() {
        let min = Word::from_signed(16, i16::MIN as i64);
        let minus_one = Word::from_signed(16, -1);
        assert_eq!(min.divmod_signed(minus_one), Err(ArithError::SignedOverflow));
    }

    #[test]
    fn unsigned_jump_predicate_matches_borrow() {
        let a = Word::from_unsigned(8, 3);
        let b = Word::from_unsigned(8, 5);
        let flags = a.compare_flags(b);
        assert!(flags.ujl());
        assert!(!b.compare_flags(a).ujl());
    }
}
