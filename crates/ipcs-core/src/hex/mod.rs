//! Signed, arbitrary-width hexadecimal values.
//!
//! A [`HexValue`] is a magnitude (a string of uppercase hex digits, leading
//! zeros included) plus a sign flag. The sign is not part of the bit
//! pattern: there is no two's complement, and every positional operation
//! (nibble/byte/word extraction, bit toggles) works on the magnitude alone.
//!
//! Positions are big-endian. Index 0 is the leftmost (most significant)
//! unit unless `from_right` is set, in which case index 0 is the rightmost.
//!
//! ```
//! use ipcs_core::HexValue;
//!
//! let value: HexValue = "ABCD".parse()?;
//! assert_eq!(value.get_byte(0, false)?, "AB".parse()?);
//! assert_eq!(value.get_byte(0, true)?, "CD".parse()?);
//! assert_eq!(&"8".parse::<HexValue>()? + &HexValue::from(2), "A".parse()?);
//! # Ok::<(), ipcs_core::Error>(())
//! ```

mod ops;

use crate::encoding::Encoding;
use crate::error::{Error, Result};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Num;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Nibbles per byte
const BYTE: usize = 2;
/// Nibbles per half word
const HALF_WORD: usize = 4;
/// Nibbles per word
const WORD: usize = 8;
/// Nibbles per doubleword
const DOUBLEWORD: usize = 16;

/// A signed hexadecimal value with a fixed nibble width
#[derive(Debug, Clone)]
pub struct HexValue {
    /// Uppercase hex digits, most significant first, never empty
    digits: String,
    negative: bool,
}

impl HexValue {
    /// Builds a value from already-validated uppercase digits.
    ///
    /// An all-zero magnitude is never negative.
    fn from_parts(digits: String, negative: bool) -> Self {
        debug_assert!(!digits.is_empty());
        let negative = negative && digits.bytes().any(|b| b != b'0');
        Self { digits, negative }
    }

    /// Parses an optionally `-` prefixed run of hex digits
    pub fn new(text: &str) -> Result<Self> {
        text.parse()
    }

    /// Returns `"-"` for negative values and `""` otherwise
    pub fn sign(&self) -> &'static str {
        if self.negative {
            "-"
        } else {
            ""
        }
    }

    /// Returns true if the value is negative
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Returns the same magnitude without a sign
    pub fn unsigned(&self) -> HexValue {
        Self::from_parts(self.digits.clone(), false)
    }

    /// Returns the magnitude digits, leading zeros included
    pub fn magnitude(&self) -> &str {
        &self.digits
    }

    /// Returns the unsigned value of the nibbles in `range`.
    ///
    /// The range must be non-empty and lie inside the magnitude.
    pub fn digits(&self, range: Range<usize>) -> Result<HexValue> {
        if range.start >= range.end || range.end > self.digits.len() {
            return Err(Error::index_out_of_range(range.end, self.digits.len()));
        }
        Ok(Self::from_parts(self.digits[range].to_string(), false))
    }

    /// Returns the 0-indexed nibble
    pub fn get_nibble(&self, nibble: usize, from_right: bool) -> Result<HexValue> {
        self.chunk(nibble, 1, from_right)
    }

    /// Returns the 0-indexed byte
    pub fn get_byte(&self, byte: usize, from_right: bool) -> Result<HexValue> {
        self.chunk(byte, BYTE, from_right)
    }

    /// Returns the 0-indexed half word (2 bytes)
    pub fn get_half_word(&self, half_word: usize, from_right: bool) -> Result<HexValue> {
        self.chunk(half_word, HALF_WORD, from_right)
    }

    /// Returns the 0-indexed word (4 bytes)
    pub fn get_word(&self, word: usize, from_right: bool) -> Result<HexValue> {
        self.chunk(word, WORD, from_right)
    }

    /// Returns the 0-indexed doubleword (8 bytes)
    pub fn get_doubleword(&self, doubleword: usize, from_right: bool) -> Result<HexValue> {
        self.chunk(doubleword, DOUBLEWORD, from_right)
    }

    /// Extracts unit `index` of `width` nibbles. The unit must fit entirely
    /// inside the magnitude; nothing is padded.
    fn chunk(&self, index: usize, width: usize, from_right: bool) -> Result<HexValue> {
        let len = self.digits.len();
        let out_of_range = || Error::index_out_of_range(index, len / width);

        let offset = index.checked_mul(width).ok_or_else(out_of_range)?;
        let end = offset.checked_add(width).ok_or_else(out_of_range)?;
        if end > len {
            return Err(out_of_range());
        }

        let start = if from_right { len - end } else { offset };
        Ok(Self::from_parts(
            self.digits[start..start + width].to_string(),
            false,
        ))
    }

    /// Returns the signed integer value
    pub fn to_int(&self) -> BigInt {
        let magnitude = BigUint::from_str_radix(&self.digits, 16).unwrap_or_default();
        let sign = if self.negative { Sign::Minus } else { Sign::Plus };
        BigInt::from_biguint(sign, magnitude)
    }

    /// Returns the canonical hex string: sign followed by the magnitude
    pub fn to_str(&self) -> String {
        self.to_string()
    }

    /// Converts the magnitude to bytes, two digits per byte
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.digits.len() % 2 != 0 {
            return Err(Error::invalid_format(
                self.to_string(),
                "odd number of digits cannot form whole bytes",
            ));
        }

        Ok(self
            .digits
            .as_bytes()
            .chunks(2)
            .map(|pair| (nibble_value(pair[0]) << 4) | nibble_value(pair[1]))
            .collect())
    }

    /// Decodes the magnitude as text in `encoding`.
    ///
    /// Payloads in dumps are often binary, so a magnitude that cannot be
    /// decoded yields an empty string instead of an error.
    pub fn to_char_str(&self, encoding: Encoding) -> String {
        match self.to_bytes() {
            Ok(bytes) => encoding.decode(&bytes),
            Err(_) => String::new(),
        }
    }

    /// Appends the magnitude of `other`, keeping the sign of `self`
    pub fn concat(&self, other: &HexValue) -> HexValue {
        self.concat_all(std::iter::once(other))
    }

    /// Appends the magnitudes of every value in `others`, in order.
    ///
    /// Signs of the appended values are ignored.
    pub fn concat_all<'a, I>(&self, others: I) -> HexValue
    where
        I: IntoIterator<Item = &'a HexValue>,
    {
        let mut digits = self.digits.clone();
        for other in others {
            digits.push_str(&other.digits);
        }
        Self::from_parts(digits, self.negative)
    }

    /// Resizes the magnitude to `new_bit_length` bits.
    ///
    /// The width becomes `ceil(new_bit_length / 4)` nibbles (at least one).
    /// Growing pads zero nibbles on the left; shrinking keeps only the low
    /// `new_bit_length` bits. The sign is kept.
    pub fn resize(&self, new_bit_length: usize) -> HexValue {
        let width = new_bit_length.div_ceil(4).max(1);
        let len = self.digits.len();

        let mut digits: Vec<u8> = if width >= len {
            let mut padded = vec![b'0'; width - len];
            padded.extend_from_slice(self.digits.as_bytes());
            padded
        } else {
            self.digits.as_bytes()[len - width..].to_vec()
        };

        let partial = new_bit_length % 4;
        if partial != 0 {
            let mask = (1u8 << partial) - 1;
            digits[0] = NIBBLE_DIGITS[(nibble_value(digits[0]) & mask) as usize];
        } else if new_bit_length == 0 {
            digits[0] = b'0';
        }

        Self::from_parts(digits_to_string(digits), self.negative)
    }

    /// Bit width excluding leading zero nibbles; zero has length 0
    pub fn bit_len_no_pad(&self) -> usize {
        self.digits.trim_start_matches('0').len() * 4
    }

    /// Bit width including leading zero nibbles
    pub fn bit_len(&self) -> usize {
        self.digits.len() * 4
    }

    /// Returns a copy with the bit at `bit_position` set
    pub fn turn_on_bit(&self, bit_position: usize, from_right: bool) -> Result<HexValue> {
        self.with_bit(bit_position, from_right, true)
    }

    /// Returns a copy with the bit at `bit_position` cleared
    pub fn turn_off_bit(&self, bit_position: usize, from_right: bool) -> Result<HexValue> {
        self.with_bit(bit_position, from_right, false)
    }

    /// Returns whether the bit at `bit_position` is set
    pub fn check_bit(&self, bit_position: usize, from_right: bool) -> Result<bool> {
        let (index, mask) = self.locate_bit(bit_position, from_right)?;
        Ok(nibble_value(self.digits.as_bytes()[index]) & mask != 0)
    }

    fn with_bit(&self, bit_position: usize, from_right: bool, on: bool) -> Result<HexValue> {
        let (index, mask) = self.locate_bit(bit_position, from_right)?;
        let mut digits = self.digits.clone().into_bytes();
        let value = nibble_value(digits[index]);
        let value = if on { value | mask } else { value & !mask };
        digits[index] = NIBBLE_DIGITS[value as usize];
        Ok(Self::from_parts(digits_to_string(digits), self.negative))
    }

    /// Maps a bit position to (digit index, mask within that digit)
    fn locate_bit(&self, bit_position: usize, from_right: bool) -> Result<(usize, u8)> {
        let bit_len = self.bit_len();
        if bit_position >= bit_len {
            return Err(Error::index_out_of_range(bit_position, bit_len));
        }
        let position = if from_right {
            bit_len - 1 - bit_position
        } else {
            bit_position
        };
        Ok((position / 4, 1 << (3 - position % 4)))
    }
}

const NIBBLE_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Value of an uppercase hex digit byte. Callers only pass validated digits.
fn nibble_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

fn digits_to_string(digits: Vec<u8>) -> String {
    digits.into_iter().map(char::from).collect()
}

impl fmt::Display for HexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sign(), self.digits)
    }
}

impl FromStr for HexValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        if digits.is_empty() {
            return Err(Error::invalid_format(s, "no hex digits"));
        }
        if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(Error::invalid_format(
                s,
                format!("non-hex character '{}'", bad),
            ));
        }

        Ok(Self::from_parts(digits.to_ascii_uppercase(), negative))
    }
}

impl TryFrom<&str> for HexValue {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        value.parse()
    }
}

impl From<BigInt> for HexValue {
    fn from(value: BigInt) -> Self {
        Self::from(&value)
    }
}

impl From<&BigInt> for HexValue {
    fn from(value: &BigInt) -> Self {
        Self::from_parts(
            format!("{:X}", value.magnitude()),
            value.sign() == Sign::Minus,
        )
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for HexValue {
                fn from(value: $t) -> Self {
                    Self::from(BigInt::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hex(s: &str) -> HexValue {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!(hex("abc").magnitude(), "ABC");
        assert_eq!(hex("-00a").to_str(), "-00A");
        assert_eq!(hex("004").to_str(), "004");
        assert!(matches!("".parse::<HexValue>(), Err(Error::InvalidFormat { .. })));
        assert!(matches!("-".parse::<HexValue>(), Err(Error::InvalidFormat { .. })));
        assert!(matches!("12G".parse::<HexValue>(), Err(Error::InvalidFormat { .. })));
        assert!(matches!("0x12".parse::<HexValue>(), Err(Error::InvalidFormat { .. })));
        assert!(matches!("12 34".parse::<HexValue>(), Err(Error::InvalidFormat { .. })));
    }

    #[test]
    fn test_from_int() {
        assert_eq!(HexValue::from(0).to_str(), "0");
        assert_eq!(HexValue::from(255).to_str(), "FF");
        assert_eq!(HexValue::from(-10).to_str(), "-A");
        assert_eq!(HexValue::from(u128::MAX).to_str(), "F".repeat(32));
        assert_eq!(HexValue::from(i128::MIN).to_int(), BigInt::from(i128::MIN));
    }

    #[test]
    fn test_int_round_trip() {
        for n in [0i64, 1, -1, 15, 16, -255, 4096, i64::MAX, i64::MIN] {
            let value = HexValue::from(n);
            assert_eq!(value.to_int(), BigInt::from(n));
            assert_eq!(hex(&value.to_string()), value);
        }
    }

    #[test]
    fn test_sign_and_unsigned() {
        assert_eq!(hex("4").sign(), "");
        assert_eq!(hex("-4").sign(), "-");
        assert_eq!(hex("-4").unsigned(), hex("4"));
        assert_eq!(hex("-0").sign(), "");
        assert_eq!(hex("-000").to_str(), "000");
    }

    #[test]
    fn test_digits() {
        assert_eq!(hex("123456789ABCDEF").digits(3..6).unwrap(), hex("456"));
        assert_eq!(hex("-123456789ABCDEF").digits(1..2).unwrap(), hex("2"));
        assert!(hex("12").digits(1..3).is_err());
        assert!(hex("12").digits(1..1).is_err());
    }

    #[test]
    fn test_get_units() {
        assert_eq!(hex("ABCD").get_nibble(1, false).unwrap(), hex("B"));
        assert_eq!(hex("ABCD").get_nibble(1, true).unwrap(), hex("C"));
        assert_eq!(hex("-ABCD").get_nibble(1, true).unwrap(), hex("C"));
        assert_eq!(hex("ABCD").get_byte(0, false).unwrap(), hex("AB"));
        assert_eq!(hex("ABCD").get_byte(0, true).unwrap(), hex("CD"));
        assert_eq!(hex("1234ABCD").get_byte(1, true).unwrap(), hex("AB"));
        assert_eq!(
            hex("0123456789ABCD").get_half_word(1, false).unwrap(),
            hex("4567")
        );
        assert_eq!(
            hex("0123456789ABCD").get_half_word(1, true).unwrap(),
            hex("6789")
        );
        assert_eq!(
            hex("0123456789ABCDEF").get_word(1, true).unwrap().to_str(),
            "01234567"
        );
        assert_eq!(
            hex("0123456789ABCDEFFEDCBA9876543210")
                .get_doubleword(1, false)
                .unwrap()
                .to_str(),
            "FEDCBA9876543210"
        );
    }

    #[test]
    fn test_get_units_out_of_range() {
        // partial units are never padded
        assert!(matches!(
            hex("ABC").get_byte(1, false),
            Err(Error::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(hex("ABC").get_byte(1, true).is_err());
        assert!(hex("ABCD").get_word(0, false).is_err());
        assert!(hex("ABCD").get_nibble(4, false).is_err());
        assert!(hex("ABCD").get_nibble(usize::MAX, true).is_err());
    }

    #[test]
    fn test_to_bytes_and_char_str() {
        assert_eq!(hex("E3C5E2E3").to_bytes().unwrap(), vec![0xE3, 0xC5, 0xE2, 0xE3]);
        assert_eq!(hex("E3C5E2E3").to_char_str(Encoding::Ibm1047), "TEST");
        assert_eq!(hex("54455354").to_char_str(Encoding::Utf8), "TEST");
        assert!(matches!(hex("ABC").to_bytes(), Err(Error::InvalidFormat { .. })));
        assert_eq!(hex("ABC").to_char_str(Encoding::Ibm1047), "");
    }

    #[test]
    fn test_concat() {
        assert_eq!(hex("ABCD").concat(&hex("EF")), hex("ABCDEF"));
        assert_eq!(hex("-ABCD").concat(&hex("-EF")).to_str(), "-ABCDEF");
        assert_eq!(hex("AB").concat(&hex("-EF")).to_str(), "ABEF");
        assert_eq!(
            hex("-AB").concat_all([&hex("-CD"), &hex("EF")]).to_str(),
            "-ABCDEF"
        );
        assert_eq!(hex("00").concat(&hex("01")).to_str(), "0001");
    }

    #[test]
    fn test_resize() {
        assert_eq!(hex("1234").resize(8).to_str(), "34");
        assert_eq!(hex("ABCD").resize(8), hex("CD"));
        assert_eq!(hex("AB").resize(16).to_str(), "00AB");
        assert_eq!(hex("-AB").resize(16).to_str(), "-00AB");
        assert_eq!(hex("-ABCD").resize(8).to_str(), "-CD");
    }

    #[test]
    fn test_resize_truncation_is_lossy() {
        let original = hex("1234");
        assert_eq!(original.resize(8).resize(16).to_str(), "0034");
        assert_ne!(original.resize(8).resize(16), original);
        // lossless when nothing significant is dropped
        assert_eq!(hex("0034").resize(8).resize(16).to_str(), "0034");
    }

    #[test]
    fn test_resize_partial_nibble() {
        assert_eq!(hex("FF").resize(6).to_str(), "3F");
        assert_eq!(hex("0F").resize(6).to_str(), "0F");
        assert_eq!(hex("F").resize(5).to_str(), "0F");
        assert_eq!(hex("ABCD").resize(0).to_str(), "0");
        assert_eq!(hex("-80").resize(4).sign(), "");
    }

    #[test]
    fn test_bit_lengths() {
        assert_eq!(hex("ABCD").bit_len_no_pad(), 16);
        assert_eq!(hex("00AB").bit_len_no_pad(), 8);
        assert_eq!(hex("-00AB").bit_len_no_pad(), 8);
        assert_eq!(hex("00AB").bit_len(), 16);
        assert_eq!(hex("-ABCD").bit_len(), 16);
    }

    #[test]
    fn test_bit_len_no_pad_of_zero() {
        assert_eq!(hex("0").bit_len_no_pad(), 0);
        assert_eq!(hex("0000").bit_len_no_pad(), 0);
        assert_eq!(hex("0000").bit_len(), 16);
    }

    #[test]
    fn test_turn_on_bit() {
        assert_eq!(hex("00").turn_on_bit(1, false).unwrap().to_str(), "40");
        assert_eq!(hex("00").turn_on_bit(1, true).unwrap().to_str(), "02");
        assert_eq!(hex("41").turn_on_bit(1, false).unwrap().to_str(), "41");
        assert_eq!(hex("-80").turn_on_bit(1, false).unwrap().to_str(), "-C0");
        assert_eq!(hex("-01").turn_on_bit(1, true).unwrap().to_str(), "-03");
    }

    #[test]
    fn test_turn_off_bit() {
        assert_eq!(hex("41").turn_off_bit(1, false).unwrap().to_str(), "01");
        assert_eq!(hex("12").turn_off_bit(1, true).unwrap().to_str(), "10");
        assert_eq!(hex("00").turn_off_bit(1, true).unwrap().to_str(), "00");
        assert_eq!(hex("-41").turn_off_bit(1, false).unwrap().to_str(), "-01");
        // clearing the last set bit of a negative value yields plain zero
        assert_eq!(hex("-80").turn_off_bit(0, false).unwrap().to_str(), "00");
        assert_eq!(hex("-01").turn_off_bit(0, true).unwrap().sign(), "");
    }

    #[test]
    fn test_check_bit() {
        assert!(hex("41").check_bit(1, false).unwrap());
        assert!(!hex("41").check_bit(0, false).unwrap());
        assert!(!hex("41").check_bit(1, true).unwrap());
        assert!(hex("-41").check_bit(0, true).unwrap());
    }

    #[test]
    fn test_bit_out_of_range() {
        assert!(matches!(
            hex("41").check_bit(8, false),
            Err(Error::IndexOutOfRange { index: 8, len: 8 })
        ));
        assert!(hex("41").turn_on_bit(8, true).is_err());
        assert!(hex("41").turn_off_bit(100, false).is_err());
    }
}
