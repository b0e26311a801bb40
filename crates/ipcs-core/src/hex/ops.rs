//! Operator implementations for [`HexValue`].
//!
//! Arithmetic and comparisons work on the signed integer value, so width
//! and leading zeros never matter there. Bitwise operators work on the
//! magnitude digits and ignore signs.

use super::{nibble_value, HexValue, NIBBLE_DIGITS};
use crate::error::{Error, Result};
use num_traits::Zero;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::ops::{Add, BitAnd, BitOr, Div, Mul, Neg, Rem, Sub};

impl HexValue {
    /// Magnitude without leading zeros, empty for zero
    fn significant(&self) -> &str {
        self.digits.trim_start_matches('0')
    }

    /// Truncating division, `DivisionByZero` when `rhs` is zero
    pub fn checked_div(&self, rhs: &HexValue) -> Result<HexValue> {
        let divisor = rhs.to_int();
        if divisor.is_zero() {
            return Err(Error::DivisionByZero);
        }
        Ok(HexValue::from(self.to_int() / divisor))
    }

    /// Remainder of truncating division; its sign follows the dividend
    pub fn checked_rem(&self, rhs: &HexValue) -> Result<HexValue> {
        let divisor = rhs.to_int();
        if divisor.is_zero() {
            return Err(Error::DivisionByZero);
        }
        Ok(HexValue::from(self.to_int() % divisor))
    }

    /// Applies `op` nibble by nibble after left-padding the narrower
    /// operand with zeros. The result is unsigned.
    fn bitwise(&self, rhs: &HexValue, op: impl Fn(u8, u8) -> u8) -> HexValue {
        let width = self.digits.len().max(rhs.digits.len());
        let lhs = padded(&self.digits, width);
        let rhs = padded(&rhs.digits, width);

        let digits = lhs
            .zip(rhs)
            .map(|(a, b)| char::from(NIBBLE_DIGITS[op(a, b) as usize]))
            .collect();
        HexValue::from_parts(digits, false)
    }
}

/// Nibble values of `digits`, left-padded with zeros to `width`
fn padded(digits: &str, width: usize) -> impl Iterator<Item = u8> + '_ {
    std::iter::repeat(0)
        .take(width - digits.len())
        .chain(digits.bytes().map(nibble_value))
}

macro_rules! impl_arith {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait<&HexValue> for &HexValue {
            type Output = HexValue;

            fn $method(self, rhs: &HexValue) -> HexValue {
                HexValue::from(self.to_int() $op rhs.to_int())
            }
        }

        impl $trait<HexValue> for HexValue {
            type Output = HexValue;

            fn $method(self, rhs: HexValue) -> HexValue {
                (&self).$method(&rhs)
            }
        }

        impl $trait<&HexValue> for HexValue {
            type Output = HexValue;

            fn $method(self, rhs: &HexValue) -> HexValue {
                (&self).$method(rhs)
            }
        }

        impl $trait<HexValue> for &HexValue {
            type Output = HexValue;

            fn $method(self, rhs: HexValue) -> HexValue {
                self.$method(&rhs)
            }
        }
    };
}

impl_arith!(Add, add, +);
impl_arith!(Sub, sub, -);
impl_arith!(Mul, mul, *);
// `/` and `%` panic on a zero divisor like the integer operators;
// use `checked_div` / `checked_rem` to get `Error::DivisionByZero`.
impl_arith!(Div, div, /);
impl_arith!(Rem, rem, %);

macro_rules! impl_bitwise {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait<&HexValue> for &HexValue {
            type Output = HexValue;

            fn $method(self, rhs: &HexValue) -> HexValue {
                self.bitwise(rhs, |a, b| a $op b)
            }
        }

        impl $trait<HexValue> for HexValue {
            type Output = HexValue;

            fn $method(self, rhs: HexValue) -> HexValue {
                (&self).$method(&rhs)
            }
        }
    };
}

impl_bitwise!(BitOr, bitor, |);
impl_bitwise!(BitAnd, bitand, &);

impl Neg for HexValue {
    type Output = HexValue;

    fn neg(self) -> HexValue {
        let negative = !self.negative;
        HexValue::from_parts(self.digits, negative)
    }
}

impl Neg for &HexValue {
    type Output = HexValue;

    fn neg(self) -> HexValue {
        -self.clone()
    }
}

impl PartialEq for HexValue {
    fn eq(&self, other: &Self) -> bool {
        self.negative == other.negative && self.significant() == other.significant()
    }
}

impl Eq for HexValue {}

impl PartialOrd for HexValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HexValue {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_magnitude = |a: &str, b: &str| a.len().cmp(&b.len()).then_with(|| a.cmp(b));

        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => by_magnitude(self.significant(), other.significant()),
            (true, true) => by_magnitude(other.significant(), self.significant()),
        }
    }
}

impl Hash for HexValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.negative.hash(state);
        self.significant().hash(state);
    }
}
