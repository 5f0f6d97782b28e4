// Copyright (c) Verse Bridge Explorer
// SPDX-License-Identifier: Apache-2.0

//! Arbitrary-precision, non-negative decimal amounts.
//!
//! An `Amount` is an unbounded integer of base units plus a base-10 scale, so
//! `"123.456"` is stored as `123456 * 10^-3`. Values are kept normalized (no
//! trailing fractional zeros) which makes derived equality match numeric
//! equality.

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,
    #[error("invalid character '{0}' in amount")]
    InvalidCharacter(char),
    #[error("amount contains more than one decimal point")]
    MultipleDecimalPoints,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Amount {
    units: BigUint,
    scale: u32,
}

impl Amount {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.units.bits() == 0
    }

    /// Number of fractional digits after normalization
    pub fn scale(&self) -> u32 {
        self.scale
    }

    fn normalized(mut units: BigUint, mut scale: u32) -> Self {
        let ten = BigUint::from(10u32);
        while scale > 0 && units.bits() != 0 && (&units % &ten).bits() == 0 {
            units /= &ten;
            scale -= 1;
        }
        if units.bits() == 0 {
            scale = 0;
        }
        Self { units, scale }
    }

    fn rescaled_units(&self, scale: u32) -> BigUint {
        &self.units * BigUint::from(10u32).pow(scale - self.scale)
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (int_part, frac_part) = match s.split_once('.') {
            Some((_, frac)) if frac.contains('.') => {
                return Err(AmountParseError::MultipleDecimalPoints)
            }
            Some((int, frac)) => (int, frac),
            None => (s, ""),
        };

        if let Some(c) = int_part
            .chars()
            .chain(frac_part.chars())
            .find(|c| !c.is_ascii_digit())
        {
            return Err(AmountParseError::InvalidCharacter(c));
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(AmountParseError::Empty);
        }

        let frac_part = frac_part.trim_end_matches('0');
        let digits = format!("{}{}", int_part, frac_part);
        let units = if digits.is_empty() {
            BigUint::default()
        } else {
            // digits are ASCII 0-9, checked above
            BigUint::parse_bytes(digits.as_bytes(), 10).unwrap_or_default()
        };

        Ok(Self::normalized(units, frac_part.len() as u32))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.units.to_str_radix(10);
        if self.scale == 0 {
            return f.write_str(&digits);
        }

        let scale = self.scale as usize;
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}.{}", int_part, frac_part)
    }
}

impl Add<&Amount> for &Amount {
    type Output = Amount;

    fn add(self, rhs: &Amount) -> Amount {
        let scale = self.scale.max(rhs.scale);
        Amount::normalized(self.rescaled_units(scale) + rhs.rescaled_units(scale), scale)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        &self + &rhs
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, rhs: &Amount) {
        *self = &*self + rhs;
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, amount| &acc + amount)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
