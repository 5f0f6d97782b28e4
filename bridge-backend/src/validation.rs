// Copyright (c) Verse Bridge Explorer
// SPDX-License-Identifier: Apache-2.0

//! Transfer amount validation.
//!
//! Gates the bridge submit action on every keystroke of the amount input.

use crate::amount::Amount;
use lazy_static::lazy_static;
use regex::Regex;

/// Integer plus fractional digits that still fit a 256-bit fixed-point value
pub const MAX_AMOUNT_DIGITS: usize = 79;

/// Precision assumed when the token registry reports none
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;

lazy_static! {
    // ASCII digits only; `\d` would also accept other Unicode digits
    static ref AMOUNT_INPUT: Regex = Regex::new(r"^[0-9]*(?:\.[0-9]*)?$").unwrap();
}

/// Digits with at most one decimal point, nothing else.
pub fn is_amount_syntax(input: &str) -> bool {
    AMOUNT_INPUT.is_match(input)
}

/// Whether `input` can be submitted as a transfer of a token with `decimals`
/// fractional digits.
pub fn validate_amount(input: &str, decimals: u32) -> bool {
    if !is_amount_syntax(input) {
        return false;
    }

    // Exact positivity check; the parse fails when there is no digit at all.
    match input.parse::<Amount>() {
        Ok(amount) if !amount.is_zero() => {}
        _ => return false,
    }

    let (integer_part, decimal_part) = input.split_once('.').unwrap_or((input, ""));

    if integer_part.len() + decimal_part.len() > MAX_AMOUNT_DIGITS {
        return false;
    }

    decimal_part.len() <= decimals as usize
}

/// Token precision with the registry fallback applied (`0` means unknown).
pub fn effective_decimals(decimals: Option<u32>) -> u32 {
    decimals.filter(|d| *d > 0).unwrap_or(DEFAULT_TOKEN_DECIMALS)
}
