//! Conversion between integer base units (wei) and decimal strings

use num_bigint::BigUint;

use crate::split_at_decimal_point;

#[derive(Debug, Clone, Hash, Eq, PartialEq, thiserror::Error)]
pub enum UnitsError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid digit in amount: {0}")]
    InvalidDigit(String),

    #[error("amount has more than {max} decimal places")]
    TooManyDecimals { max: u8 },
}

/// Format a base unit value as a decimal string, `1500000000000000000` with 18 decimals is `1.5`
///
/// Always keeps at least one fractional digit, so whole values render as `1.0`
pub fn format_units(value: &BigUint, decimals: u8) -> String {
    let digits = value.to_str_radix(10);
    let decimals = decimals as usize;

    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{digits}", "0".repeat(decimals + 1 - digits.len()))
    } else {
        digits
    };

    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');
    let frac_part = if frac_part.is_empty() { "0" } else { frac_part };

    format!("{int_part}.{frac_part}")
}

/// Parse a decimal string into base units
pub fn parse_units(amount: &str, decimals: u8) -> Result<BigUint, UnitsError> {
    let amount = amount.trim();
    if amount.is_empty() || amount == "." {
        return Err(UnitsError::Empty);
    }

    let (int_part, _, frac_part) = split_at_decimal_point(amount);
    let all_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());

    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err(UnitsError::InvalidDigit(amount.to_string()));
    }

    if frac_part.len() > decimals as usize {
        return Err(UnitsError::TooManyDecimals { max: decimals });
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let padding = "0".repeat(decimals as usize - frac_part.len());
    let combined = format!("{int_part}{frac_part}{padding}");

    BigUint::parse_bytes(combined.as_bytes(), 10)
        .ok_or_else(|| UnitsError::InvalidDigit(amount.to_string()))
}
