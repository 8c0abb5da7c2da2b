pub mod result_ext;
pub mod units;

pub use result_ext::ResultExt;

/// Split an amount string around its decimal point, returns (before, ".", after)
pub fn split_at_decimal_point(amount: &str) -> (&str, &str, &str) {
    let decimal_index = match memchr::memchr(b'.', amount.as_bytes()) {
        Some(decimal_index) => decimal_index,
        None => return (amount, "", ""),
    };

    let before_decimal = &amount[..decimal_index];
    let after_decimal = &amount[decimal_index + 1..];
    (before_decimal, ".", after_decimal)
}

/// Strip an optional `0x` prefix
pub fn strip_hex_prefix(value: &str) -> &str {
    value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")).unwrap_or(value)
}

/// Decode a `0x` prefixed hex string into bytes
pub fn decode_prefixed_hex(value: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(strip_hex_prefix(value))
}
