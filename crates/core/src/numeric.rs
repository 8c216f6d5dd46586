//! Lenient numeric coercion for quantities and block timestamps.
//!
//! Quantities arrive as decimal strings, `0x`-prefixed hex strings, JSON
//! numbers, or not at all. A value that cannot be read as a finite number
//! contributes `0` instead of failing the aggregation it belongs to.

use alloy_primitives::U256;

/// Coerces a raw quantity string to `f64`.
///
/// - surrounding whitespace is ignored, an empty string is `0`
/// - `0x`/`0X` prefix: hexadecimal integer up to 256 bits
/// - otherwise: decimal float (`"1.5"`, `"1e18"`, `"-3"`)
///
/// Anything unparseable or non-finite yields `0.0`.
pub fn coerce_str(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }

    let parsed = match strip_hex_prefix(s) {
        Some(digits) => parse_hex_quantity(digits),
        None => s.parse::<f64>().ok(),
    };

    finite_or_zero(parsed.unwrap_or(f64::NAN))
}

/// Maps NaN and infinities to `0.0`.
#[inline]
pub fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Parses a hex-encoded Unix-seconds timestamp.
///
/// The `0x` prefix is optional and the longest leading run of hex digits is
/// used (`"0x5f5e100"` and `"5f5e100 "` both read as `100_000_000`). Returns
/// `None` when there are no digits or the value overflows `i64`.
pub fn parse_hex_seconds(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let s = strip_hex_prefix(s).unwrap_or(s);
    let end = s
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(s.len());
    i64::from_str_radix(&s[..end], 16).ok()
}

/// Parses a block number given as `0x`-hex or decimal text.
pub fn parse_block_number(raw: &str) -> Option<u64> {
    let s = raw.trim();
    match strip_hex_prefix(s) {
        Some(digits) => u64::from_str_radix(digits, 16).ok(),
        None => s.parse().ok(),
    }
}

fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

fn parse_hex_quantity(digits: &str) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    // Wei amounts routinely exceed u64; go through U256 and its decimal form
    // so the f64 is correctly rounded.
    let value = U256::from_str_radix(digits, 16).ok()?;
    value.to_string().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_strings() {
        assert_eq!(coerce_str("100"), 100.0);
        assert_eq!(coerce_str(" 2.5 "), 2.5);
        assert_eq!(coerce_str("1e3"), 1000.0);
        assert_eq!(coerce_str("-7"), -7.0);
    }

    #[test]
    fn hex_strings() {
        assert_eq!(coerce_str("0x10"), 16.0);
        assert_eq!(coerce_str("0X0"), 0.0);
        // 1 ether in wei.
        assert_eq!(coerce_str("0xde0b6b3a7640000"), 1e18);
    }

    #[test]
    fn hex_wider_than_u128() {
        let v = coerce_str("0x1000000000000000000000000000000000");
        assert_eq!(v, 2f64.powi(132));
    }

    #[test]
    fn garbage_is_zero() {
        assert_eq!(coerce_str("abc"), 0.0);
        assert_eq!(coerce_str("0x"), 0.0);
        assert_eq!(coerce_str("0xzz"), 0.0);
        assert_eq!(coerce_str("12abc"), 0.0);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(coerce_str(""), 0.0);
        assert_eq!(coerce_str("   "), 0.0);
    }

    #[test]
    fn non_finite_is_zero() {
        assert_eq!(coerce_str("inf"), 0.0);
        assert_eq!(coerce_str("NaN"), 0.0);
        assert_eq!(coerce_str("1e400"), 0.0);
        assert_eq!(finite_or_zero(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn hex_timestamps() {
        assert_eq!(parse_hex_seconds("0x5f5e100"), Some(100_000_000));
        assert_eq!(parse_hex_seconds("5f5e100"), Some(100_000_000));
        assert_eq!(parse_hex_seconds("0x1fzz"), Some(31));
        assert_eq!(parse_hex_seconds("0x"), None);
        assert_eq!(parse_hex_seconds("zz"), None);
    }

    #[test]
    fn block_numbers() {
        assert_eq!(parse_block_number("0x1036f0b"), Some(17_002_251));
        assert_eq!(parse_block_number("42"), Some(42));
        assert_eq!(parse_block_number("forty-two"), None);
    }
}
