//! Hex quantity encoding helpers.
//!
//! JSON-RPC expresses numeric values as minimal `0x`-prefixed hex strings;
//! action parameter building and response parsing share these helpers.

use std::num::ParseIntError;

/// Encodes an integer as a minimal `0x`-prefixed hex quantity.
pub fn to_hex_quantity<T: std::fmt::LowerHex>(value: T) -> String {
	format!("{:#x}", value)
}

/// Parses a `0x`-prefixed hex quantity into a `u64`.
pub fn from_hex_quantity(value: &str) -> Result<u64, ParseIntError> {
	u64::from_str_radix(value.trim_start_matches("0x"), 16)
}
