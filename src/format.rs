//! Display helpers for addresses and amounts.

use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::{Address, U256};

/// `0x` + 4 leading and last 4 hex digits: `0xAbCd...0001`.
pub fn short_address(address: &str) -> String {
    trim_middle(address, 6, 4)
}

/// Checksummed form of [`short_address`].
pub fn short(address: Address) -> String {
    short_address(&address.to_checksum(None))
}

/// Keep `head` leading and `tail` trailing characters joined by `...`.
/// Strings too short to shorten are returned as is.
pub fn trim_middle(value: &str, head: usize, tail: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= head + tail {
        return value.to_string();
    }
    let start: String = chars[..head].iter().collect();
    let end: String = chars[chars.len() - tail..].iter().collect();
    format!("{}...{}", start, end)
}

/// Native balance in ether units rounded to 4 decimals: `1.2346`.
pub fn format_native(wei: U256) -> String {
    const SCALE: u64 = 100_000_000_000_000; // 10^14: 18 - 4 decimals
    let rounded = (wei + U256::from(SCALE / 2)) / U256::from(SCALE);
    let whole = rounded / U256::from(10_000u64);
    let fraction = rounded % U256::from(10_000u64);
    format!("{}.{:0>4}", whole, fraction.to_string())
}

/// Token amount with the token's decimals, trailing zeros dropped: `12.5`.
pub fn format_token(amount: U256, decimals: u8) -> String {
    match format_units(amount, decimals) {
        Ok(formatted) => trim_fraction(&formatted),
        Err(_) => amount.to_string(),
    }
}

/// Parse a user-entered decimal amount into base units.
pub fn parse_token(amount: &str, decimals: u8) -> Option<U256> {
    let parsed = parse_units(amount.trim(), decimals).ok()?;
    if parsed.is_negative() {
        return None;
    }
    Some(parsed.get_absolute())
}

/// Owner address as shown next to the token: first 10 and last 3 characters.
pub fn short_owner(owner: Address) -> String {
    trim_middle(&owner.to_checksum(None), 10, 3)
}

/// Total supply as shown next to the token: first 12 and last 3 characters.
pub fn short_supply(total_supply: U256, decimals: u8) -> String {
    trim_middle(&format_token(total_supply, decimals), 12, 3)
}

fn trim_fraction(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => formatted.to_string(),
    }
}
