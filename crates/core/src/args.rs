//! Helpers for command callbacks that interpret bound arguments.
//!
//! The matcher only checks that an argument has the right shape; these
//! helpers convert it to a typed value.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Why an argument could not be converted.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    /// Not a decimal or hexadecimal number, or too large.
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    /// A number outside the accepted bounds.
    #[error("{value} is outside {min}-{max}")]
    OutOfRange {
        /// The parsed value.
        value: u32,
        /// Smallest accepted value.
        min: u32,
        /// Largest accepted value.
        max: u32,
    },

    /// Not an address of the expected family.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Not `address/length`, or the length is too long.
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    /// An index past the end of the argument list.
    #[error("missing argument {0}")]
    Missing(usize),
}

/// Join `args[start..]` with single spaces, as `LINE` callbacks need.
pub fn argv_concat(args: &[String], start: usize) -> String {
    args.get(start..).unwrap_or_default().join(" ")
}

/// Decimal `u32`, overflow-checked. A leading `+` is accepted.
pub fn str_to_u32(text: &str) -> Result<u32, ArgError> {
    let digits = text.strip_prefix('+').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ArgError::InvalidNumber(text.to_string()));
    }
    digits
        .parse()
        .map_err(|_| ArgError::InvalidNumber(text.to_string()))
}

/// Hexadecimal `u32`, with or without a `0x` prefix.
pub fn hex_str_to_u32(text: &str) -> Result<u32, ArgError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ArgError::InvalidNumber(text.to_string()));
    }
    u32::from_str_radix(digits, 16).map_err(|_| ArgError::InvalidNumber(text.to_string()))
}

/// Decimal `u32` within `min..=max`.
pub fn parse_u32_in_range(text: &str, min: u32, max: u32) -> Result<u32, ArgError> {
    let value = str_to_u32(text)?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ArgError::OutOfRange { value, min, max })
    }
}

/// Whether `mask` is a contiguous IPv4 netmask (ones followed by zeros).
pub fn mask_is_contiguous(mask: Ipv4Addr) -> bool {
    let bits = u32::from(mask);
    bits.leading_ones() + bits.trailing_zeros() == 32
}

/// IPv4 address argument.
pub fn ipv4(text: &str) -> Result<Ipv4Addr, ArgError> {
    text.parse()
        .map_err(|_| ArgError::InvalidAddress(text.to_string()))
}

/// IPv6 address argument.
pub fn ipv6(text: &str) -> Result<Ipv6Addr, ArgError> {
    text.parse()
        .map_err(|_| ArgError::InvalidAddress(text.to_string()))
}

/// IPv4 prefix argument as `(address, length)`.
pub fn ipv4_prefix(text: &str) -> Result<(Ipv4Addr, u8), ArgError> {
    let (addr, len) = split_prefix(text, 32)?;
    let addr = addr
        .parse()
        .map_err(|_| ArgError::InvalidPrefix(text.to_string()))?;
    Ok((addr, len))
}

/// IPv6 prefix argument as `(address, length)`.
pub fn ipv6_prefix(text: &str) -> Result<(Ipv6Addr, u8), ArgError> {
    let (addr, len) = split_prefix(text, 128)?;
    let addr = addr
        .parse()
        .map_err(|_| ArgError::InvalidPrefix(text.to_string()))?;
    Ok((addr, len))
}

fn split_prefix(text: &str, max_len: u8) -> Result<(&str, u8), ArgError> {
    let invalid = || ArgError::InvalidPrefix(text.to_string());
    let (addr, len) = text.split_once('/').ok_or_else(invalid)?;
    if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let len: u8 = len.parse().map_err(|_| invalid())?;
    if len > max_len {
        return Err(invalid());
    }
    Ok((addr, len))
}

/// Argument `index`, or [`ArgError::Missing`].
pub fn arg(args: &[String], index: usize) -> Result<&str, ArgError> {
    args.get(index)
        .map(String::as_str)
        .ok_or(ArgError::Missing(index))
}
