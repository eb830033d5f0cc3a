//! # Size Strings
//!
//! Parsing of human readable byte quantities such as `4096`, `0x1000`,
//! `10KiB`, `10KB`, `10K` or `0.5MiB`.
//!
//! ## Grammar
//!
//! ```text
//! size     := ws* '+'? integer ( fraction? suffix )?
//! integer  := '0x' hex+ | '0' octal* | decimal+
//! fraction := '.' digit*            (only allowed before a suffix)
//! suffix   := letter ( 'iB' | 'ib' | 'B' | 'b' )?
//! letter   := K M G T P E Z Y       (either case)
//! ```
//!
//! A bare letter or `iB` selects powers of 1024, `B` selects powers of 1000.
//! Negative numbers are rejected outright.

use crate::error::{ParseError, ParseResult};
use core::str::FromStr;

/// Multiplier letters, in increasing power
const SUFFIXES: &[u8; 8] = b"KMGTPEZY";

/// Parse a size string into a byte count
///
/// ```
/// assert_eq!(sgdiscard_core::size::parse("10KiB"), Ok(10240));
/// assert_eq!(sgdiscard_core::size::parse("10KB"), Ok(10000));
/// ```
pub fn parse(text: &str) -> ParseResult<u64> {
    ByteQuantity::parse(text).map(|q| q.bytes())
}

// =============================================================================
// Byte Quantity
// =============================================================================

/// Result of parsing a size string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteQuantity {
    bytes: u64,
    base: u32,
    power: u32,
}

impl ByteQuantity {
    /// Parse `text`
    pub fn parse(text: &str) -> ParseResult<Self> {
        let s = text.as_bytes();

        // Only non-negative numbers are acceptable
        let start = s.iter().take_while(|b| b.is_ascii_whitespace()).count();
        match s.get(start) {
            None => return Err(ParseError::InvalidFormat),
            Some(b'-') => return Err(ParseError::InvalidFormat),
            _ => {}
        }

        let (integer, consumed) = parse_integer(&s[start..])?;
        let mut rest = &s[start + consumed..];
        if rest.is_empty() {
            return Ok(Self { bytes: integer, base: 1, power: 0 });
        }

        let mut fraction = Fraction::default();
        if let Some(after_point) = rest.strip_prefix(b".") {
            let (parsed, tail) = Fraction::parse(after_point)?;
            if tail.is_empty() {
                // Fraction without a suffix
                return Err(ParseError::InvalidFormat);
            }
            fraction = parsed;
            rest = tail;
        }

        let (power, base) = parse_suffix(rest)?;
        let scaled = scale_by_power(integer, base, power).ok_or(ParseError::OutOfRange)?;
        let unit = clamped_unit(base, power);
        let extra = fraction_bytes(fraction.value, fraction.digits, fraction.leading_zeros, unit);
        let bytes = scaled.checked_add(extra).ok_or(ParseError::OutOfRange)?;

        Ok(Self { bytes, base, power })
    }

    /// Value in bytes
    #[inline]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Unit base: 1 without suffix, 1000 for `XB`, 1024 otherwise
    #[inline]
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Suffix power (K = 1 ... Y = 8), 0 without suffix
    #[inline]
    pub fn power(&self) -> u32 {
        self.power
    }
}

impl FromStr for ByteQuantity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<ByteQuantity> for u64 {
    fn from(q: ByteQuantity) -> u64 {
        q.bytes
    }
}

// =============================================================================
// Integer Prefix
// =============================================================================

/// Parse an unsigned integer with C-style base prefix
///
/// Returns the value and the number of bytes consumed. Parsing stops at the
/// first byte that is not a digit of the detected base.
fn parse_integer(s: &[u8]) -> ParseResult<(u64, usize)> {
    let sign = usize::from(s.first() == Some(&b'+'));
    let digits = &s[sign..];

    let (radix, skip) = match digits {
        [b'0', b'x' | b'X', next, ..] if next.is_ascii_hexdigit() => (16, 2),
        [b'0', ..] => (8, 0),
        _ => (10, 0),
    };

    let mut value: u64 = 0;
    let mut count = 0;
    for &b in &digits[skip..] {
        let digit = match (b as char).to_digit(radix) {
            Some(d) => u64::from(d),
            None => break,
        };
        value = value
            .checked_mul(u64::from(radix))
            .and_then(|v| v.checked_add(digit))
            .ok_or(ParseError::OutOfRange)?;
        count += 1;
    }

    if count == 0 {
        return Err(ParseError::InvalidFormat);
    }
    Ok((value, sign + skip + count))
}

// =============================================================================
// Fractional Part
// =============================================================================

/// Digits after the decimal point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Fraction {
    /// Digits after the leading zeros, as an integer
    value: u64,
    /// Number of digits in `value` (trailing zeros included)
    digits: u32,
    /// Zeros between the point and the first significant digit
    leading_zeros: u32,
}

impl Fraction {
    fn parse(s: &[u8]) -> ParseResult<(Self, &[u8])> {
        let leading_zeros = s.iter().take_while(|&&b| b == b'0').count();
        let s = &s[leading_zeros..];
        let digits = s.iter().take_while(|b| b.is_ascii_digit()).count();

        let mut value: u64 = 0;
        for &b in &s[..digits] {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(b - b'0')))
                .ok_or(ParseError::OutOfRange)?;
        }

        let fraction = Self {
            value,
            digits: digits as u32,
            leading_zeros: u32::try_from(leading_zeros).unwrap_or(u32::MAX),
        };
        Ok((fraction, &s[digits..]))
    }
}

/// Bytes contributed by a fractional part of `unit`
///
/// `fraction` is the digit string after the decimal point with its
/// `leading_zeros` removed, `digits` long. "0.05" is `(5, 1, 1)`, "0.50" is
/// `(50, 2, 0)`. The exact product is truncated once, not after each
/// digit, so "0.3KiB" is 307 bytes rather than 341.
pub fn fraction_bytes(fraction: u64, digits: u32, leading_zeros: u32, unit: u64) -> u64 {
    let mut fraction = fraction;
    let mut divisor: u64 = 1;

    for _ in 0..digits.saturating_add(leading_zeros) {
        match divisor.checked_mul(10) {
            Some(next) => divisor = next,
            // Reduce the fraction instead of the divisor overflowing
            None => fraction /= 10,
        }
    }

    if fraction == 0 {
        return 0;
    }
    let exact = u128::from(unit) * u128::from(fraction) / u128::from(divisor);
    u64::try_from(exact).unwrap_or(u64::MAX)
}

// =============================================================================
// Suffix & Scaling
// =============================================================================

/// Decode a multiplier suffix into `(power, base)`
fn parse_suffix(s: &[u8]) -> ParseResult<(u32, u32)> {
    let (&letter, tail) = s.split_first().ok_or(ParseError::InvalidFormat)?;

    let base = match tail {
        b"" | b"iB" | b"ib" => 1024,
        b"B" | b"b" => 1000,
        _ => return Err(ParseError::InvalidFormat),
    };
    let power = SUFFIXES
        .iter()
        .position(|&c| c == letter.to_ascii_uppercase())
        .ok_or(ParseError::InvalidFormat)?;

    Ok((power as u32 + 1, base))
}

/// `value * base^power`, or `None` on overflow
fn scale_by_power(value: u64, base: u32, power: u32) -> Option<u64> {
    (0..power).try_fold(value, |acc, _| acc.checked_mul(u64::from(base)))
}

/// `base^power`, stopping at the last factor that still fits in 64 bits
fn clamped_unit(base: u32, power: u32) -> u64 {
    let mut unit: u64 = 1;
    for _ in 0..power {
        match unit.checked_mul(u64::from(base)) {
            Some(next) => unit = next,
            None => break,
        }
    }
    unit
}

// =============================================================================
// Tests
// =============================================================================
