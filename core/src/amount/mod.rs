//! # Amount Module — Raw Ledger Units & Display Decimals
//!
//! Money crosses this module in exactly two directions:
//!
//! ```text
//! chain  ──RawAmount──▶ codec.rs  ──DecimalAmount──▶ display
//! input  ──"1.5"──────▶ parser.rs ──RawAmount──────▶ transaction intent
//! ```
//!
//! ## Design Principles
//!
//! 1. **No floating point. Anywhere.** A 12-decimal token with a 9-digit
//!    integer part already exceeds what an `f64` can hold exactly. Every
//!    conversion here is digit-string splitting plus integer arithmetic.
//!
//! 2. **Display degrades, encoding fails.** A balance that cannot be parsed
//!    for display becomes `"0.0000"` and a diagnostic, because a wrong read
//!    cannot move funds. An amount that cannot be parsed for a transaction is
//!    an [`AmountError`], because a wrong write can.
//!
//! 3. **`RawAmount` is the chain's `Balance`.** A `u128` newtype. The display
//!    path works on digit strings and has no width limit; the encode path
//!    rejects anything wider than `u128` as an overflow.

pub mod codec;
pub mod currency;
pub mod parser;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use codec::{to_full_decimal, BalanceCodec};
pub use currency::CurrencyDescriptor;
pub use parser::{parse_amount, ParsePolicy, QuantityParser};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an amount string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// Nothing but whitespace.
    Empty,
    /// Not a plain non-negative decimal literal.
    Malformed,
    /// More significant fraction digits than the currency carries.
    ExcessPrecision {
        /// Fraction digits the currency allows.
        allowed: u8,
        /// Fraction digits the input carried.
        given: usize,
    },
    /// Wider than the chain's balance type.
    Overflow,
    /// The currency declares more decimals than the protocol allows.
    DecimalsOutOfRange(u8),
    /// Zero where a transaction needs a positive amount.
    Zero,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty input"),
            Self::Malformed => write!(f, "not a non-negative decimal number"),
            Self::ExcessPrecision { allowed, given } => write!(
                f,
                "{given} fraction digits given, currency allows {allowed}"
            ),
            Self::Overflow => write!(f, "exceeds the maximum representable balance"),
            Self::DecimalsOutOfRange(d) => write!(f, "decimals {d} out of range [0, 18]"),
            Self::Zero => write!(f, "amount must be greater than zero"),
        }
    }
}

/// Errors from encoding a user-supplied amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The input cannot be turned into an exact raw amount.
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount {
        /// The rejected input, verbatim.
        input: String,
        /// What was wrong with it.
        reason: InvalidReason,
    },
}

impl AmountError {
    pub(crate) fn invalid(input: &str, reason: InvalidReason) -> Self {
        Self::InvalidAmount {
            input: input.to_string(),
            reason,
        }
    }

    /// The rejection reason.
    pub fn reason(&self) -> &InvalidReason {
        match self {
            Self::InvalidAmount { reason, .. } => reason,
        }
    }
}

// ---------------------------------------------------------------------------
// RawAmount
// ---------------------------------------------------------------------------

/// A balance in the ledger's smallest unit.
///
/// Serialized as a decimal string so JSON consumers never see a number they
/// would round.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RawAmount(u128);

impl RawAmount {
    /// Zero units.
    pub const ZERO: Self = Self(0);

    /// Wraps a raw unit count.
    pub const fn new(units: u128) -> Self {
        Self(units)
    }

    /// The raw unit count.
    pub const fn units(&self) -> u128 {
        self.0
    }

    /// Returns `true` for zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition. `None` on overflow.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Parses a balance as the chain client renders it.
    ///
    /// Accepts plain digits, human-form digits with `,` or `_` grouping
    /// (`"1,000,000"`), and `0x`-prefixed hex (how machine JSON renders
    /// wide integers). Returns `None` for anything else, or on overflow.
    pub fn from_chain_str(input: &str) -> Option<Self> {
        clean_chain_digits(input)?.parse::<u128>().ok().map(Self)
    }

    /// Reads a balance out of a JSON value: a number, or a string accepted
    /// by [`RawAmount::from_chain_str`].
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_u64().map(|v| Self(v as u128)),
            serde_json::Value::String(s) => Self::from_chain_str(s),
            _ => None,
        }
    }
}

impl From<u128> for RawAmount {
    fn from(units: u128) -> Self {
        Self(units)
    }
}

impl From<u64> for RawAmount {
    fn from(units: u64) -> Self {
        Self(units as u128)
    }
}

impl From<RawAmount> for String {
    fn from(amount: RawAmount) -> Self {
        amount.0.to_string()
    }
}

impl TryFrom<String> for RawAmount {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for RawAmount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_chain_str(s).ok_or_else(|| format!("not a raw amount: {s:?}"))
    }
}

impl fmt::Debug for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawAmount({})", self.0)
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalizes a chain-rendered integer to a plain decimal digit string.
///
/// Strips whitespace and `,`/`_` grouping. Hex (`0x…`) is converted through
/// `u128`, which is the widest integer the chain client renders as hex.
pub(crate) fn clean_chain_digits(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if let Some(hex_digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex_digits.is_empty() {
            return None;
        }
        return u128::from_str_radix(hex_digits, 16)
            .ok()
            .map(|v| v.to_string());
    }

    let digits: String = trimmed.chars().filter(|c| *c != ',' && *c != '_').collect();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits)
}

// ---------------------------------------------------------------------------
// DecimalAmount
// ---------------------------------------------------------------------------

/// A display string of the form `"<integer>.<fraction>"`.
///
/// Ordering compares numeric value, not text: `"10.0000" > "9.9999"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DecimalAmount(String);

impl DecimalAmount {
    pub(crate) fn from_parts(integer: &str, fraction: &str) -> Self {
        Self(format!("{integer}.{fraction}"))
    }

    /// The zero amount at the given display precision.
    pub fn zero(precision: usize) -> Self {
        Self(format!("0.{}", "0".repeat(precision)))
    }

    /// The display string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> (&str, &str) {
        self.0.split_once('.').unwrap_or((self.0.as_str(), ""))
    }
}

impl fmt::Display for DecimalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for DecimalAmount {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Ord for DecimalAmount {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a_int, a_frac) = self.parts();
        let (b_int, b_frac) = other.parts();
        a_int
            .len()
            .cmp(&b_int.len())
            .then_with(|| a_int.cmp(b_int))
            .then_with(|| a_frac.cmp(b_frac))
    }
}

impl PartialOrd for DecimalAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
