//! # Quantity Parser
//!
//! User-typed decimal strings → raw ledger integers, for amounts that end up
//! in a transaction. The inverse of [`to_full_decimal`](super::to_full_decimal).
//!
//! ```text
//! "1.5", decimals 12
//!   split     "1" | "5"
//!   pad       "1" | "500000000000"
//!   join      "1500000000000"
//!   parse     1_500_000_000_000 (u128)
//! ```
//!
//! Unlike display formatting this path never defaults. A string it cannot
//! convert exactly is an [`AmountError`], full stop.

use super::{AmountError, InvalidReason, RawAmount};
use crate::config::MAX_DECIMALS;

/// What to do with fraction digits beyond the currency's decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsePolicy {
    /// Reject input whose excess digits are not all zero.
    #[default]
    Reject,
    /// Drop excess digits. Only for callers that explicitly asked for it.
    Truncate,
}

/// Parses a decimal amount with the default [`ParsePolicy::Reject`].
///
/// ```
/// use halal_lending_core::amount::parse_amount;
///
/// assert_eq!(parse_amount("1.5", 12).unwrap().units(), 1_500_000_000_000);
/// assert!(parse_amount("abc", 12).is_err());
/// ```
pub fn parse_amount(input: &str, decimals: u8) -> Result<RawAmount, AmountError> {
    QuantityParser::default().parse(input, decimals)
}

/// Decimal string → [`RawAmount`] under a fixed excess-precision policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantityParser {
    policy: ParsePolicy,
}

impl QuantityParser {
    /// A parser with the given policy.
    pub fn new(policy: ParsePolicy) -> Self {
        Self { policy }
    }

    /// The configured policy.
    pub fn policy(&self) -> ParsePolicy {
        self.policy
    }

    /// Converts `input` to raw units at `decimals` places.
    ///
    /// Accepts `12`, `12.`, `.5` and `12.5`, with surrounding whitespace.
    /// Rejects signs, exponents, digit grouping and anything non-ASCII.
    ///
    /// # Errors
    ///
    /// [`AmountError::InvalidAmount`] when the input is empty or malformed,
    /// carries non-zero digits beyond `decimals` under [`ParsePolicy::Reject`],
    /// overflows `u128`, or when `decimals` exceeds 18.
    pub fn parse(&self, input: &str, decimals: u8) -> Result<RawAmount, AmountError> {
        if decimals > MAX_DECIMALS {
            return Err(AmountError::invalid(
                input,
                InvalidReason::DecimalsOutOfRange(decimals),
            ));
        }

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AmountError::invalid(input, InvalidReason::Empty));
        }

        let (integer, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (integer.is_empty() && fraction.is_empty()) || !all_digits(integer) || !all_digits(fraction)
        {
            return Err(AmountError::invalid(input, InvalidReason::Malformed));
        }

        let places = decimals as usize;
        let kept = if fraction.len() > places {
            let (kept, excess) = fraction.split_at(places);
            if self.policy == ParsePolicy::Reject && excess.bytes().any(|b| b != b'0') {
                return Err(AmountError::invalid(
                    input,
                    InvalidReason::ExcessPrecision {
                        allowed: decimals,
                        given: fraction.len(),
                    },
                ));
            }
            kept
        } else {
            fraction
        };

        let mut joined = String::with_capacity(integer.len() + places);
        joined.push_str(integer);
        joined.push_str(kept);
        for _ in kept.len()..places {
            joined.push('0');
        }

        let significant = joined.trim_start_matches('0');
        if significant.is_empty() {
            return Ok(RawAmount::ZERO);
        }
        significant
            .parse::<u128>()
            .map(RawAmount::new)
            .map_err(|_| AmountError::invalid(input, InvalidReason::Overflow))
    }
}
