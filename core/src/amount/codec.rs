//! # Balance Codec
//!
//! Raw ledger integers → fixed-precision display strings.
//!
//! ```text
//! raw = 1234567890123, decimals = 12
//!   digits    "1234567890123"
//!   split     "1" | "234567890123"      (raw / 10^12, raw % 10^12)
//!   truncate  "1" | "2345"              (never rounds)
//!   result    "1.2345"
//! ```
//!
//! The split is done on the decimal digit string, which is the same as
//! integer division by `10^decimals` but has no width limit: a chain value
//! wider than `u128` still renders correctly.

use std::sync::Arc;

use super::{clean_chain_digits, DecimalAmount, RawAmount};
use crate::config::{DISPLAY_PRECISION, MAX_DECIMALS};
use crate::diagnostics::{DiagnosticEvent, DiagnosticKind, SharedSink, TracingSink};

/// Splits a plain digit string into `(integer, fraction)` at `decimals`
/// places from the right. The fraction is zero-left-padded to exactly
/// `decimals` digits; the integer part has no leading zeros.
fn split_digits(digits: &str, decimals: usize) -> (String, String) {
    let significant = digits.trim_start_matches('0');
    if significant.len() <= decimals {
        let fraction = format!("{significant:0>decimals$}");
        return ("0".to_string(), fraction);
    }
    let (integer, fraction) = significant.split_at(significant.len() - decimals);
    (integer.to_string(), fraction.to_string())
}

/// Renders `raw` with its full fraction: exactly `decimals` fraction digits,
/// no truncation. With `decimals == 0` there is no decimal point.
///
/// This is the exact inverse of [`parse_amount`](super::parse_amount).
///
/// ```
/// use halal_lending_core::amount::{to_full_decimal, RawAmount};
///
/// assert_eq!(to_full_decimal(RawAmount::new(1_500_000), 6), "1.500000");
/// assert_eq!(to_full_decimal(RawAmount::new(7), 0), "7");
/// ```
pub fn to_full_decimal(raw: RawAmount, decimals: u8) -> String {
    let (integer, fraction) = split_digits(&raw.units().to_string(), decimals as usize);
    if fraction.is_empty() {
        integer
    } else {
        format!("{integer}.{fraction}")
    }
}

/// Formats raw amounts for display at a fixed precision.
///
/// Display is read-only, so malformed input never fails: it renders as zero
/// and the condition goes to the diagnostics sink.
#[derive(Clone)]
pub struct BalanceCodec {
    precision: usize,
    sink: SharedSink,
}

impl BalanceCodec {
    /// A codec at the standard display precision reporting to `sink`.
    pub fn new(sink: SharedSink) -> Self {
        Self {
            precision: DISPLAY_PRECISION,
            sink,
        }
    }

    /// Display precision in fraction digits.
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Formats a raw amount.
    ///
    /// ```
    /// use halal_lending_core::amount::{BalanceCodec, RawAmount};
    ///
    /// let codec = BalanceCodec::default();
    /// assert_eq!(codec.to_decimal(RawAmount::new(1_234_567_890_123), 12), "1.2345");
    /// ```
    pub fn to_decimal(&self, raw: RawAmount, decimals: u8) -> DecimalAmount {
        self.render(&raw.units().to_string(), decimals)
            .unwrap_or_else(|| self.fallback(&raw.to_string(), decimals, "decimals out of range"))
    }

    /// Formats a raw amount as the chain client hands it over: a possibly
    /// missing string, possibly in human form with digit grouping.
    ///
    /// `None`, empty and unparseable input all render as zero; the last two
    /// are reported.
    pub fn format_display(&self, raw: Option<&str>, decimals: u8) -> DecimalAmount {
        let Some(input) = raw else {
            return DecimalAmount::zero(self.precision);
        };
        if input.trim().is_empty() {
            return self.fallback(input, decimals, "empty input");
        }
        match clean_chain_digits(input) {
            Some(digits) => self
                .render(&digits, decimals)
                .unwrap_or_else(|| self.fallback(input, decimals, "decimals out of range")),
            None => self.fallback(input, decimals, "not an unsigned integer"),
        }
    }

    fn render(&self, digits: &str, decimals: u8) -> Option<DecimalAmount> {
        if decimals > MAX_DECIMALS {
            return None;
        }
        let (integer, fraction) = split_digits(digits, decimals as usize);
        let mut shown: String = fraction.chars().take(self.precision).collect();
        while shown.len() < self.precision {
            shown.push('0');
        }
        Some(DecimalAmount::from_parts(&integer, &shown))
    }

    fn fallback(&self, input: &str, decimals: u8, reason: &str) -> DecimalAmount {
        self.sink.report(
            DiagnosticEvent::new(DiagnosticKind::AmountParseFallback)
                .with("input", input)
                .with("decimals", decimals)
                .with("reason", reason),
        );
        DecimalAmount::zero(self.precision)
    }
}

impl Default for BalanceCodec {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}
