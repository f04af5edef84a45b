//! # Transaction Intents
//!
//! Plain values describing what the user asked to sign. Building and
//! submitting the extrinsic belongs to the signing collaborator; this module
//! only guarantees the amounts inside are exact raw units produced by the
//! [`QuantityParser`].
//!
//! ```text
//! "1.5" + DOT ──QuantityParser──▶ 1_500_000_000_000 ──▶ TransferIntent
//! ```

use serde::Serialize;

use crate::account::DerivedAddress;
use crate::amount::{
    to_full_decimal, AmountError, CurrencyDescriptor, InvalidReason, QuantityParser, RawAmount,
};
use crate::config::NATIVE_CURRENCY_ID;

fn positive(
    parser: &QuantityParser,
    input: &str,
    currency: CurrencyDescriptor,
) -> Result<RawAmount, AmountError> {
    let amount = parser.parse(input, currency.decimals)?;
    if amount.is_zero() {
        return Err(AmountError::invalid(input, InvalidReason::Zero));
    }
    Ok(amount)
}

/// A deposit into the pallet account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferIntent {
    pub destination: DerivedAddress,
    pub currency: CurrencyDescriptor,
    pub amount: RawAmount,
    /// `amount` at full precision, for the confirmation prompt.
    pub amount_decimal: String,
}

impl TransferIntent {
    /// Parses `input` in `currency` units. Zero is rejected.
    pub fn deposit(
        parser: &QuantityParser,
        destination: DerivedAddress,
        currency: CurrencyDescriptor,
        input: &str,
    ) -> Result<Self, AmountError> {
        let amount = positive(parser, input, currency)?;
        Ok(Self {
            destination,
            currency,
            amount,
            amount_decimal: to_full_decimal(amount, currency.decimals),
        })
    }
}

/// Arguments of `createLoan(collateral_currency: u32, collateral: u128,
/// loan_currency: u32, loan: u128)`.
///
/// Both currency ids are always the native currency: the pallet accepts
/// nothing else, whatever currency the amounts were typed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanIntent {
    pub collateral_currency_id: u32,
    pub collateral_amount: RawAmount,
    pub loan_currency_id: u32,
    pub loan_amount: RawAmount,
}

impl LoanIntent {
    pub fn new(
        parser: &QuantityParser,
        collateral_input: &str,
        collateral: CurrencyDescriptor,
        loan_input: &str,
        loan: CurrencyDescriptor,
    ) -> Result<Self, AmountError> {
        Ok(Self {
            collateral_currency_id: NATIVE_CURRENCY_ID,
            collateral_amount: positive(parser, collateral_input, collateral)?,
            loan_currency_id: NATIVE_CURRENCY_ID,
            loan_amount: positive(parser, loan_input, loan)?,
        })
    }
}

/// Arguments of `repayLoan(loan_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepayIntent {
    pub loan_id: String,
}

impl RepayIntent {
    pub fn new(loan_id: impl Into<String>) -> Self {
        Self {
            loan_id: loan_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountId;
    use crate::amount::currency::{DOT, USDT, VDOT};
    use crate::amount::ParsePolicy;

    fn destination() -> DerivedAddress {
        DerivedAddress {
            account: AccountId::new([1u8; 32]),
            address: "5PalletAccount".into(),
        }
    }

    #[test]
    fn deposit_parses_in_currency_units() {
        let intent =
            TransferIntent::deposit(&QuantityParser::default(), destination(), USDT, "2.5").unwrap();
        assert_eq!(intent.amount, RawAmount::new(2_500_000));
        assert_eq!(intent.amount_decimal, "2.500000");
    }

    #[test]
    fn deposit_rejects_zero_and_excess_precision() {
        let parser = QuantityParser::default();
        let err = TransferIntent::deposit(&parser, destination(), DOT, "0.000").unwrap_err();
        assert_eq!(err.reason(), &InvalidReason::Zero);

        let err = TransferIntent::deposit(&parser, destination(), USDT, "1.0000001").unwrap_err();
        assert!(matches!(err.reason(), InvalidReason::ExcessPrecision { .. }));
    }

    #[test]
    fn truncating_parser_is_honored() {
        let parser = QuantityParser::new(ParsePolicy::Truncate);
        let intent = TransferIntent::deposit(&parser, destination(), USDT, "1.0000009").unwrap();
        assert_eq!(intent.amount, RawAmount::new(1_000_000));
    }

    #[test]
    fn loan_intent_always_uses_native_currency_id() {
        let intent =
            LoanIntent::new(&QuantityParser::default(), "150", VDOT, "100", DOT).unwrap();
        assert_eq!(intent.collateral_currency_id, NATIVE_CURRENCY_ID);
        assert_eq!(intent.loan_currency_id, NATIVE_CURRENCY_ID);
        assert_eq!(intent.collateral_amount, RawAmount::new(150_000_000_000_000));
        assert_eq!(intent.loan_amount, RawAmount::new(100_000_000_000_000));
    }

    #[test]
    fn loan_intent_surfaces_invalid_amounts() {
        let err = LoanIntent::new(&QuantityParser::default(), "abc", VDOT, "1", DOT).unwrap_err();
        assert_eq!(err.reason(), &InvalidReason::Malformed);
    }

    #[test]
    fn intents_serialize_to_camel_case_json() {
        let intent = LoanIntent::new(&QuantityParser::default(), "1", VDOT, "0.5", DOT).unwrap();
        let json = serde_json::to_value(intent).unwrap();
        assert_eq!(json["collateralCurrencyId"], 0);
        assert_eq!(json["loanAmount"], "500000000000");

        let repay = serde_json::to_value(RepayIntent::new("7")).unwrap();
        assert_eq!(repay["loanId"], "7");
    }
}
