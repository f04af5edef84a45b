//! # Loan Normalization
//!
//! The one place a loosely-typed chain record becomes a [`LoanRecord`].
//! Every resolution strategy calls [`normalize_loan`]; none of them reads a
//! loan field on its own.
//!
//! ## Priority Table
//!
//! For each field, aliases are probed in table order, and for each alias
//! the representations in [`REPRESENTATION_PRIORITY`] order
//! (human → json → direct). The first present value that parses for the
//! field wins. Present but unparseable values are skipped, so a human-form
//! balance like `"1.0000 kUnit"` gives way to the raw JSON integer behind
//! it.
//!
//! | Field      | Aliases                                          | Default     |
//! |------------|--------------------------------------------------|-------------|
//! | borrower   | `borrower`, `account`                            | `"Unknown"` |
//! | collateral | `collateralAmount`, `collateral_amount`, `collateral` | `0`    |
//! | principal  | `loanAmount`, `loan_amount`, `principal`         | `0`         |
//! | ltv        | `ltv`                                            | `None`      |
//! | status     | `status`                                         | `Active`    |
//!
//! Every default taken is reported as [`DiagnosticKind::FieldDefaulted`].
//!
//! [`REPRESENTATION_PRIORITY`]: crate::chain::REPRESENTATION_PRIORITY

use serde_json::Value;

use super::record::{LoanRecord, LoanStatus, UNKNOWN_BORROWER};
use crate::amount::RawAmount;
use crate::chain::RawRecord;
use crate::diagnostics::{DiagnosticEvent, DiagnosticKind, DiagnosticSink};

/// A logical loan field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanField {
    Borrower,
    Collateral,
    Principal,
    Ltv,
    Status,
}

impl LoanField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Borrower => "borrower",
            Self::Collateral => "collateral",
            Self::Principal => "principal",
            Self::Ltv => "ltv",
            Self::Status => "status",
        }
    }

    /// Field names to probe, highest priority first.
    pub fn aliases(&self) -> &'static [&'static str] {
        FIELD_PRIORITY
            .iter()
            .find(|(field, _)| field == self)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }
}

/// Alias priority per field.
pub const FIELD_PRIORITY: [(LoanField, &[&str]); 5] = [
    (LoanField::Borrower, &["borrower", "account"]),
    (
        LoanField::Collateral,
        &["collateralAmount", "collateral_amount", "collateral"],
    ),
    (LoanField::Principal, &["loanAmount", "loan_amount", "principal"]),
    (LoanField::Ltv, &["ltv"]),
    (LoanField::Status, &["status"]),
];

/// Normalizes one raw loan stored under `id`.
pub fn normalize_loan(id: &str, record: &RawRecord, sink: &dyn DiagnosticSink) -> LoanRecord {
    let field = |field: LoanField, parse: fn(&Value) -> Option<FieldValue>| {
        extract(id, record, field, sink, parse)
    };

    let borrower = match field(LoanField::Borrower, parse_text) {
        Some(FieldValue::Text(s)) => s,
        _ => UNKNOWN_BORROWER.to_string(),
    };
    let collateral = match field(LoanField::Collateral, parse_amount) {
        Some(FieldValue::Amount(a)) => a,
        _ => RawAmount::ZERO,
    };
    let principal = match field(LoanField::Principal, parse_amount) {
        Some(FieldValue::Amount(a)) => a,
        _ => RawAmount::ZERO,
    };
    let ltv = match field(LoanField::Ltv, parse_text) {
        Some(FieldValue::Text(s)) => Some(s),
        _ => None,
    };
    let status = match field(LoanField::Status, parse_status) {
        Some(FieldValue::Status(s)) => s,
        _ => LoanStatus::Active,
    };

    LoanRecord {
        id: id.to_string(),
        borrower,
        collateral,
        principal,
        ltv,
        status,
    }
}

enum FieldValue {
    Text(String),
    Amount(RawAmount),
    Status(LoanStatus),
}

fn extract(
    id: &str,
    record: &RawRecord,
    field: LoanField,
    sink: &dyn DiagnosticSink,
    parse: fn(&Value) -> Option<FieldValue>,
) -> Option<FieldValue> {
    let mut rejected = None;
    for alias in field.aliases() {
        for (representation, value) in record.candidates(std::slice::from_ref(alias)) {
            match parse(value) {
                Some(parsed) => return Some(parsed),
                None if rejected.is_none() => {
                    rejected = Some((*alias, representation, value.to_string()));
                }
                None => {}
            }
        }
    }

    let mut event = DiagnosticEvent::new(DiagnosticKind::FieldDefaulted)
        .with("loan_id", id)
        .with("field", field.as_str());
    event = match rejected {
        Some((alias, representation, raw)) => event
            .with("reason", "unparseable")
            .with("alias", alias)
            .with("representation", representation.as_str())
            .with("value", raw),
        None => event.with("reason", "absent"),
    };
    sink.report(event);
    None
}

fn parse_text(value: &Value) -> Option<FieldValue> {
    match value {
        Value::String(s) => Some(FieldValue::Text(s.trim().to_string())),
        Value::Number(n) => Some(FieldValue::Text(n.to_string())),
        _ => None,
    }
}

fn parse_amount(value: &Value) -> Option<FieldValue> {
    RawAmount::from_json(value).map(FieldValue::Amount)
}

fn parse_status(value: &Value) -> Option<FieldValue> {
    let label = match value {
        Value::String(s) => s.as_str(),
        // Enum variants with data render as `{ "Variant": … }`.
        Value::Object(map) if map.len() == 1 => map.keys().next()?.as_str(),
        _ => return None,
    };
    Some(FieldValue::Status(LoanStatus::from_label(label)))
}
