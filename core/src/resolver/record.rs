//! Normalized loan records.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::amount::RawAmount;

/// Borrower shown when a record names none.
pub const UNKNOWN_BORROWER: &str = "Unknown";

/// Lifecycle state of a loan. Anything but `Active` is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LoanStatus {
    #[default]
    Active,
    Other(String),
}

impl LoanStatus {
    /// Maps a chain label. `"Active"` matches case-insensitively, since the
    /// human and JSON forms disagree on case.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case("active") {
            Self::Active
        } else {
            Self::Other(label.to_string())
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "Active",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LoanStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One loan, with every field resolved to a concrete value.
///
/// Built fresh by each resolution call and owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    /// Storage key the loan was found under.
    pub id: String,
    /// Borrower address as the chain rendered it, or [`UNKNOWN_BORROWER`].
    #[serde(rename = "borrowerAddress")]
    pub borrower: String,
    #[serde(rename = "collateralRaw")]
    pub collateral: RawAmount,
    #[serde(rename = "principalRaw")]
    pub principal: RawAmount,
    /// Loan-to-value as published; `None` when the record has none.
    pub ltv: Option<String>,
    pub status: LoanStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels() {
        assert_eq!(LoanStatus::from_label("Active"), LoanStatus::Active);
        assert_eq!(LoanStatus::from_label("active"), LoanStatus::Active);
        assert_eq!(
            LoanStatus::from_label("Liquidated"),
            LoanStatus::Other("Liquidated".into())
        );
        assert!(!LoanStatus::from_label("Repaid").is_active());
    }

    #[test]
    fn record_serializes_amounts_as_strings() {
        let record = LoanRecord {
            id: "1".into(),
            borrower: UNKNOWN_BORROWER.into(),
            collateral: RawAmount::new(10),
            principal: RawAmount::ZERO,
            ltv: None,
            status: LoanStatus::Active,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["borrowerAddress"], UNKNOWN_BORROWER);
        assert_eq!(json["collateralRaw"], "10");
        assert_eq!(json["principalRaw"], "0");
        assert!(json.get("borrower").is_none());
        assert_eq!(json["status"], "Active");
        assert!(json["ltv"].is_null());
    }
}
