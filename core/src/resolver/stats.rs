//! Admin summary over a resolved loan list.

use serde::Serialize;

use super::record::LoanRecord;
use crate::amount::RawAmount;
use crate::config::RECENT_LOANS_LIMIT;

/// Totals for the admin view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanStats {
    pub total_loans: usize,
    pub active_loans: usize,
    /// Sum of principals. Saturates at the largest representable balance.
    pub total_principal: RawAmount,
    pub total_collateral: RawAmount,
    /// Most recently discovered loans first.
    pub recent: Vec<LoanRecord>,
}

impl LoanStats {
    /// Summarizes `loans`, which must already be in resolution order
    /// (most recent first).
    pub fn from_records(loans: &[LoanRecord]) -> Self {
        Self::with_recent_limit(loans, RECENT_LOANS_LIMIT)
    }

    pub fn with_recent_limit(loans: &[LoanRecord], limit: usize) -> Self {
        let sum = |amount: fn(&LoanRecord) -> RawAmount| {
            loans.iter().fold(RawAmount::ZERO, |acc, loan| {
                acc.checked_add(amount(loan))
                    .unwrap_or(RawAmount::new(u128::MAX))
            })
        };
        Self {
            total_loans: loans.len(),
            active_loans: loans.iter().filter(|l| l.status.is_active()).count(),
            total_principal: sum(|l| l.principal),
            total_collateral: sum(|l| l.collateral),
            recent: loans.iter().take(limit).cloned().collect(),
        }
    }
}
