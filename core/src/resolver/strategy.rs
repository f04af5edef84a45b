//! Resolution strategies, tried in [`ResolutionStrategy::ORDER`].
//!
//! ```text
//! FullScan     loans.entries()                      one query
//! IndexLookup  userLoans(owner) → loans(id) …       1 + n sequential queries
//! BoundedScan  nextLoanId | loanCount → loans(0..n) 1 + n concurrent, n ≤ cap
//! ```

use std::fmt;

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::normalize::normalize_loan;
use super::record::LoanRecord;
use super::{owned_by, Completeness, EntityResolver};
use crate::amount::RawAmount;
use crate::chain::{KeyArg, QueryError};
use crate::config::{ITEM_LOANS, ITEM_LOAN_COUNTERS, ITEM_USER_LOANS, LINEAR_SCAN_CAP};
use crate::diagnostics::{DiagnosticEvent, DiagnosticKind};

/// A way of discovering loan records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionStrategy {
    /// Iterate every entry of the loans map.
    FullScan,
    /// Read the owner's loan ids, then each loan by id.
    IndexLookup,
    /// Fetch loan ids `0..min(count, cap)` in one concurrent batch.
    BoundedScan,
}

impl ResolutionStrategy {
    pub const ORDER: [Self; 3] = [Self::FullScan, Self::IndexLookup, Self::BoundedScan];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullScan => "full_scan",
            Self::IndexLookup => "index_lookup",
            Self::BoundedScan => "bounded_scan",
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one strategy produced.
pub(crate) enum Outcome {
    /// The chain lacks what the strategy needs.
    Unavailable(&'static str),
    /// The strategy's own query failed.
    Failed(QueryError),
    Found {
        loans: Vec<LoanRecord>,
        completeness: Completeness,
    },
}

impl Outcome {
    fn complete(loans: Vec<LoanRecord>) -> Self {
        Self::Found {
            loans,
            completeness: Completeness::Complete,
        }
    }
}

impl EntityResolver {
    pub(crate) async fn run_strategy(
        &self,
        strategy: ResolutionStrategy,
        owner: Option<&str>,
    ) -> Outcome {
        debug!(%strategy, owner = owner.unwrap_or("*"), "running resolution strategy");
        match strategy {
            ResolutionStrategy::FullScan => self.full_scan(owner).await,
            ResolutionStrategy::IndexLookup => self.index_lookup(owner).await,
            ResolutionStrategy::BoundedScan => self.bounded_scan(owner).await,
        }
    }

    async fn full_scan(&self, owner: Option<&str>) -> Outcome {
        if !self.chain.has_item(&self.pallet, ITEM_LOANS) {
            return Outcome::Unavailable("loans map not exposed");
        }
        let entries = match self
            .timed(ITEM_LOANS, self.chain.entries(&self.pallet, ITEM_LOANS))
            .await
        {
            Ok(entries) => entries,
            Err(e) => return Outcome::Failed(e),
        };

        let loans = entries
            .iter()
            .filter(|entry| !entry.value.is_empty())
            .map(|entry| {
                let id = entry
                    .key
                    .first()
                    .map_or_else(|| "0".to_string(), KeyArg::to_string);
                normalize_loan(&id, &entry.value, self.sink.as_ref())
            })
            .filter(|loan| owned_by(loan, owner))
            .collect();
        Outcome::complete(loans)
    }

    async fn index_lookup(&self, owner: Option<&str>) -> Outcome {
        let Some(owner) = owner else {
            return Outcome::Unavailable("index lookup needs an owner");
        };
        if !self.chain.has_item(&self.pallet, ITEM_USER_LOANS) {
            return Outcome::Unavailable("userLoans index not exposed");
        }

        let key = [KeyArg::Text(owner.to_string())];
        let index = match self
            .timed(
                ITEM_USER_LOANS,
                self.chain.get(&self.pallet, ITEM_USER_LOANS, &key),
            )
            .await
        {
            Ok(Some(record)) => record,
            Ok(None) => return Outcome::complete(Vec::new()),
            Err(e) => return Outcome::Failed(e),
        };

        let ids: Vec<KeyArg> = index
            .scalar()
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(KeyArg::from_json).collect())
            .unwrap_or_default();

        let mut loans = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(loan) = self.fetch_loan(id).await {
                if owned_by(&loan, Some(owner)) {
                    loans.push(loan);
                }
            }
        }
        Outcome::complete(loans)
    }

    async fn bounded_scan(&self, owner: Option<&str>) -> Outcome {
        if !self.chain.has_item(&self.pallet, ITEM_LOANS) {
            return Outcome::Unavailable("loans map not exposed");
        }

        let total = self.loan_count().await;
        let bound = total.map_or(self.scan_cap, |count| count.min(self.scan_cap));

        let mut loans = Vec::new();
        let mut start = 0;
        while start < bound {
            let end = bound.min(start + LINEAR_SCAN_CAP);
            let batch = join_all((start..end).map(|id| self.fetch_loan(KeyArg::Index(id)))).await;
            loans.extend(batch.into_iter().flatten().filter(|loan| owned_by(loan, owner)));
            start = end;
        }

        let completeness = match total {
            Some(count) if count > bound => Completeness::Partial {
                scanned: bound,
                reported_total: count,
            },
            Some(_) => Completeness::Complete,
            None => Completeness::Unverified { scanned: bound },
        };
        if !completeness.is_complete() {
            self.sink.report(
                DiagnosticEvent::new(DiagnosticKind::PartialResult)
                    .with("scanned", bound)
                    .with(
                        "reported_total",
                        total.map_or_else(|| "unknown".to_string(), |t| t.to_string()),
                    ),
            );
        }

        Outcome::Found {
            loans,
            completeness,
        }
    }

    /// Reads the first loan counter the chain exposes.
    async fn loan_count(&self) -> Option<u64> {
        for item in ITEM_LOAN_COUNTERS {
            if !self.chain.has_item(&self.pallet, item) {
                continue;
            }
            match self
                .timed(item, self.chain.get(&self.pallet, item, &[]))
                .await
            {
                Ok(Some(record)) => match record.scalar().and_then(RawAmount::from_json) {
                    Some(count) => return Some(u64::try_from(count.units()).unwrap_or(u64::MAX)),
                    None => self.query_failed(item, None, "counter is not an integer"),
                },
                Ok(None) => {}
                Err(e) => self.query_failed(item, None, &e.to_string()),
            }
        }
        None
    }

    /// Fetches and normalizes one loan. Failures are absorbed: the loan is
    /// treated as absent and the failure reported.
    async fn fetch_loan(&self, id: KeyArg) -> Option<LoanRecord> {
        let key = [id];
        match self
            .timed(ITEM_LOANS, self.chain.get(&self.pallet, ITEM_LOANS, &key))
            .await
        {
            Ok(Some(record)) if !record.is_empty() => Some(normalize_loan(
                &key[0].to_string(),
                &record,
                self.sink.as_ref(),
            )),
            Ok(_) => None,
            Err(e) => {
                self.query_failed(ITEM_LOANS, Some(&key[0]), &e.to_string());
                None
            }
        }
    }

    pub(crate) fn query_failed(&self, item: &str, key: Option<&KeyArg>, error: &str) {
        let mut event = DiagnosticEvent::new(DiagnosticKind::QueryFailed)
            .with("pallet", &self.pallet)
            .with("item", item)
            .with("error", error);
        if let Some(key) = key {
            event = event.with("key", key);
        }
        self.sink.report(event);
    }
}
