//! # Entity Resolver — Loan Discovery
//!
//! Finds loan records on a chain whose storage layout the dashboard cannot
//! know in advance. Different runtime versions expose different subsets of
//! `loans`, `userLoans`, `nextLoanId` and `loanCount`, so resolution is an
//! ordered chain of strategies:
//!
//! ```text
//! FullScan ──empty/failed──▶ IndexLookup ──empty/failed──▶ BoundedScan
//!    │                          │                            │
//!    └──────── first non-empty result wins ──────────────────┘
//!                               │
//!                  dedupe by id, reverse discovery order
//! ```
//!
//! Every strategy hands raw records to the same
//! [`normalize_loan`](normalize::normalize_loan), so the strategy that
//! happened to win never changes what a loan looks like.
//!
//! ## Failure Model
//!
//! A query that fails inside a strategy is absorbed: the strategy counts as
//! empty, the failure goes to the diagnostics sink, and the next strategy
//! runs. The only error a caller sees is [`ResolveError::SchemaMismatch`],
//! when the chain has no `loans` map and no strategy can apply at all.

pub mod normalize;
pub mod record;
pub mod stats;
pub mod strategy;

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::account::AccountId;
use crate::amount::RawAmount;
use crate::chain::{ChainQuery, QueryError};
use crate::config::{DashboardConfig, ITEM_LOANS, ITEM_REWARDS, LENDING_PALLET, LINEAR_SCAN_CAP};
use crate::crypto::ss58;
use crate::diagnostics::{DiagnosticEvent, DiagnosticKind, SharedSink};

pub use normalize::normalize_loan;
pub use record::{LoanRecord, LoanStatus, UNKNOWN_BORROWER};
pub use stats::LoanStats;
pub use strategy::ResolutionStrategy;

use strategy::Outcome;

// ---------------------------------------------------------------------------
// Errors & Results
// ---------------------------------------------------------------------------

/// Errors from loan resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No strategy applies: the chain does not expose the loans map.
    #[error("chain exposes no {pallet}.{item}; no resolution strategy applies")]
    SchemaMismatch { pallet: String, item: String },
}

/// Whether a resolution saw every loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Completeness {
    Complete,
    /// The bounded scan stopped at its cap below the chain's loan count.
    #[serde(rename_all = "camelCase")]
    Partial { scanned: u64, reported_total: u64 },
    /// The bounded scan ran without a loan count to check against.
    Unverified { scanned: u64 },
}

impl Completeness {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Loans plus how they were found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanResolution {
    /// Deduplicated by id, most recently discovered first.
    pub loans: Vec<LoanRecord>,
    /// The strategy whose result was used. `None` if all came back empty.
    pub strategy: Option<ResolutionStrategy>,
    pub completeness: Completeness,
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

fn account_bytes(address: &str) -> Option<AccountId> {
    AccountId::from_hex(address.trim())
        .or_else(|| ss58::decode(address).ok().map(|(bytes, _)| AccountId::new(bytes)))
}

/// Whether `borrower` and `owner` name the same account: identical text,
/// or the same 32 bytes under any SS58 prefix or as hex.
pub fn same_owner(borrower: &str, owner: &str) -> bool {
    if ss58::same_account(borrower, owner) {
        return true;
    }
    matches!(
        (account_bytes(borrower), account_bytes(owner)),
        (Some(a), Some(b)) if a == b
    )
}

pub(crate) fn owned_by(loan: &LoanRecord, owner: Option<&str>) -> bool {
    owner.map_or(true, |owner| same_owner(&loan.borrower, owner))
}

// ---------------------------------------------------------------------------
// EntityResolver
// ---------------------------------------------------------------------------

/// Discovers loan records through an injected [`ChainQuery`].
#[derive(Clone)]
pub struct EntityResolver {
    chain: Arc<dyn ChainQuery>,
    sink: SharedSink,
    pallet: String,
    scan_cap: u64,
    query_timeout: Option<Duration>,
}

impl EntityResolver {
    /// A resolver for the default lending pallet, scan cap and no deadline.
    pub fn new(chain: Arc<dyn ChainQuery>, sink: SharedSink) -> Self {
        Self {
            chain,
            sink,
            pallet: LENDING_PALLET.to_string(),
            scan_cap: LINEAR_SCAN_CAP,
            query_timeout: None,
        }
    }

    pub fn from_config(chain: Arc<dyn ChainQuery>, sink: SharedSink, config: &DashboardConfig) -> Self {
        Self {
            pallet: config.pallet.clone(),
            scan_cap: config.scan_cap,
            query_timeout: config.query_timeout(),
            ..Self::new(chain, sink)
        }
    }

    pub fn with_scan_cap(mut self, scan_cap: u64) -> Self {
        self.scan_cap = scan_cap;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn pallet(&self) -> &str {
        &self.pallet
    }

    /// Loans owned by `owner`.
    pub async fn find_loans_for_owner(&self, owner: &str) -> Result<Vec<LoanRecord>, ResolveError> {
        Ok(self.resolve(Some(owner)).await?.loans)
    }

    /// Loans owned by `owner`, with the winning strategy and completeness.
    pub async fn resolve_loans_for_owner(&self, owner: &str) -> Result<LoanResolution, ResolveError> {
        self.resolve(Some(owner)).await
    }

    /// Every loan, regardless of owner. `IndexLookup` does not apply.
    pub async fn list_all_loans(&self) -> Result<LoanResolution, ResolveError> {
        self.resolve(None).await
    }

    /// Accumulated platform rewards: `platformRewards`, else `totalRewards`.
    /// `None` when the chain exposes neither or both fail.
    pub async fn fetch_platform_rewards(&self) -> Option<RawAmount> {
        for item in ITEM_REWARDS {
            if !self.chain.has_item(&self.pallet, item) {
                continue;
            }
            match self.timed(item, self.chain.get(&self.pallet, item, &[])).await {
                Ok(Some(record)) => match record.scalar().and_then(RawAmount::from_json) {
                    Some(rewards) => return Some(rewards),
                    None => self.query_failed(item, None, "rewards value is not an integer"),
                },
                Ok(None) => return Some(RawAmount::ZERO),
                Err(e) => self.query_failed(item, None, &e.to_string()),
            }
        }
        None
    }

    async fn resolve(&self, owner: Option<&str>) -> Result<LoanResolution, ResolveError> {
        if !self.chain.has_item(&self.pallet, ITEM_LOANS) {
            return Err(ResolveError::SchemaMismatch {
                pallet: self.pallet.clone(),
                item: ITEM_LOANS.to_string(),
            });
        }

        let mut completeness = Completeness::Complete;
        for strategy in ResolutionStrategy::ORDER {
            match self.run_strategy(strategy, owner).await {
                Outcome::Unavailable(reason) => {
                    self.strategy_event(DiagnosticKind::StrategyUnavailable, strategy, reason)
                }
                Outcome::Failed(error) => self.strategy_event(
                    DiagnosticKind::StrategyFailed,
                    strategy,
                    &error.to_string(),
                ),
                Outcome::Found {
                    loans,
                    completeness: seen,
                } if loans.is_empty() => {
                    completeness = seen;
                    self.strategy_event(DiagnosticKind::StrategyEmpty, strategy, "no loans")
                }
                Outcome::Found {
                    loans,
                    completeness,
                } => return Ok(self.finish(loans, Some(strategy), completeness)),
            }
        }
        debug!(owner = owner.unwrap_or("*"), "every strategy came back empty");
        Ok(self.finish(Vec::new(), None, completeness))
    }

    fn finish(
        &self,
        loans: Vec<LoanRecord>,
        strategy: Option<ResolutionStrategy>,
        completeness: Completeness,
    ) -> LoanResolution {
        let mut seen = HashSet::new();
        let mut loans: Vec<LoanRecord> = loans
            .into_iter()
            .filter(|loan| seen.insert(loan.id.clone()))
            .collect();
        loans.reverse();

        info!(
            strategy = strategy.map_or("none", |s| s.as_str()),
            count = loans.len(),
            complete = completeness.is_complete(),
            "loans resolved"
        );
        LoanResolution {
            loans,
            strategy,
            completeness,
        }
    }

    fn strategy_event(&self, kind: DiagnosticKind, strategy: ResolutionStrategy, reason: &str) {
        self.sink.report(
            DiagnosticEvent::new(kind)
                .with("strategy", strategy)
                .with("reason", reason),
        );
    }

    /// Runs one query under the configured deadline, if any.
    pub(crate) async fn timed<T, F>(&self, item: &str, query: F) -> Result<T, QueryError>
    where
        F: Future<Output = Result<T, QueryError>>,
    {
        match self.query_timeout {
            Some(limit) => tokio::time::timeout(limit, query).await.unwrap_or_else(|_| {
                Err(QueryError::transient(
                    &self.pallet,
                    item,
                    format!("timed out after {}ms", limit.as_millis()),
                ))
            }),
            None => query.await,
        }
    }
}
