//! # Pallet Balance Reader
//!
//! Free balance of one account across several currencies, for the pallet
//! balance table.
//!
//! ```text
//! native   system.account(addr).data.free
//! token    tokens.accounts(addr, symbol).free        if tokens is exposed
//!          assets.account(symbol, addr).balance      else, if assets is exposed
//! ```
//!
//! Rows are read concurrently. A row that cannot be read becomes a zero row
//! marked [`BalanceSource::Fallback`] plus a
//! [`DiagnosticKind::BalanceFallback`] event; one bad currency never hides
//! the others. A configured query deadline bounds every chain read; an
//! expired one is a transient failure like any other.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::amount::{BalanceCodec, CurrencyDescriptor, DecimalAmount, RawAmount};
use crate::chain::{ChainQuery, KeyArg, QueryError, RawRecord};
use crate::config::{
    DashboardConfig, ASSETS_PALLET, ITEM_ASSETS_ACCOUNT, ITEM_SYSTEM_ACCOUNT, ITEM_TOKENS_ACCOUNTS, NATIVE_SYMBOL,
    SYSTEM_PALLET, TOKENS_PALLET,
};
use crate::diagnostics::{DiagnosticEvent, DiagnosticKind, SharedSink};

/// Where a balance row was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceSource {
    System,
    Tokens,
    Assets,
    /// Not read; shown as zero.
    Fallback,
}

/// One row of the balance table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceRow {
    pub currency: &'static str,
    pub raw: RawAmount,
    pub formatted: DecimalAmount,
    pub source: BalanceSource,
}

/// Reads free balances through an injected [`ChainQuery`].
#[derive(Clone)]
pub struct PalletBalanceReader {
    chain: Arc<dyn ChainQuery>,
    codec: BalanceCodec,
    sink: SharedSink,
    native_symbol: String,
    query_timeout: Option<Duration>,
}

impl PalletBalanceReader {
    pub fn new(chain: Arc<dyn ChainQuery>, sink: SharedSink) -> Self {
        Self {
            chain,
            codec: BalanceCodec::new(Arc::clone(&sink)),
            sink,
            native_symbol: NATIVE_SYMBOL.to_string(),
            query_timeout: None,
        }
    }

    /// A reader using the configured native symbol and query deadline.
    pub fn from_config(
        chain: Arc<dyn ChainQuery>,
        sink: SharedSink,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            native_symbol: config.native_symbol.clone(),
            query_timeout: config.query_timeout(),
            ..Self::new(chain, sink)
        }
    }

    /// Overrides which symbol is read from `system.account`.
    pub fn with_native_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.native_symbol = symbol.into();
        self
    }

    /// Bounds each chain read by `timeout`.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// One row per currency, in the order given.
    pub async fn read_balances(
        &self,
        address: &str,
        currencies: &[CurrencyDescriptor],
    ) -> Vec<BalanceRow> {
        join_all(
            currencies
                .iter()
                .map(|currency| self.read_balance(address, *currency)),
        )
        .await
    }

    /// A single row. Never fails; see the module docs.
    pub async fn read_balance(&self, address: &str, currency: CurrencyDescriptor) -> BalanceRow {
        let (raw, source) = match self.read_raw(address, currency).await {
            Ok(read) => read,
            Err(reason) => {
                self.sink.report(
                    DiagnosticEvent::new(DiagnosticKind::BalanceFallback)
                        .with("currency", currency.symbol)
                        .with("address", address)
                        .with("reason", &reason),
                );
                (RawAmount::ZERO, BalanceSource::Fallback)
            }
        };
        debug!(currency = currency.symbol, %raw, ?source, "balance read");
        BalanceRow {
            currency: currency.symbol,
            raw,
            formatted: self.codec.to_decimal(raw, currency.decimals),
            source,
        }
    }

    async fn read_raw(
        &self,
        address: &str,
        currency: CurrencyDescriptor,
    ) -> Result<(RawAmount, BalanceSource), String> {
        let account = KeyArg::Text(address.to_string());
        let symbol = KeyArg::Text(currency.symbol.to_string());

        if currency.symbol == self.native_symbol {
            let record = self
                .query(SYSTEM_PALLET, ITEM_SYSTEM_ACCOUNT, &[account])
                .await?;
            return free_balance(record.as_ref(), &["data", "free"])
                .map(|raw| (raw, BalanceSource::System));
        }

        if self.chain.has_item(TOKENS_PALLET, ITEM_TOKENS_ACCOUNTS) {
            let record = self
                .query(TOKENS_PALLET, ITEM_TOKENS_ACCOUNTS, &[account, symbol])
                .await?;
            return free_balance(record.as_ref(), &["free"]).map(|raw| (raw, BalanceSource::Tokens));
        }

        if self.chain.has_item(ASSETS_PALLET, ITEM_ASSETS_ACCOUNT) {
            let record = self
                .query(ASSETS_PALLET, ITEM_ASSETS_ACCOUNT, &[symbol, account])
                .await?;
            return free_balance(record.as_ref(), &["balance"])
                .map(|raw| (raw, BalanceSource::Assets));
        }

        Err("chain exposes neither tokens.accounts nor assets.account".into())
    }

    async fn query(
        &self,
        pallet: &str,
        item: &str,
        key: &[KeyArg],
    ) -> Result<Option<RawRecord>, String> {
        let read = self.chain.get(pallet, item, key);
        let result = match self.query_timeout {
            Some(limit) => tokio::time::timeout(limit, read).await.unwrap_or_else(|_| {
                Err(QueryError::transient(
                    pallet,
                    item,
                    format!("timed out after {}ms", limit.as_millis()),
                ))
            }),
            None => read.await,
        };
        result.map_err(|e| e.to_string())
    }
}

/// Reads the balance at `path`, falling back to a bare scalar when no
/// representation has the field. The first candidate that parses wins, so a
/// `toHuman` rendering like `"1.2340 kDOT"` yields to the JSON integer. A
/// missing record or field is a zero balance; candidates that are all
/// unparseable are an error.
fn free_balance(record: Option<&RawRecord>, path: &[&str]) -> Result<RawAmount, String> {
    let Some(record) = record else {
        return Ok(RawAmount::ZERO);
    };
    let mut candidates: Vec<&Value> = record.candidates(path).map(|(_, v)| v).collect();
    if candidates.is_empty() {
        candidates = record
            .candidates(&[])
            .map(|(_, v)| v)
            .filter(|v| !v.is_object())
            .collect();
    }
    if let Some(raw) = candidates.iter().find_map(|v| RawAmount::from_json(v)) {
        return Ok(raw);
    }
    match candidates.first() {
        None => Ok(RawAmount::ZERO),
        Some(value) => Err(describe(value)),
    }
}

fn describe(value: &Value) -> String {
    format!("unparseable balance {value}")
}
