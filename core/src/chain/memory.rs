//! # In-Memory Chain
//!
//! A [`ChainQuery`] backed by a JSON snapshot. The dashboard binary runs
//! against it offline, and every resolver test uses it as its fixture.
//!
//! ## Snapshot Format
//!
//! ```json
//! {
//!   "pallets": {
//!     "halalLending": {
//!       "storage": {
//!         "loans":      { "entries": [ { "key": [1], "value": { "json": { "borrower": "5Grw…" } } } ] },
//!         "nextLoanId": { "value": { "json": 2 } }
//!       },
//!       "constants": { "palletId": { "human": "hlallend" } }
//!     }
//!   }
//! }
//! ```
//!
//! Storage items with `entries` are maps; items with `value` are plain.
//! An item that is declared but has neither is a map with no entries.
//!
//! ## Fault Injection
//!
//! [`InMemoryChain::fail_item`], [`InMemoryChain::fail_key`] and
//! [`InMemoryChain::fail_entries`] turn queries into
//! [`QueryError::Transient`]; [`InMemoryChain::with_latency`] delays
//! every query so deadlines can be exercised under a paused tokio clock.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ChainQuery, KeyArg, QueryError, RawRecord, StorageEntry};
use crate::crypto::ss58;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors from loading a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One storage item: a plain value, map entries, or both empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RawRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<StorageEntry>,
}

/// Everything one pallet exposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PalletSnapshot {
    #[serde(default)]
    pub storage: BTreeMap<String, StorageItem>,
    #[serde(default)]
    pub constants: BTreeMap<String, RawRecord>,
}

/// Frozen chain state, keyed by pallet name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    #[serde(default)]
    pub pallets: BTreeMap<String, PalletSnapshot>,
}

impl ChainSnapshot {
    /// Parses a snapshot from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a snapshot file.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Declares a storage item, creating it empty if needed.
    pub fn declare_item(&mut self, pallet: &str, item: &str) -> &mut StorageItem {
        self.pallets
            .entry(pallet.to_string())
            .or_default()
            .storage
            .entry(item.to_string())
            .or_default()
    }

    /// Adds one map entry.
    pub fn insert_entry(
        &mut self,
        pallet: &str,
        item: &str,
        key: Vec<KeyArg>,
        value: RawRecord,
    ) -> &mut Self {
        self.declare_item(pallet, item)
            .entries
            .push(StorageEntry { key, value });
        self
    }

    /// Sets the value of a plain item.
    pub fn set_value(&mut self, pallet: &str, item: &str, value: RawRecord) -> &mut Self {
        self.declare_item(pallet, item).value = Some(value);
        self
    }

    /// Sets a runtime constant.
    pub fn set_constant(&mut self, pallet: &str, name: &str, value: RawRecord) -> &mut Self {
        self.pallets
            .entry(pallet.to_string())
            .or_default()
            .constants
            .insert(name.to_string(), value);
        self
    }

    fn item(&self, pallet: &str, item: &str) -> Option<&StorageItem> {
        self.pallets.get(pallet)?.storage.get(item)
    }

    fn constant(&self, pallet: &str, name: &str) -> Option<&RawRecord> {
        self.pallets.get(pallet)?.constants.get(name)
    }
}

/// Key equality as the chain sees it: numeric ids match their digit-string
/// form, and addresses match across SS58 prefixes.
fn keys_match(stored: &[KeyArg], wanted: &[KeyArg]) -> bool {
    stored.len() == wanted.len()
        && stored.iter().zip(wanted).all(|pair| match pair {
            (KeyArg::Index(a), KeyArg::Index(b)) => a == b,
            (KeyArg::Index(n), KeyArg::Text(s)) | (KeyArg::Text(s), KeyArg::Index(n)) => {
                s.parse::<u64>().map_or(false, |v| v == *n)
            }
            (KeyArg::Text(a), KeyArg::Text(b)) => ss58::same_account(a, b),
        })
}

// ---------------------------------------------------------------------------
// InMemoryChain
// ---------------------------------------------------------------------------

/// A [`ChainQuery`] over a [`ChainSnapshot`].
#[derive(Debug, Default)]
pub struct InMemoryChain {
    snapshot: ChainSnapshot,
    failing_items: HashSet<(String, String)>,
    failing_keys: Vec<(String, String, Vec<KeyArg>)>,
    failing_scans: HashSet<(String, String)>,
    latency: Option<Duration>,
    queries: AtomicUsize,
}

impl InMemoryChain {
    /// Wraps a snapshot.
    pub fn new(snapshot: ChainSnapshot) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    /// Loads a snapshot file.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        ChainSnapshot::load(path).map(Self::new)
    }

    /// Every query touching `pallet.item` (storage or constant) fails.
    pub fn fail_item(mut self, pallet: &str, item: &str) -> Self {
        self.failing_items
            .insert((pallet.to_string(), item.to_string()));
        self
    }

    /// `get` for exactly this key fails.
    pub fn fail_key(mut self, pallet: &str, item: &str, key: Vec<KeyArg>) -> Self {
        self.failing_keys
            .push((pallet.to_string(), item.to_string(), key));
        self
    }

    /// `entries` on this map fails; single-key reads still work.
    pub fn fail_entries(mut self, pallet: &str, item: &str) -> Self {
        self.failing_scans
            .insert((pallet.to_string(), item.to_string()));
        self
    }

    /// Every query sleeps for `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of queries issued so far. Metadata probes are not counted.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    /// The underlying snapshot.
    pub fn snapshot(&self) -> &ChainSnapshot {
        &self.snapshot
    }

    async fn begin(&self, pallet: &str, item: &str) -> Result<(), QueryError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self
            .failing_items
            .contains(&(pallet.to_string(), item.to_string()))
        {
            return Err(QueryError::transient(pallet, item, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainQuery for InMemoryChain {
    fn has_item(&self, pallet: &str, item: &str) -> bool {
        self.snapshot.item(pallet, item).is_some()
    }

    fn has_constant(&self, pallet: &str, name: &str) -> bool {
        self.snapshot.constant(pallet, name).is_some()
    }

    async fn entries(&self, pallet: &str, item: &str) -> Result<Vec<StorageEntry>, QueryError> {
        self.begin(pallet, item).await?;
        if self
            .failing_scans
            .contains(&(pallet.to_string(), item.to_string()))
        {
            return Err(QueryError::transient(pallet, item, "injected iteration failure"));
        }
        self.snapshot
            .item(pallet, item)
            .map(|found| found.entries.clone())
            .ok_or_else(|| QueryError::schema_mismatch(pallet, item))
    }

    async fn get(
        &self,
        pallet: &str,
        item: &str,
        key: &[KeyArg],
    ) -> Result<Option<RawRecord>, QueryError> {
        self.begin(pallet, item).await?;
        let failing = self
            .failing_keys
            .iter()
            .any(|(p, i, k)| p == pallet && i == item && keys_match(k, key));
        if failing {
            return Err(QueryError::transient(pallet, item, "injected failure"));
        }

        let found = self
            .snapshot
            .item(pallet, item)
            .ok_or_else(|| QueryError::schema_mismatch(pallet, item))?;
        if key.is_empty() {
            return Ok(found.value.clone());
        }
        Ok(found
            .entries
            .iter()
            .find(|entry| keys_match(&entry.key, key))
            .map(|entry| entry.value.clone()))
    }

    async fn constant(&self, pallet: &str, name: &str) -> Result<Option<RawRecord>, QueryError> {
        self.begin(pallet, name).await?;
        Ok(self.snapshot.constant(pallet, name).cloned())
    }
}
