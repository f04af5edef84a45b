//! # Chain Query Capability
//!
//! The read-only view of ledger state the dashboard core consumes. It is an
//! injected trait object, never a process-wide client handle, so every
//! resolver call works against exactly the capability it was given.
//!
//! ## Loosely-typed records
//!
//! A chain client hands back codec objects that can be viewed three ways:
//!
//! | Representation | Chain client call | Typical shape                     |
//! |----------------|-------------------|-----------------------------------|
//! | Human          | `toHuman()`       | `"1,000,000,000,000"`, `"Active"` |
//! | Json           | `toJSON()`        | `1000000000000`, `"0x…"`, `"active"` |
//! | Direct         | field access      | whatever the codec exposes        |
//!
//! [`RawRecord`] keeps all three as `serde_json::Value`s. Which of them is
//! populated, and with which field names, depends on the runtime version and
//! the client, so callers must probe rather than assume. See
//! [`crate::resolver::normalize`] for the one place that does the probing
//! for loans.

pub mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use memory::{ChainSnapshot, InMemoryChain, SnapshotError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from a single chain query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The query failed in a way a retry or another strategy can absorb:
    /// transport error, timeout, decode failure.
    #[error("transient query failure on {pallet}.{item}: {message}")]
    Transient {
        /// Pallet namespace.
        pallet: String,
        /// Storage item or constant.
        item: String,
        /// What went wrong.
        message: String,
    },

    /// The chain does not expose the requested item at all.
    #[error("{pallet}.{item} is not exposed by this chain")]
    SchemaMismatch {
        /// Pallet namespace.
        pallet: String,
        /// Storage item or constant.
        item: String,
    },
}

impl QueryError {
    /// Shorthand for [`QueryError::Transient`].
    pub fn transient(pallet: &str, item: &str, message: impl Into<String>) -> Self {
        Self::Transient {
            pallet: pallet.to_string(),
            item: item.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for [`QueryError::SchemaMismatch`].
    pub fn schema_mismatch(pallet: &str, item: &str) -> Self {
        Self::SchemaMismatch {
            pallet: pallet.to_string(),
            item: item.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Keys & Records
// ---------------------------------------------------------------------------

/// One argument of a storage map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyArg {
    /// Numeric key, e.g. a loan id.
    Index(u64),
    /// Textual key, e.g. an account address or currency symbol.
    Text(String),
}

impl KeyArg {
    /// Interprets a JSON value as a key. Numbers and digit strings (with
    /// human grouping) become [`KeyArg::Index`]; other strings stay text.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(Self::Index),
            Value::String(s) => {
                let digits: String = s.trim().chars().filter(|c| *c != ',').collect();
                match digits.parse::<u64>() {
                    Ok(n) => Some(Self::Index(n)),
                    Err(_) if !s.trim().is_empty() => Some(Self::Text(s.trim().to_string())),
                    Err(_) => None,
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for KeyArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for KeyArg {
    fn from(n: u64) -> Self {
        Self::Index(n)
    }
}

impl From<&str> for KeyArg {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Which view of a codec object a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    /// `toHuman()`.
    Human,
    /// `toJSON()`.
    Json,
    /// Direct field access.
    Direct,
}

impl Representation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Json => "json",
            Self::Direct => "direct",
        }
    }
}

/// Probe order when more than one representation is available.
pub const REPRESENTATION_PRIORITY: [Representation; 3] = [
    Representation::Human,
    Representation::Json,
    Representation::Direct,
];

/// A storage value as the chain client returned it, in up to three
/// representations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct: Option<Value>,
}

impl RawRecord {
    /// A record with only the human representation.
    pub fn human(value: Value) -> Self {
        Self {
            human: Some(value),
            ..Self::default()
        }
    }

    /// A record with only the machine JSON representation.
    pub fn json(value: Value) -> Self {
        Self {
            json: Some(value),
            ..Self::default()
        }
    }

    /// A record with only direct fields.
    pub fn direct(value: Value) -> Self {
        Self {
            direct: Some(value),
            ..Self::default()
        }
    }

    /// Adds or replaces a representation. Builder-style.
    pub fn with(mut self, representation: Representation, value: Value) -> Self {
        *self.slot_mut(representation) = Some(value);
        self
    }

    /// The value of one representation, if present.
    pub fn get(&self, representation: Representation) -> Option<&Value> {
        match representation {
            Representation::Human => self.human.as_ref(),
            Representation::Json => self.json.as_ref(),
            Representation::Direct => self.direct.as_ref(),
        }
    }

    fn slot_mut(&mut self, representation: Representation) -> &mut Option<Value> {
        match representation {
            Representation::Human => &mut self.human,
            Representation::Json => &mut self.json,
            Representation::Direct => &mut self.direct,
        }
    }

    /// Whether no representation carries a value.
    pub fn is_empty(&self) -> bool {
        REPRESENTATION_PRIORITY
            .iter()
            .all(|r| self.get(*r).map_or(true, |v| !is_present(v)))
    }

    /// Every present value at `path`, in [`REPRESENTATION_PRIORITY`] order.
    pub fn candidates<'a>(
        &'a self,
        path: &'a [&'a str],
    ) -> impl Iterator<Item = (Representation, &'a Value)> + 'a {
        REPRESENTATION_PRIORITY.iter().filter_map(move |r| {
            let value = walk(self.get(*r)?, path)?;
            is_present(value).then_some((*r, value))
        })
    }

    /// The first present value at `path`.
    pub fn lookup<'a>(&'a self, path: &'a [&'a str]) -> Option<&'a Value> {
        self.candidates(path).next().map(|(_, v)| v)
    }

    /// The first present top-level value, for plain (non-struct) items.
    pub fn scalar(&self) -> Option<&Value> {
        self.lookup(&[])
    }
}

/// `null` and the empty string count as absent. Zero does not.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn walk<'a>(mut value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    for segment in path {
        value = value.as_object()?.get(*segment)?;
    }
    Some(value)
}

/// One entry of a storage map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEntry {
    /// Map key arguments, in declaration order.
    pub key: Vec<KeyArg>,
    /// The stored value.
    pub value: RawRecord,
}

// ---------------------------------------------------------------------------
// ChainQuery
// ---------------------------------------------------------------------------

/// Read-only access to chain state, keyed by pallet and item name.
///
/// `has_item` / `has_constant` are metadata probes and never touch the
/// network. Queries for items the chain does not expose return
/// [`QueryError::SchemaMismatch`].
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Whether the chain exposes the storage item.
    fn has_item(&self, pallet: &str, item: &str) -> bool;

    /// Whether the chain exposes the constant.
    fn has_constant(&self, pallet: &str, name: &str) -> bool;

    /// Every entry of a storage map.
    async fn entries(&self, pallet: &str, item: &str) -> Result<Vec<StorageEntry>, QueryError>;

    /// One storage value. An empty `key` reads a plain (non-map) item.
    /// `Ok(None)` means the key holds no value.
    async fn get(
        &self,
        pallet: &str,
        item: &str,
        key: &[KeyArg],
    ) -> Result<Option<RawRecord>, QueryError>;

    /// A runtime constant.
    async fn constant(&self, pallet: &str, name: &str) -> Result<Option<RawRecord>, QueryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_prefers_human_then_json_then_direct() {
        let record = RawRecord::human(json!({ "borrower": "" }))
            .with(Representation::Json, json!({ "borrower": "json-side" }))
            .with(Representation::Direct, json!({ "borrower": "direct-side" }));

        // Empty human string is absent, so JSON wins.
        assert_eq!(record.lookup(&["borrower"]), Some(&json!("json-side")));

        let order: Vec<_> = record.candidates(&["borrower"]).map(|(r, _)| r).collect();
        assert_eq!(order, vec![Representation::Json, Representation::Direct]);
    }

    #[test]
    fn lookup_walks_nested_paths() {
        let record = RawRecord::json(json!({ "data": { "free": 42 } }));
        assert_eq!(record.lookup(&["data", "free"]), Some(&json!(42)));
        assert_eq!(record.lookup(&["data", "reserved"]), None);
        assert_eq!(record.lookup(&["data", "free", "deeper"]), None);
    }

    #[test]
    fn scalar_reads_plain_items() {
        let record = RawRecord::human(json!("6")).with(Representation::Json, json!(6));
        assert_eq!(record.scalar(), Some(&json!("6")));
    }

    #[test]
    fn zero_is_present_null_is_not() {
        assert!(is_present(&json!(0)));
        assert!(!is_present(&json!(null)));
        assert!(!is_present(&json!("  ")));
        assert!(RawRecord::json(json!(null)).is_empty());
        assert!(RawRecord::default().is_empty());
    }

    #[test]
    fn key_arg_from_json() {
        assert_eq!(KeyArg::from_json(&json!(5)), Some(KeyArg::Index(5)));
        assert_eq!(KeyArg::from_json(&json!("1,024")), Some(KeyArg::Index(1024)));
        assert_eq!(
            KeyArg::from_json(&json!("5Grw")),
            Some(KeyArg::Text("5Grw".into()))
        );
        assert_eq!(KeyArg::from_json(&json!(null)), None);
        assert_eq!(KeyArg::from_json(&json!(-1)), None);
    }

    #[test]
    fn key_args_serialize_untagged() {
        let key = vec![KeyArg::Index(1), KeyArg::Text("DOT".into())];
        assert_eq!(serde_json::to_string(&key).unwrap(), r#"[1,"DOT"]"#);
    }
}
