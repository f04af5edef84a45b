//! Eight-byte module tags (`PalletId` on the runtime side).

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::DerivationError;
use crate::config::MODULE_TAG_LENGTH;

/// An 8-byte ASCII identifier naming a pallet's module account.
///
/// Shorter tags are padded with NUL bytes, longer ones truncated, matching
/// how the runtime lays out a `PalletId`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleTag([u8; MODULE_TAG_LENGTH]);

impl ModuleTag {
    /// Builds a tag from ASCII text.
    ///
    /// ```
    /// use halal_lending_core::account::ModuleTag;
    ///
    /// let tag = ModuleTag::new("py/trsry").unwrap();
    /// assert_eq!(tag.as_bytes(), b"py/trsry");
    /// assert!(ModuleTag::new("señor").is_err());
    /// ```
    pub fn new(tag: &str) -> Result<Self, DerivationError> {
        if tag.is_empty() {
            return Err(DerivationError::InvalidTag {
                tag: tag.to_string(),
                reason: "empty",
            });
        }
        if !tag.is_ascii() {
            return Err(DerivationError::InvalidTag {
                tag: tag.to_string(),
                reason: "not ASCII",
            });
        }
        Ok(Self::from_bytes(tag.as_bytes()))
    }

    /// Builds a tag from raw bytes, padding or truncating to 8.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut tag = [0u8; MODULE_TAG_LENGTH];
        let len = bytes.len().min(MODULE_TAG_LENGTH);
        tag[..len].copy_from_slice(&bytes[..len]);
        Self(tag)
    }

    /// Reads a tag published by the chain.
    ///
    /// Accepts the human form (`"hlallend"`), the machine form (`"0x686c…"`,
    /// exactly 8 bytes) and a byte array. Anything else is `None`.
    pub fn from_chain_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => {
                if let Some(hex_digits) = s.strip_prefix("0x") {
                    let bytes = hex::decode(hex_digits).ok()?;
                    (bytes.len() == MODULE_TAG_LENGTH).then(|| Self::from_bytes(&bytes))
                } else {
                    Self::new(s).ok()
                }
            }
            Value::Array(items) if items.len() == MODULE_TAG_LENGTH => {
                let bytes = items
                    .iter()
                    .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
                    .collect::<Option<Vec<u8>>>()?;
                Some(Self::from_bytes(&bytes))
            }
            _ => None,
        }
    }

    /// The padded 8 bytes.
    pub fn as_bytes(&self) -> &[u8; MODULE_TAG_LENGTH] {
        &self.0
    }
}

impl fmt::Display for ModuleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        f.write_str(&String::from_utf8_lossy(&self.0[..end]))
    }
}

impl fmt::Debug for ModuleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleTag({self})")
    }
}

impl FromStr for ModuleTag {
    type Err = DerivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ModuleTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
