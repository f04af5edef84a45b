//! # Account Module — Pallet-Owned Account Derivation
//!
//! A pallet holds funds in an account nobody has a key for. Its identifier
//! is a pure function of the pallet's module tag and a sub-account index:
//!
//! ```text
//! preimage = b"modl" (4) || module_tag (8) || index (u32 LE, 4)
//! account  = H256(preimage)            where H256 is the runtime's hash
//! address  = SS58(account, network prefix)
//! ```
//!
//! The hashing and address encoding are capabilities behind
//! [`DerivationBackend`]. When the backend cannot provide them the caller
//! gets [`DerivationError::Unavailable`]. There is no hand-rolled
//! substitute: a "best effort" address would look valid and receive real
//! deposits that nobody can ever move.
//!
//! ## Layout
//!
//! ```text
//! module_tag.rs — ModuleTag, the 8-byte pallet identifier
//! deriver.rs    — AccountDeriver and tiered pallet-account resolution
//! ```

pub mod deriver;
pub mod module_tag;

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::config::ACCOUNT_ID_LENGTH;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::ss58::{self, Ss58Error};

pub use deriver::{AccountDeriver, AccountSource, PalletAccount};
pub use module_tag::ModuleTag;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from deriving or decoding accounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    /// The hashing or encoding capability is missing or failed.
    #[error("account derivation unavailable: {0}")]
    Unavailable(String),

    /// The module tag cannot be used.
    #[error("invalid module tag {tag:?}: {reason}")]
    InvalidTag {
        tag: String,
        reason: &'static str,
    },

    /// An address string could not be decoded.
    #[error("invalid address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: Ss58Error,
    },
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// A raw 32-byte account identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId([u8; ACCOUNT_ID_LENGTH]);

impl AccountId {
    pub const fn new(bytes: [u8; ACCOUNT_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LENGTH] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parses `0x`-prefixed or bare hex of exactly 32 bytes.
    pub fn from_hex(input: &str) -> Option<Self> {
        let digits = input.strip_prefix("0x").unwrap_or(input);
        let bytes = hex::decode(digits).ok()?;
        let array: [u8; ACCOUNT_ID_LENGTH] = bytes.try_into().ok()?;
        Some(Self(array))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_hex())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// An account identifier together with its rendered address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedAddress {
    pub account: AccountId,
    pub address: String,
}

// ---------------------------------------------------------------------------
// DerivationBackend
// ---------------------------------------------------------------------------

/// The two capabilities derivation needs: a 256-bit hash and an address
/// codec. A backend that lacks either returns
/// [`DerivationError::Unavailable`].
pub trait DerivationBackend: Send + Sync {
    /// Hashes a derivation preimage to 32 bytes.
    fn hash_256(&self, preimage: &[u8]) -> Result<[u8; ACCOUNT_ID_LENGTH], DerivationError>;

    /// Renders an account id as an address string.
    fn encode_address(&self, account: &AccountId) -> Result<String, DerivationError>;

    /// Parses an address string (or raw hex) back to an account id.
    fn decode_address(&self, address: &str) -> Result<AccountId, DerivationError>;
}

/// Substrate-style backend: configurable 256-bit hash plus SS58.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstrateBackend {
    pub algorithm: HashAlgorithm,
    pub ss58_prefix: u16,
}

impl SubstrateBackend {
    pub fn new(algorithm: HashAlgorithm, ss58_prefix: u16) -> Self {
        Self {
            algorithm,
            ss58_prefix,
        }
    }
}

impl DerivationBackend for SubstrateBackend {
    fn hash_256(&self, preimage: &[u8]) -> Result<[u8; ACCOUNT_ID_LENGTH], DerivationError> {
        Ok(self.algorithm.digest(preimage))
    }

    fn encode_address(&self, account: &AccountId) -> Result<String, DerivationError> {
        ss58::encode(account.as_bytes(), self.ss58_prefix)
            .map_err(|e| DerivationError::Unavailable(format!("ss58 encoding: {e}")))
    }

    fn decode_address(&self, address: &str) -> Result<AccountId, DerivationError> {
        if let Some(account) = AccountId::from_hex(address.trim()) {
            return Ok(account);
        }
        ss58::decode(address)
            .map(|(bytes, _)| AccountId::new(bytes))
            .map_err(|source| DerivationError::InvalidAddress {
                address: address.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE_HEX: &str = "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
    const ALICE_GENERIC: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

    #[test]
    fn test_account_id_hex_roundtrip() {
        let account = AccountId::from_hex(ALICE_HEX).unwrap();
        assert_eq!(account.to_hex(), ALICE_HEX);
        assert!(AccountId::from_hex("0xdead").is_none());
        assert!(AccountId::from_hex("zz").is_none());
    }

    #[test]
    fn test_substrate_backend_encodes_and_decodes() {
        let backend = SubstrateBackend::new(HashAlgorithm::Blake2b256, 42);
        let account = AccountId::from_hex(ALICE_HEX).unwrap();
        assert_eq!(backend.encode_address(&account).unwrap(), ALICE_GENERIC);
        assert_eq!(backend.decode_address(ALICE_GENERIC).unwrap(), account);
        assert_eq!(backend.decode_address(ALICE_HEX).unwrap(), account);
    }

    #[test]
    fn test_bad_address_is_invalid_not_unavailable() {
        let backend = SubstrateBackend::new(HashAlgorithm::Blake2b256, 42);
        assert!(matches!(
            backend.decode_address("not-an-address"),
            Err(DerivationError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_out_of_range_prefix_is_unavailable() {
        let backend = SubstrateBackend::new(HashAlgorithm::Blake2b256, 20_000);
        let account = AccountId::new([7u8; 32]);
        assert!(matches!(
            backend.encode_address(&account),
            Err(DerivationError::Unavailable(_))
        ));
    }

    #[test]
    fn test_account_id_serializes_as_hex() {
        let json = serde_json::to_string(&AccountId::new([0u8; 32])).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "00".repeat(32)));
    }
}
