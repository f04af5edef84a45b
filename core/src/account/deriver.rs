//! # Account Deriver
//!
//! Turns a [`ModuleTag`] and sub-account index into a pallet account, and
//! finds the lending pallet's account on a live chain.
//!
//! ## Resolution Tiers
//!
//! ```text
//! 1. PublishedConstant  halalLending.palletId constant → derive locally
//! 2. ChainQuery         halalLending.palletAccount()   → decode, re-encode
//! 3. LocalDerivation    configured module tag          → derive locally
//! ```
//!
//! Each tier that is missing or fails is reported as
//! [`DiagnosticKind::DerivationTierFailed`] and the next one is tried. If
//! the last tier fails too, the caller gets the backend's
//! [`DerivationError`]; there is never a fabricated address.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{
    AccountId, DerivationBackend, DerivationError, DerivedAddress, ModuleTag, SubstrateBackend,
};
use crate::chain::ChainQuery;
use crate::config::{
    DashboardConfig, CONST_PALLET_ID, ITEM_PALLET_ACCOUNT, LENDING_PALLET_SUB_INDEX,
    MODULE_ACCOUNT_PREFIX, MODULE_TAG_LENGTH,
};
use crate::diagnostics::{DiagnosticEvent, DiagnosticKind, SharedSink};

/// Length of a derivation preimage: prefix, tag, little-endian index.
pub const PREIMAGE_LENGTH: usize = MODULE_ACCOUNT_PREFIX.len() + MODULE_TAG_LENGTH + 4;

/// Which tier produced a pallet account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountSource {
    PublishedConstant,
    ChainQuery,
    LocalDerivation,
}

impl AccountSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublishedConstant => "published_constant",
            Self::ChainQuery => "chain_query",
            Self::LocalDerivation => "local_derivation",
        }
    }
}

/// A resolved pallet account and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PalletAccount {
    #[serde(flatten)]
    pub derived: DerivedAddress,
    pub source: AccountSource,
}

/// Derives module accounts through an injected [`DerivationBackend`].
#[derive(Clone)]
pub struct AccountDeriver {
    backend: Arc<dyn DerivationBackend>,
    sink: SharedSink,
}

impl AccountDeriver {
    pub fn new(backend: Arc<dyn DerivationBackend>, sink: SharedSink) -> Self {
        Self { backend, sink }
    }

    /// A deriver using [`SubstrateBackend`] with the configured hash and
    /// network prefix.
    pub fn from_config(config: &DashboardConfig, sink: SharedSink) -> Self {
        Self::new(
            Arc::new(SubstrateBackend::new(config.hash, config.ss58_prefix)),
            sink,
        )
    }

    pub fn backend(&self) -> &dyn DerivationBackend {
        self.backend.as_ref()
    }

    /// Builds the 16-byte derivation preimage.
    ///
    /// ```
    /// use halal_lending_core::account::{AccountDeriver, ModuleTag};
    ///
    /// let tag = ModuleTag::new("hlallend").unwrap();
    /// let preimage = AccountDeriver::preimage(&tag, 1);
    /// assert_eq!(&preimage[..4], b"modl");
    /// assert_eq!(&preimage[12..], &[1, 0, 0, 0]);
    /// ```
    pub fn preimage(tag: &ModuleTag, index: u32) -> [u8; PREIMAGE_LENGTH] {
        let mut preimage = [0u8; PREIMAGE_LENGTH];
        let tag_start = MODULE_ACCOUNT_PREFIX.len();
        let index_start = tag_start + MODULE_TAG_LENGTH;
        preimage[..tag_start].copy_from_slice(MODULE_ACCOUNT_PREFIX);
        preimage[tag_start..index_start].copy_from_slice(tag.as_bytes());
        preimage[index_start..].copy_from_slice(&index.to_le_bytes());
        preimage
    }

    /// Derives the account for `tag` at sub-account `index`.
    ///
    /// Deterministic: the same inputs and backend always give the same
    /// address. Fails with [`DerivationError::Unavailable`] when the backend
    /// cannot hash or encode.
    pub fn derive(&self, tag: &ModuleTag, index: u32) -> Result<DerivedAddress, DerivationError> {
        let account = AccountId::new(self.backend.hash_256(&Self::preimage(tag, index))?);
        let address = self.backend.encode_address(&account)?;
        debug!(%tag, index, %address, "derived module account");
        Ok(DerivedAddress { account, address })
    }

    /// Finds the pallet account, trying the chain before local derivation.
    ///
    /// `fallback_tag` is only used by the last tier; a tag the chain
    /// publishes always wins over configuration.
    pub async fn resolve_pallet_account(
        &self,
        chain: &dyn ChainQuery,
        pallet: &str,
        fallback_tag: &ModuleTag,
        index: u32,
    ) -> Result<PalletAccount, DerivationError> {
        match self.from_published_id(chain, pallet, index).await {
            Ok(derived) => return Ok(self.resolved(derived, AccountSource::PublishedConstant)),
            Err(reason) => self.tier_failed(AccountSource::PublishedConstant, pallet, &reason),
        }

        match self.from_account_query(chain, pallet, index).await {
            Ok(derived) => return Ok(self.resolved(derived, AccountSource::ChainQuery)),
            Err(reason) => self.tier_failed(AccountSource::ChainQuery, pallet, &reason),
        }

        match self.derive(fallback_tag, index) {
            Ok(derived) => Ok(self.resolved(derived, AccountSource::LocalDerivation)),
            Err(e) => {
                self.tier_failed(AccountSource::LocalDerivation, pallet, &e.to_string());
                Err(e)
            }
        }
    }

    async fn from_published_id(
        &self,
        chain: &dyn ChainQuery,
        pallet: &str,
        index: u32,
    ) -> Result<DerivedAddress, String> {
        if !chain.has_constant(pallet, CONST_PALLET_ID) {
            return Err("constant not exposed".into());
        }
        let record = chain
            .constant(pallet, CONST_PALLET_ID)
            .await
            .map_err(|e| e.to_string())?
            .ok_or("constant has no value")?;
        let tag = record
            .candidates(&[])
            .find_map(|(_, value)| ModuleTag::from_chain_value(value))
            .ok_or("unrecognized module tag encoding")?;
        self.derive(&tag, index).map_err(|e| e.to_string())
    }

    async fn from_account_query(
        &self,
        chain: &dyn ChainQuery,
        pallet: &str,
        index: u32,
    ) -> Result<DerivedAddress, String> {
        if index != LENDING_PALLET_SUB_INDEX {
            return Err(format!("query only answers sub-account {LENDING_PALLET_SUB_INDEX}"));
        }
        if !chain.has_item(pallet, ITEM_PALLET_ACCOUNT) {
            return Err("storage item not exposed".into());
        }
        let record = chain
            .get(pallet, ITEM_PALLET_ACCOUNT, &[])
            .await
            .map_err(|e| e.to_string())?
            .ok_or("query returned no value")?;
        let text = record
            .scalar()
            .and_then(Value::as_str)
            .ok_or("value is not an address string")?;
        let account = self.backend.decode_address(text).map_err(|e| e.to_string())?;
        let address = self
            .backend
            .encode_address(&account)
            .map_err(|e| e.to_string())?;
        Ok(DerivedAddress { account, address })
    }

    fn resolved(&self, derived: DerivedAddress, source: AccountSource) -> PalletAccount {
        info!(address = %derived.address, source = source.as_str(), "pallet account resolved");
        PalletAccount { derived, source }
    }

    fn tier_failed(&self, tier: AccountSource, pallet: &str, reason: &str) {
        self.sink.report(
            DiagnosticEvent::new(DiagnosticKind::DerivationTierFailed)
                .with("tier", tier.as_str())
                .with("pallet", pallet)
                .with("reason", reason),
        );
    }
}
