//! # Dashboard Configuration & Constants
//!
//! Every magic number the dashboard core depends on lives here. Most of them
//! mirror values baked into the chain runtime, so changing one here without
//! a matching runtime upgrade means reading the wrong storage item or, worse,
//! deriving the wrong pallet account.
//!
//! The runtime-tunable subset is collected in [`DashboardConfig`], which the
//! binary loads from a JSON file and overrides from the command line.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::hash::HashAlgorithm;

// ---------------------------------------------------------------------------
// Module Account Derivation
// ---------------------------------------------------------------------------

/// Prefix every module-owned account preimage starts with. Fixed by the
/// runtime; the bytes are `b"modl"`.
pub const MODULE_ACCOUNT_PREFIX: &[u8; 4] = b"modl";

/// Length of a module tag in bytes. Shorter tags are NUL-padded.
pub const MODULE_TAG_LENGTH: usize = 8;

/// Length of a derived account identifier in bytes.
pub const ACCOUNT_ID_LENGTH: usize = 32;

/// Module tag of the halal lending pallet.
pub const LENDING_PALLET_TAG: &str = "hlallend";

/// Sub-account index of the pallet's main account.
pub const LENDING_PALLET_SUB_INDEX: u32 = 0;

/// Generic Substrate SS58 prefix. Development chains use this.
pub const DEFAULT_SS58_PREFIX: u16 = 42;

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Number of fraction digits shown in every [`DecimalAmount`](crate::amount::DecimalAmount).
/// Independent of the ledger's precision.
pub const DISPLAY_PRECISION: usize = 4;

/// Largest decimals value a currency may declare.
pub const MAX_DECIMALS: u8 = 18;

/// Symbol the dashboard shows the native currency under. Native balances
/// live in `system.account`, every other currency in a token pallet.
pub const NATIVE_SYMBOL: &str = "DOT";

/// Decimals of the native currency.
pub const NATIVE_DECIMALS: u8 = 12;

/// The lending pallet only accepts the native currency, so every loan
/// extrinsic carries currency id 0 no matter what the user picked.
pub const NATIVE_CURRENCY_ID: u32 = 0;

// ---------------------------------------------------------------------------
// Storage Layout
// ---------------------------------------------------------------------------

/// Pallet name as exposed in the chain metadata.
pub const LENDING_PALLET: &str = "halalLending";

/// `loans: map LoanId => Loan`
pub const ITEM_LOANS: &str = "loans";

/// `userLoans: map AccountId => Vec<LoanId>`
pub const ITEM_USER_LOANS: &str = "userLoans";

/// Loan id counters, in the order they are probed.
pub const ITEM_LOAN_COUNTERS: [&str; 2] = ["nextLoanId", "loanCount"];

/// Reward accumulators, in the order they are probed.
pub const ITEM_REWARDS: [&str; 2] = ["platformRewards", "totalRewards"];

/// Published pallet identifier constant (tier 1 of account resolution).
pub const CONST_PALLET_ID: &str = "palletId";

/// Precomputed pallet account query (tier 2 of account resolution).
pub const ITEM_PALLET_ACCOUNT: &str = "palletAccount";

/// Storage layout of native and multi-currency balances.
pub const SYSTEM_PALLET: &str = "system";
pub const ITEM_SYSTEM_ACCOUNT: &str = "account";
pub const TOKENS_PALLET: &str = "tokens";
pub const ITEM_TOKENS_ACCOUNTS: &str = "accounts";
pub const ASSETS_PALLET: &str = "assets";
pub const ITEM_ASSETS_ACCOUNT: &str = "account";

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Upper bound on loan ids the bounded linear scan fetches. Keeps the
/// worst-case fan-out of a single resolution at 100 queries.
pub const LINEAR_SCAN_CAP: u64 = 100;

/// How many loans the admin summary lists as "recent".
pub const RECENT_LOANS_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

/// Runtime-tunable settings.
///
/// Every field has a default that matches a local development chain, so an
/// empty JSON object (`{}`) is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardConfig {
    /// Pallet name used as the storage namespace.
    pub pallet: String,
    /// Module tag the pallet account is derived from.
    pub module_tag: String,
    /// Sub-account index for the pallet account.
    pub sub_index: u32,
    /// SS58 network prefix used when rendering addresses.
    pub ss58_prefix: u16,
    /// 256-bit hash the runtime uses for module accounts.
    pub hash: HashAlgorithm,
    /// Maximum ids fetched by the bounded linear scan.
    pub scan_cap: u64,
    /// Optional per-query deadline in milliseconds. `None` disables it.
    pub query_timeout_ms: Option<u64>,
    /// Symbol of the native currency.
    pub native_symbol: String,
}

impl DashboardConfig {
    /// Per-query deadline as a [`Duration`], if one is configured.
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            pallet: LENDING_PALLET.to_string(),
            module_tag: LENDING_PALLET_TAG.to_string(),
            sub_index: LENDING_PALLET_SUB_INDEX,
            ss58_prefix: DEFAULT_SS58_PREFIX,
            hash: HashAlgorithm::default(),
            scan_cap: LINEAR_SCAN_CAP,
            query_timeout_ms: None,
            native_symbol: NATIVE_SYMBOL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_prefix_is_modl() {
        assert_eq!(MODULE_ACCOUNT_PREFIX, b"modl");
    }

    #[test]
    fn test_pallet_tag_fits_tag_length() {
        assert_eq!(LENDING_PALLET_TAG.len(), MODULE_TAG_LENGTH);
    }

    #[test]
    fn test_display_precision_below_max_decimals() {
        assert!(DISPLAY_PRECISION <= MAX_DECIMALS as usize);
    }

    #[test]
    fn test_empty_json_is_default_config() {
        let cfg: DashboardConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, DashboardConfig::default());
        assert_eq!(cfg.query_timeout(), None);
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let cfg: DashboardConfig =
            serde_json::from_str(r#"{ "ss58Prefix": 0, "queryTimeoutMs": 2500 }"#).unwrap();
        assert_eq!(cfg.ss58_prefix, 0);
        assert_eq!(cfg.query_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(cfg.module_tag, LENDING_PALLET_TAG);
        assert_eq!(cfg.scan_cap, LINEAR_SCAN_CAP);
    }
}
