//! # Currency Registry
//!
//! Symbol → decimals for every currency the dashboard shows. The registry is
//! static: a currency's decimals are fixed by its runtime and never change
//! under a running dashboard.

use serde::Serialize;

use crate::config::{MAX_DECIMALS, NATIVE_DECIMALS, NATIVE_SYMBOL};

/// A currency symbol and the number of decimals its raw amounts carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CurrencyDescriptor {
    /// Ticker symbol, e.g. `"DOT"`.
    pub symbol: &'static str,
    /// Decimal places between raw units and whole tokens. Always `<= 18`.
    pub decimals: u8,
}

impl CurrencyDescriptor {
    /// Creates a descriptor. Panics at compile time (in const context) or at
    /// runtime if `decimals` exceeds the protocol maximum.
    pub const fn new(symbol: &'static str, decimals: u8) -> Self {
        assert!(decimals <= MAX_DECIMALS, "currency decimals out of range");
        Self { symbol, decimals }
    }

    /// Whether this is the chain's native currency.
    pub fn is_native(&self) -> bool {
        self.symbol == NATIVE_SYMBOL
    }
}

pub const DOT: CurrencyDescriptor = CurrencyDescriptor::new(NATIVE_SYMBOL, NATIVE_DECIMALS);
pub const KSM: CurrencyDescriptor = CurrencyDescriptor::new("KSM", 12);
pub const UNIT: CurrencyDescriptor = CurrencyDescriptor::new("UNIT", 12);
pub const VDOT: CurrencyDescriptor = CurrencyDescriptor::new("vDOT", 12);
pub const VKSM: CurrencyDescriptor = CurrencyDescriptor::new("vKSM", 12);
pub const VBNC: CurrencyDescriptor = CurrencyDescriptor::new("vBNC", 12);
pub const USDT: CurrencyDescriptor = CurrencyDescriptor::new("USDT", 6);
pub const USDC: CurrencyDescriptor = CurrencyDescriptor::new("USDC", 6);

/// Every known currency.
pub const REGISTRY: &[CurrencyDescriptor] = &[DOT, KSM, UNIT, VDOT, VKSM, VBNC, USDT, USDC];

/// Currencies shown in the pallet balance table, in display order.
pub const PALLET_BALANCE_CURRENCIES: &[CurrencyDescriptor] = &[DOT, USDT, USDC, KSM];

/// Looks up a currency by its exact symbol.
pub fn lookup(symbol: &str) -> Option<CurrencyDescriptor> {
    REGISTRY.iter().copied().find(|c| c.symbol == symbol)
}
