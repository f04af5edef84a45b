// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Halal Lending Dashboard — Core Library
//!
//! Everything in the lending dashboard that can lose somebody money lives
//! here. The rest is buttons.
//!
//! Two things carry the risk. The first is the pallet account: the address
//! users deposit into is derived, not configured, and a wrong derivation
//! sends funds somewhere nobody can retrieve them. The second is amounts:
//! balances are 128-bit integers with up to 18 implied decimals, which no
//! floating-point type survives.
//!
//! ## Architecture
//!
//! - **amount** — Raw units ⇄ decimal strings. Display and encode, no floats.
//! - **account** — Module-account derivation and tiered pallet-account lookup.
//! - **chain** — The injected query capability and an in-memory snapshot chain.
//! - **resolver** — Loan discovery across storage layouts, one normalizer.
//! - **balances** — Multi-currency balance table for the pallet account.
//! - **intent** — What the user asked to sign, with exact raw amounts.
//! - **diagnostics** — Structured reports of every fallback taken.
//! - **crypto** — Blake2b / BLAKE3 / SHA-256 and SS58.
//! - **config** — Runtime constants and the tunable [`DashboardConfig`].
//! - **error** — Crate-level error and failure taxonomy.
//!
//! ## Design Philosophy
//!
//! 1. Reads degrade, writes fail. A balance we cannot parse shows as zero
//!    and is reported; an amount we cannot encode is an error.
//! 2. Capabilities are injected. No global chain client, no global sink.
//! 3. Never guess an address. No hash, no derivation.
//! 4. Every fallback is a diagnostic. Silence is how schema drift hides.
//!
//! [`DashboardConfig`]: config::DashboardConfig

pub mod account;
pub mod amount;
pub mod balances;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod diagnostics;
pub mod error;
pub mod intent;
pub mod resolver;

pub use error::{Error, ErrorKind};
