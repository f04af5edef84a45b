//! # CLI Interface
//!
//! Defines the command-line argument structure for `halal-dash` using
//! `clap` derive. Every subcommand prints one JSON document to stdout.
//! Commands that read chain state take `--snapshot`, a JSON file loaded
//! into the in-memory chain.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use halal_lending_core::config::NATIVE_SYMBOL;
use halal_lending_core::crypto::HashAlgorithm;

use crate::logging::{LogFormat, DEFAULT_FILTER};

/// Halal lending dashboard.
///
/// Derives the lending pallet's account, formats and parses balances,
/// discovers loans and builds transaction intents.
#[derive(Parser, Debug)]
#[command(
    name = "halal-dash",
    about = "Halal lending dashboard",
    version,
    propagate_version = true
)]
pub struct DashCli {
    /// Path to a JSON configuration file. Missing fields take defaults.
    #[arg(long, short = 'c', global = true, env = "HALAL_DASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = DEFAULT_FILTER)]
    pub log_level: String,

    /// Print Prometheus metrics after the command's output.
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive a module account from a pallet tag.
    Derive(DeriveArgs),
    /// Render a raw chain balance for display.
    Format(FormatArgs),
    /// Encode a decimal amount as raw units.
    Parse(ParseArgs),
    /// Discover loans for an owner, or all loans.
    Loans(LoansArgs),
    /// Resolve the pallet account and read its balances.
    PalletBalance(SnapshotArgs),
    /// Read one account's free balance.
    Balance(BalanceArgs),
    /// Build a deposit into the pallet account.
    Deposit(DepositArgs),
    /// Build a loan request.
    Borrow(BorrowArgs),
    /// Build a loan repayment.
    Repay(RepayArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for `derive`. Each flag overrides the configuration file.
#[derive(Args, Debug)]
pub struct DeriveArgs {
    /// Module tag, up to 8 ASCII bytes.
    #[arg(long)]
    pub tag: Option<String>,

    /// Sub-account index.
    #[arg(long)]
    pub index: Option<u32>,

    /// SS58 network prefix.
    #[arg(long)]
    pub ss58_prefix: Option<u16>,

    /// Hash algorithm: blake2b256, blake3 or sha256.
    #[arg(long)]
    pub hash: Option<HashAlgorithm>,
}

/// Either explicit decimals or a known currency symbol.
#[derive(Args, Debug)]
pub struct PrecisionArgs {
    /// Implied decimals of the raw value.
    #[arg(long, required_unless_present = "currency", conflicts_with = "currency")]
    pub decimals: Option<u8>,

    /// Currency symbol whose decimals to use (e.g. DOT, USDT).
    #[arg(long)]
    pub currency: Option<String>,
}

/// Arguments for `format`.
#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Raw balance as the chain returns it: digits, grouped or 0x-hex.
    #[arg(long)]
    pub raw: String,

    #[command(flatten)]
    pub precision: PrecisionArgs,

    /// Also print the value at full precision.
    #[arg(long)]
    pub full: bool,
}

/// Arguments for `parse`.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Decimal amount, e.g. `1.5`.
    #[arg(long)]
    pub amount: String,

    #[command(flatten)]
    pub precision: PrecisionArgs,

    /// Drop digits beyond the currency's precision instead of rejecting.
    #[arg(long)]
    pub truncate: bool,
}

/// Snapshot source shared by chain-reading commands.
#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Chain snapshot (JSON).
    #[arg(long, short = 's', env = "HALAL_DASH_SNAPSHOT")]
    pub snapshot: PathBuf,
}

/// Arguments for `loans`.
#[derive(Args, Debug)]
pub struct LoansArgs {
    #[command(flatten)]
    pub source: SnapshotArgs,

    /// Owner address (SS58 under any prefix, or 0x hex).
    #[arg(long, required_unless_present = "all", conflicts_with = "all")]
    pub owner: Option<String>,

    /// Every loan, with admin totals and platform rewards.
    #[arg(long)]
    pub all: bool,

    /// Maximum ids fetched by the bounded scan.
    #[arg(long)]
    pub scan_cap: Option<u64>,

    /// Per-query deadline in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Arguments for `balance`.
#[derive(Args, Debug)]
pub struct BalanceArgs {
    #[command(flatten)]
    pub source: SnapshotArgs,

    /// Account address as the chain keys it.
    #[arg(long)]
    pub address: String,

    /// Currency symbol.
    #[arg(long, default_value = NATIVE_SYMBOL)]
    pub currency: String,
}

/// Arguments for `deposit`.
#[derive(Args, Debug)]
pub struct DepositArgs {
    #[command(flatten)]
    pub source: SnapshotArgs,

    /// Decimal amount to deposit.
    #[arg(long)]
    pub amount: String,

    /// Currency symbol.
    #[arg(long, default_value = NATIVE_SYMBOL)]
    pub currency: String,

    /// Drop digits beyond the currency's precision instead of rejecting.
    #[arg(long)]
    pub truncate: bool,
}

/// Arguments for `borrow`.
#[derive(Args, Debug)]
pub struct BorrowArgs {
    /// Collateral amount.
    #[arg(long)]
    pub collateral: String,

    /// Collateral currency symbol.
    #[arg(long, default_value = NATIVE_SYMBOL)]
    pub collateral_currency: String,

    /// Loan amount.
    #[arg(long)]
    pub loan: String,

    /// Loan currency symbol.
    #[arg(long, default_value = NATIVE_SYMBOL)]
    pub loan_currency: String,
}

/// Arguments for `repay`.
#[derive(Args, Debug)]
pub struct RepayArgs {
    /// Loan id as shown by `loans`.
    #[arg(long)]
    pub loan_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        DashCli::command().debug_assert();
    }

    #[test]
    fn format_requires_decimals_or_currency() {
        assert!(DashCli::try_parse_from(["halal-dash", "format", "--raw", "1"]).is_err());
        assert!(DashCli::try_parse_from([
            "halal-dash", "format", "--raw", "1", "--decimals", "12", "--currency", "DOT"
        ])
        .is_err());

        let cli =
            DashCli::try_parse_from(["halal-dash", "format", "--raw", "1", "--currency", "DOT"])
                .unwrap();
        match cli.command {
            Commands::Format(args) => assert_eq!(args.precision.currency.as_deref(), Some("DOT")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn loans_takes_owner_or_all() {
        assert!(DashCli::try_parse_from(["halal-dash", "loans", "-s", "chain.json"]).is_err());
        assert!(DashCli::try_parse_from([
            "halal-dash", "loans", "-s", "chain.json", "--all", "--owner", "5Grw"
        ])
        .is_err());
        assert!(
            DashCli::try_parse_from(["halal-dash", "loans", "-s", "chain.json", "--all"]).is_ok()
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = DashCli::try_parse_from([
            "halal-dash",
            "derive",
            "--hash",
            "blake3",
            "--metrics",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert!(cli.metrics);
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Commands::Derive(args) => assert_eq!(args.hash, Some(HashAlgorithm::Blake3)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn balance_requires_an_address() {
        assert!(DashCli::try_parse_from(["halal-dash", "balance", "-s", "chain.json"]).is_err());
        let cli = DashCli::try_parse_from([
            "halal-dash", "balance", "-s", "chain.json", "--address", "5Grw",
        ])
        .unwrap();
        match cli.command {
            Commands::Balance(args) => assert_eq!(args.currency, NATIVE_SYMBOL),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn borrow_defaults_to_native_currency() {
        let cli =
            DashCli::try_parse_from(["halal-dash", "borrow", "--collateral", "150", "--loan", "100"])
                .unwrap();
        match cli.command {
            Commands::Borrow(args) => {
                assert_eq!(args.collateral_currency, NATIVE_SYMBOL);
                assert_eq!(args.loan_currency, NATIVE_SYMBOL);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
