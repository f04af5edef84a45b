// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Halal Lending Dashboard
//!
//! Entry point for the `halal-dash` binary. Parses CLI arguments, loads the
//! configuration, initializes logging and metrics, runs one command against
//! the dashboard core and prints its result as JSON.
//!
//! - `derive`: module-account derivation
//! - `format`: raw balance to display string
//! - `parse`: decimal string to raw units
//! - `loans`: loan discovery, per owner or platform-wide
//! - `pallet-balance`: pallet account and its balance table
//! - `balance`: one account's free balance
//! - `deposit`: transfer intent into the pallet account
//! - `borrow`: loan request intent
//! - `repay`: repayment intent
//! - `version`: build version information

mod cli;
mod logging;
mod metrics;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde_json::{json, Value};

use halal_lending_core::account::{AccountDeriver, ModuleTag, PalletAccount};
use halal_lending_core::amount::currency::{self, PALLET_BALANCE_CURRENCIES, REGISTRY};
use halal_lending_core::amount::{
    to_full_decimal, AmountError, BalanceCodec, CurrencyDescriptor, InvalidReason, ParsePolicy,
    QuantityParser, RawAmount,
};
use halal_lending_core::balances::PalletBalanceReader;
use halal_lending_core::chain::{ChainQuery, InMemoryChain};
use halal_lending_core::config::{DashboardConfig, MAX_DECIMALS};
use halal_lending_core::diagnostics::{SharedSink, Tee, TracingSink};
use halal_lending_core::intent::{LoanIntent, RepayIntent, TransferIntent};
use halal_lending_core::resolver::{EntityResolver, LoanStats};
use halal_lending_core::Error as CoreError;

use cli::{Commands, DashCli, PrecisionArgs};
use metrics::DiagnosticMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DashCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    let config = load_config(cli.config.as_deref())?;
    let metrics = DiagnosticMetrics::new().context("failed to register metrics")?;
    let sink: SharedSink = Arc::new(Tee(TracingSink, metrics.clone()));

    let output = match run(cli.command, &config, sink, &metrics).await {
        Ok(output) => output,
        Err(err) => {
            if let Some(core) = err.downcast_ref::<CoreError>() {
                tracing::error!(kind = %core.kind(), "command failed: {err:#}");
            }
            return Err(err);
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    if cli.metrics {
        print!("{}", metrics.encode().context("failed to encode metrics")?);
    }
    Ok(())
}

/// Runs one command and returns the document to print.
async fn run(
    command: Commands,
    config: &DashboardConfig,
    sink: SharedSink,
    metrics: &DiagnosticMetrics,
) -> Result<Value> {
    match command {
        Commands::Derive(args) => {
            let mut config = config.clone();
            if let Some(tag) = args.tag {
                config.module_tag = tag;
            }
            if let Some(index) = args.index {
                config.sub_index = index;
            }
            if let Some(prefix) = args.ss58_prefix {
                config.ss58_prefix = prefix;
            }
            if let Some(hash) = args.hash {
                config.hash = hash;
            }
            derive(&config, sink)
        }

        Commands::Format(args) => {
            let decimals = decimals(&args.precision)?;
            let display = BalanceCodec::new(sink).format_display(Some(&args.raw), decimals);
            let full = if args.full {
                if decimals > MAX_DECIMALS {
                    return Err(CoreError::from(AmountError::InvalidAmount {
                        input: args.raw,
                        reason: InvalidReason::DecimalsOutOfRange(decimals),
                    })
                    .into());
                }
                let raw = RawAmount::from_chain_str(&args.raw)
                    .ok_or_else(|| anyhow!("{:?} is not a raw balance", args.raw))?;
                Some(to_full_decimal(raw, decimals))
            } else {
                None
            };
            Ok(json!({
                "raw": args.raw,
                "decimals": decimals,
                "display": display,
                "full": full,
            }))
        }

        Commands::Parse(args) => {
            let decimals = decimals(&args.precision)?;
            let raw = parser(args.truncate)
                .parse(&args.amount, decimals)
                .map_err(CoreError::from)?;
            Ok(json!({ "input": args.amount, "decimals": decimals, "raw": raw }))
        }

        Commands::Loans(args) => {
            let chain = open_chain(&args.source.snapshot)?;
            let mut resolver = EntityResolver::from_config(chain, sink, config);
            if let Some(cap) = args.scan_cap {
                resolver = resolver.with_scan_cap(cap);
            }
            if let Some(ms) = args.timeout_ms {
                resolver = resolver.with_query_timeout(Duration::from_millis(ms));
            }

            let resolution = match &args.owner {
                Some(owner) => resolver.resolve_loans_for_owner(owner).await,
                None => resolver.list_all_loans().await,
            }
            .map_err(CoreError::from)?;
            metrics
                .loans_resolved_total
                .inc_by(resolution.loans.len() as u64);

            if args.owner.is_some() {
                return Ok(serde_json::to_value(resolution)?);
            }
            let stats = LoanStats::from_records(&resolution.loans);
            let rewards = resolver.fetch_platform_rewards().await;
            Ok(json!({
                "resolution": resolution,
                "stats": stats,
                "platformRewards": rewards,
            }))
        }

        Commands::PalletBalance(args) => {
            let chain = open_chain(&args.snapshot)?;
            let account = pallet_account(chain.as_ref(), config, Arc::clone(&sink)).await?;
            let balances = PalletBalanceReader::from_config(chain, sink, config)
                .read_balances(&account.derived.address, PALLET_BALANCE_CURRENCIES)
                .await;
            Ok(json!({ "account": account, "balances": balances }))
        }

        Commands::Balance(args) => {
            let chain = open_chain(&args.source.snapshot)?;
            let currency = lookup_currency(&args.currency)?;
            let row = PalletBalanceReader::from_config(chain, sink, config)
                .read_balance(&args.address, currency)
                .await;
            Ok(json!({ "address": args.address, "balance": row }))
        }

        Commands::Deposit(args) => {
            let chain = open_chain(&args.source.snapshot)?;
            let account = pallet_account(chain.as_ref(), config, sink).await?;
            let intent = TransferIntent::deposit(
                &parser(args.truncate),
                account.derived,
                lookup_currency(&args.currency)?,
                &args.amount,
            )
            .map_err(CoreError::from)?;
            Ok(serde_json::to_value(intent)?)
        }

        Commands::Borrow(args) => {
            let intent = LoanIntent::new(
                &QuantityParser::default(),
                &args.collateral,
                lookup_currency(&args.collateral_currency)?,
                &args.loan,
                lookup_currency(&args.loan_currency)?,
            )
            .map_err(CoreError::from)?;
            Ok(serde_json::to_value(intent)?)
        }

        Commands::Repay(args) => Ok(serde_json::to_value(RepayIntent::new(args.loan_id))?),

        Commands::Version => Ok(json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "pallet": config.pallet,
            "hash": config.hash,
        })),
    }
}

fn derive(config: &DashboardConfig, sink: SharedSink) -> Result<Value> {
    let tag = ModuleTag::new(&config.module_tag).map_err(CoreError::from)?;
    let derived = AccountDeriver::from_config(config, sink)
        .derive(&tag, config.sub_index)
        .map_err(CoreError::from)?;
    Ok(json!({
        "tag": tag.to_string(),
        "index": config.sub_index,
        "hash": config.hash,
        "ss58Prefix": config.ss58_prefix,
        "preimage": format!("0x{}", hex::encode(AccountDeriver::preimage(&tag, config.sub_index))),
        "accountId": derived.account,
        "address": derived.address,
    }))
}

/// Reads the configuration file, or the defaults when none is given.
fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    let Some(path) = path else {
        return Ok(DashboardConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: DashboardConfig = serde_json::from_str(&text)
        .with_context(|| format!("malformed config {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        pallet = %config.pallet,
        hash = %config.hash,
        "configuration loaded"
    );
    Ok(config)
}

fn open_chain(path: &Path) -> Result<Arc<InMemoryChain>> {
    let chain = InMemoryChain::load(path)
        .map_err(CoreError::from)
        .with_context(|| format!("failed to load snapshot {}", path.display()))?;
    Ok(Arc::new(chain))
}

async fn pallet_account(
    chain: &dyn ChainQuery,
    config: &DashboardConfig,
    sink: SharedSink,
) -> Result<PalletAccount> {
    let tag = ModuleTag::new(&config.module_tag).map_err(CoreError::from)?;
    let account = AccountDeriver::from_config(config, sink)
        .resolve_pallet_account(chain, &config.pallet, &tag, config.sub_index)
        .await
        .map_err(CoreError::from)
        .context("failed to resolve the pallet account")?;
    tracing::info!(
        address = %account.derived.address,
        source = account.source.as_str(),
        "pallet account resolved"
    );
    Ok(account)
}

fn lookup_currency(symbol: &str) -> Result<CurrencyDescriptor> {
    currency::lookup(symbol).ok_or_else(|| {
        let known: Vec<_> = REGISTRY.iter().map(|c| c.symbol).collect();
        anyhow!("unknown currency {symbol:?}; known: {}", known.join(", "))
    })
}

fn decimals(precision: &PrecisionArgs) -> Result<u8> {
    match (precision.decimals, precision.currency.as_deref()) {
        (Some(decimals), _) => Ok(decimals),
        (None, Some(symbol)) => Ok(lookup_currency(symbol)?.decimals),
        (None, None) => Err(anyhow!("either --decimals or --currency is required")),
    }
}

fn parser(truncate: bool) -> QuantityParser {
    QuantityParser::new(if truncate {
        ParsePolicy::Truncate
    } else {
        ParsePolicy::Reject
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use halal_lending_core::chain::{ChainSnapshot, KeyArg, RawRecord, Representation};
    use halal_lending_core::config::{ITEM_LOANS, ITEM_SYSTEM_ACCOUNT, LENDING_PALLET, SYSTEM_PALLET};
    use halal_lending_core::crypto::HashAlgorithm;
    use halal_lending_core::diagnostics::MemorySink;
    use halal_lending_core::ErrorKind;
    use tempfile::NamedTempFile;

    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

    fn write_json(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn snapshot_file() -> NamedTempFile {
        let mut snapshot = ChainSnapshot::default();
        snapshot
            .insert_entry(
                LENDING_PALLET,
                ITEM_LOANS,
                vec![KeyArg::Index(0)],
                RawRecord::json(json!({ "borrower": ALICE, "loanAmount": 1_000, "collateralAmount": 2_000 })),
            )
            .set_value(LENDING_PALLET, "platformRewards", RawRecord::json(json!(25)))
            .set_constant(LENDING_PALLET, "palletId", RawRecord::human(json!("hlallend")));
        write_json(&serde_json::to_string(&snapshot).unwrap())
    }

    fn context() -> (DashboardConfig, SharedSink, DiagnosticMetrics) {
        (
            DashboardConfig::default(),
            Arc::new(MemorySink::new()),
            DiagnosticMetrics::new().unwrap(),
        )
    }

    #[test]
    fn test_config_defaults_without_file() {
        assert_eq!(load_config(None).unwrap(), DashboardConfig::default());
    }

    #[test]
    fn test_config_file_overrides_some_fields() {
        let file = write_json(r#"{ "scanCap": 5, "hash": "sha256", "queryTimeoutMs": 250 }"#);
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.scan_cap, 5);
        assert_eq!(config.hash, HashAlgorithm::Sha256);
        assert_eq!(config.query_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.pallet, DashboardConfig::default().pallet);
    }

    #[test]
    fn test_config_errors_name_the_file() {
        let file = write_json("{ not json");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("malformed config"));
    }

    #[test]
    fn test_currency_lookup() {
        assert_eq!(lookup_currency("USDT").unwrap().decimals, 6);
        let err = lookup_currency("XYZ").unwrap_err().to_string();
        assert!(err.contains("unknown currency"));
        assert!(err.contains("DOT"));
    }

    #[tokio::test]
    async fn test_parse_surfaces_invalid_amount_kind() {
        let (config, sink, metrics) = context();
        let cli = DashCli::try_parse_from(["halal-dash", "parse", "--amount", "abc", "--decimals", "12"])
            .unwrap();
        let err = run(cli.command, &config, sink, &metrics).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<CoreError>().map(CoreError::kind),
            Some(ErrorKind::InvalidAmount)
        );
    }

    #[tokio::test]
    async fn test_format_and_full_precision() {
        let (config, sink, metrics) = context();
        let cli = DashCli::try_parse_from([
            "halal-dash", "format", "--raw", "1234567890123", "--currency", "DOT", "--full",
        ])
        .unwrap();
        let out = run(cli.command, &config, sink, &metrics).await.unwrap();
        assert_eq!(out["display"], "1.2345");
        assert_eq!(out["full"], "1.234567890123");
    }

    #[tokio::test]
    async fn test_loans_all_includes_stats_and_rewards() {
        let file = snapshot_file();
        let (config, sink, metrics) = context();
        let path = file.path().to_str().unwrap();
        let cli = DashCli::try_parse_from(["halal-dash", "loans", "-s", path, "--all"]).unwrap();

        let out = run(cli.command, &config, sink, &metrics).await.unwrap();
        assert_eq!(out["stats"]["totalLoans"], 1);
        assert_eq!(out["stats"]["totalPrincipal"], "1000");
        assert_eq!(out["platformRewards"], "25");
        assert_eq!(out["resolution"]["strategy"], "fullScan");
        assert_eq!(metrics.loans_resolved_total.get(), 1);
    }

    #[tokio::test]
    async fn test_deposit_targets_the_derived_pallet_account() {
        let file = snapshot_file();
        let (config, sink, metrics) = context();
        let expected = derive(&config, Arc::clone(&sink)).unwrap();
        let path = file.path().to_str().unwrap();
        let cli = DashCli::try_parse_from([
            "halal-dash", "deposit", "-s", path, "--amount", "1.5",
        ])
        .unwrap();

        let out = run(cli.command, &config, sink, &metrics).await.unwrap();
        assert_eq!(out["destination"]["address"], expected["address"]);
        assert_eq!(out["amount"], "1500000000000");
    }

    #[tokio::test]
    async fn test_format_full_rejects_out_of_range_decimals() {
        let (config, sink, metrics) = context();
        let cli = DashCli::try_parse_from([
            "halal-dash", "format", "--raw", "1", "--decimals", "19", "--full",
        ])
        .unwrap();
        let err = run(cli.command, &config, sink, &metrics).await.unwrap_err();
        let core = err.downcast_ref::<CoreError>().unwrap();
        assert_eq!(core.kind(), ErrorKind::InvalidAmount);
        assert!(core.to_string().contains("out of range"));
    }

    #[tokio::test]
    async fn test_balance_reads_system_account() {
        let mut snapshot = ChainSnapshot::default();
        snapshot.insert_entry(
            SYSTEM_PALLET,
            ITEM_SYSTEM_ACCOUNT,
            vec![KeyArg::Text(ALICE.into())],
            RawRecord::human(json!({ "data": { "free": "3.5000 kDOT" } }))
                .with(Representation::Json, json!({ "data": { "free": 3_500_000_000_000_000u64 } })),
        );
        let file = write_json(&serde_json::to_string(&snapshot).unwrap());
        let (config, sink, metrics) = context();
        let path = file.path().to_str().unwrap();
        let cli = DashCli::try_parse_from(["halal-dash", "balance", "-s", path, "--address", ALICE])
            .unwrap();

        let out = run(cli.command, &config, sink, &metrics).await.unwrap();
        assert_eq!(out["address"], ALICE);
        assert_eq!(out["balance"]["currency"], "DOT");
        assert_eq!(out["balance"]["formatted"], "3500.0000");
        assert_eq!(out["balance"]["source"], "system");
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_an_error() {
        let (config, sink, metrics) = context();
        let cli = DashCli::try_parse_from([
            "halal-dash", "pallet-balance", "-s", "/nonexistent/chain.json",
        ])
        .unwrap();
        let err = run(cli.command, &config, sink, &metrics).await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to load snapshot"));
    }
}
