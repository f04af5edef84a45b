//! Integration tests for the dashboard core.
//!
//! These drive the public API against an [`InMemoryChain`] the way the
//! dashboard binary does: resolve the pallet account, read its balances,
//! discover loans through whichever strategy the chain layout allows, and
//! summarize them. Each test builds its own snapshot.

use std::sync::Arc;

use serde_json::json;

use halal_lending_core::account::{AccountDeriver, AccountSource, ModuleTag};
use halal_lending_core::amount::currency::{DOT, PALLET_BALANCE_CURRENCIES, USDT};
use halal_lending_core::amount::{QuantityParser, RawAmount};
use halal_lending_core::balances::{BalanceSource, PalletBalanceReader};
use halal_lending_core::chain::{ChainSnapshot, InMemoryChain, KeyArg, RawRecord};
use halal_lending_core::config::{
    DashboardConfig, ITEM_LOANS, ITEM_SYSTEM_ACCOUNT, LENDING_PALLET, SYSTEM_PALLET,
};
use halal_lending_core::diagnostics::{DiagnosticKind, MemorySink};
use halal_lending_core::intent::TransferIntent;
use halal_lending_core::resolver::{
    Completeness, EntityResolver, LoanStats, ResolutionStrategy,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";

/// A loan in the human representation: comma-grouped amounts, capitalized
/// status, the way a node's "human" rendering returns it.
fn human_loan(borrower: &str, principal: u64, status: &str) -> RawRecord {
    RawRecord::human(json!({
        "borrower": borrower,
        "collateral": format_grouped(principal * 2),
        "principal": format_grouped(principal),
        "ltv": "50",
        "status": status,
    }))
}

fn format_grouped(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Loans `0..borrowers.len()` with the given borrowers, plus `nextLoanId`.
fn sequential_loans(borrowers: &[&str]) -> ChainSnapshot {
    let mut snapshot = ChainSnapshot::default();
    for (id, borrower) in borrowers.iter().enumerate() {
        snapshot.insert_entry(
            LENDING_PALLET,
            ITEM_LOANS,
            vec![KeyArg::Index(id as u64)],
            human_loan(borrower, 1_000 * (id as u64 + 1), "Active"),
        );
    }
    snapshot.set_value(
        LENDING_PALLET,
        "nextLoanId",
        RawRecord::json(json!(borrowers.len())),
    );
    snapshot
}

fn resolver(chain: InMemoryChain) -> (EntityResolver, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (EntityResolver::new(Arc::new(chain), sink.clone()), sink)
}

// ---------------------------------------------------------------------------
// Strategy Fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bounded_scan_takes_over_when_iteration_and_index_are_unavailable() {
    let chain = InMemoryChain::new(sequential_loans(&[ALICE, BOB, ALICE]))
        .fail_entries(LENDING_PALLET, ITEM_LOANS);
    let (resolver, sink) = resolver(chain);

    let resolution = resolver.resolve_loans_for_owner(ALICE).await.unwrap();

    assert_eq!(resolution.strategy, Some(ResolutionStrategy::BoundedScan));
    assert_eq!(resolution.completeness, Completeness::Complete);
    let ids: Vec<_> = resolution.loans.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "0"]);
    assert_eq!(resolution.loans[0].principal, RawAmount::new(3_000));
    assert_eq!(resolution.loans[0].collateral, RawAmount::new(6_000));

    assert_eq!(sink.count(DiagnosticKind::StrategyFailed), 1);
    assert_eq!(sink.count(DiagnosticKind::StrategyUnavailable), 1);
    assert_eq!(sink.count(DiagnosticKind::PartialResult), 0);
}

#[tokio::test]
async fn capped_scan_reports_a_partial_result() {
    let chain = InMemoryChain::new(sequential_loans(&[ALICE, ALICE, ALICE, ALICE, ALICE]))
        .fail_entries(LENDING_PALLET, ITEM_LOANS);
    let (resolver, sink) = resolver(chain);
    let resolver = resolver.with_scan_cap(3);

    let resolution = resolver.resolve_loans_for_owner(ALICE).await.unwrap();

    assert_eq!(
        resolution.completeness,
        Completeness::Partial {
            scanned: 3,
            reported_total: 5
        }
    );
    assert_eq!(resolution.loans.len(), 3);
    let events = sink.events();
    let partial = events
        .iter()
        .find(|e| e.kind == DiagnosticKind::PartialResult)
        .unwrap();
    assert_eq!(partial.get("scanned"), Some("3"));
    assert_eq!(partial.get("reported_total"), Some("5"));
}

#[tokio::test]
async fn scan_without_a_counter_is_unverified() {
    let mut snapshot = ChainSnapshot::default();
    snapshot.insert_entry(
        LENDING_PALLET,
        ITEM_LOANS,
        vec![KeyArg::Index(4)],
        human_loan(BOB, 10, "Active"),
    );
    let chain = InMemoryChain::new(snapshot).fail_entries(LENDING_PALLET, ITEM_LOANS);
    let (resolver, sink) = resolver(chain);
    let resolver = resolver.with_scan_cap(8);

    let resolution = resolver.list_all_loans().await.unwrap();

    assert_eq!(resolution.strategy, Some(ResolutionStrategy::BoundedScan));
    assert_eq!(resolution.completeness, Completeness::Unverified { scanned: 8 });
    assert_eq!(resolution.loans.len(), 1);
    assert_eq!(resolution.loans[0].id, "4");
    assert_eq!(sink.count(DiagnosticKind::PartialResult), 1);
}

#[tokio::test]
async fn an_empty_chain_resolves_to_nothing() {
    let mut snapshot = ChainSnapshot::default();
    snapshot.declare_item(LENDING_PALLET, ITEM_LOANS);
    snapshot.set_value(LENDING_PALLET, "nextLoanId", RawRecord::json(json!(0)));
    let (resolver, sink) = resolver(InMemoryChain::new(snapshot));

    let resolution = resolver.resolve_loans_for_owner(ALICE).await.unwrap();

    assert!(resolution.loans.is_empty());
    assert_eq!(resolution.strategy, None);
    assert!(resolution.completeness.is_complete());
    assert_eq!(sink.count(DiagnosticKind::StrategyEmpty), 2);
}

#[tokio::test]
async fn borrower_matches_across_address_formats() {
    // Alice's account id, written as hex in storage.
    let alice_hex = "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
    let mut snapshot = ChainSnapshot::default();
    snapshot.insert_entry(
        LENDING_PALLET,
        ITEM_LOANS,
        vec![KeyArg::Index(0)],
        RawRecord::json(json!({ "borrower": alice_hex, "loanAmount": 7 })),
    );
    let (resolver, _) = resolver(InMemoryChain::new(snapshot));

    let loans = resolver.find_loans_for_owner(ALICE).await.unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].principal, RawAmount::new(7));
    assert!(resolver.find_loans_for_owner(BOB).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Snapshot Files
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolves_from_a_json_snapshot() {
    let snapshot = ChainSnapshot::from_json_str(&format!(
        r#"{{
          "pallets": {{
            "halalLending": {{
              "storage": {{
                "loans": {{ "entries": [
                  {{ "key": [0], "value": {{ "json": {{ "borrower": "{ALICE}", "collateralAmount": "0x0de0b6b3a7640000", "loanAmount": 500000000000 }} }} }},
                  {{ "key": ["1"], "value": {{ "human": {{ "account": "{ALICE}", "principal": "2,000,000,000,000", "status": "Repaid" }} }} }}
                ] }},
                "userLoans": {{ "entries": [ {{ "key": ["{ALICE}"], "value": {{ "json": [0, 1] }} }} ] }},
                "platformRewards": {{ "value": {{ "json": "1,250" }} }}
              }}
            }}
          }}
        }}"#
    ))
    .unwrap();
    let (resolver, _) = resolver(InMemoryChain::new(snapshot));

    let resolution = resolver.resolve_loans_for_owner(ALICE).await.unwrap();
    assert_eq!(resolution.strategy, Some(ResolutionStrategy::FullScan));
    let ids: Vec<_> = resolution.loans.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "0"]);
    assert_eq!(resolution.loans[1].collateral, RawAmount::new(1_000_000_000_000_000_000));
    assert_eq!(resolution.loans[0].principal, RawAmount::new(2_000_000_000_000));
    assert!(!resolution.loans[0].status.is_active());

    let stats = LoanStats::from_records(&resolution.loans);
    assert_eq!(stats.total_loans, 2);
    assert_eq!(stats.active_loans, 1);
    assert_eq!(stats.total_principal, RawAmount::new(2_500_000_000_000));

    assert_eq!(
        resolver.fetch_platform_rewards().await,
        Some(RawAmount::new(1_250))
    );
}

// ---------------------------------------------------------------------------
// Pallet Account to Balances
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deposit_flow_against_a_derived_pallet_account() {
    let config = DashboardConfig::default();
    let sink = Arc::new(MemorySink::new());
    let deriver = AccountDeriver::from_config(&config, sink.clone());
    let tag = ModuleTag::new(&config.module_tag).unwrap();

    // The chain publishes its pallet id; the account is derived from it.
    let expected = deriver.derive(&tag, config.sub_index).unwrap();
    let mut snapshot = ChainSnapshot::default();
    snapshot
        .set_constant(
            LENDING_PALLET,
            "palletId",
            RawRecord::json(json!(format!("0x{}", hex::encode(tag.as_bytes())))),
        )
        .insert_entry(
            SYSTEM_PALLET,
            ITEM_SYSTEM_ACCOUNT,
            vec![KeyArg::Text(expected.address.clone())],
            RawRecord::json(json!({ "data": { "free": 42_000_000_000_000u64 } })),
        );
    let chain = Arc::new(InMemoryChain::new(snapshot));

    let pallet = deriver
        .resolve_pallet_account(chain.as_ref(), LENDING_PALLET, &tag, config.sub_index)
        .await
        .unwrap();
    assert_eq!(pallet.source, AccountSource::PublishedConstant);
    assert_eq!(pallet.derived, expected);

    let reader = PalletBalanceReader::new(chain.clone(), sink.clone());
    let rows = reader
        .read_balances(&pallet.derived.address, PALLET_BALANCE_CURRENCIES)
        .await;
    assert_eq!(rows[0].currency, DOT.symbol);
    assert_eq!(rows[0].source, BalanceSource::System);
    assert_eq!(rows[0].formatted, "42.0000");
    // No tokens or assets pallet on this chain: the other rows fall back.
    assert!(rows[1..].iter().all(|r| r.source == BalanceSource::Fallback));
    assert_eq!(sink.count(DiagnosticKind::BalanceFallback), 3);

    let intent =
        TransferIntent::deposit(&QuantityParser::default(), pallet.derived, USDT, "12.5").unwrap();
    assert_eq!(intent.amount, RawAmount::new(12_500_000));
    assert_eq!(intent.destination.address, expected.address);
}
