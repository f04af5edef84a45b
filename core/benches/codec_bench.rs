// Hot-path benchmarks for the lending dashboard core.
//
// Covers display formatting of chain balances, exact decimal parsing,
// module-account derivation per hash backend, and loan normalization over
// batches the size of one bounded scan.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use halal_lending_core::account::{AccountDeriver, ModuleTag, SubstrateBackend};
use halal_lending_core::amount::{parse_amount, BalanceCodec};
use halal_lending_core::chain::{RawRecord, Representation};
use halal_lending_core::config::{DEFAULT_SS58_PREFIX, LINEAR_SCAN_CAP};
use halal_lending_core::crypto::HashAlgorithm;
use halal_lending_core::diagnostics::TracingSink;
use halal_lending_core::resolver::normalize_loan;

fn bench_format_display(c: &mut Criterion) {
    let codec = BalanceCodec::new(Arc::new(TracingSink));
    let mut group = c.benchmark_group("codec/format_display");

    for (name, raw) in [
        ("plain", "1000000000000000"),
        ("grouped", "1,234,567,890,123,456"),
        ("hex", "0x000000000000000000038d7ea4c68000"),
        ("max", "340282366920938463463374607431768211455"),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), raw, |b, raw| {
            b.iter(|| codec.format_display(Some(raw), 12));
        });
    }

    group.finish();
}

fn bench_parse_amount(c: &mut Criterion) {
    c.bench_function("codec/parse_amount", |b| {
        b.iter(|| parse_amount("12345.678901234567", 18).unwrap());
    });
}

fn bench_derive(c: &mut Criterion) {
    let tag = ModuleTag::new("hlallend").unwrap();
    let mut group = c.benchmark_group("account/derive");

    for algorithm in [
        HashAlgorithm::Blake2b256,
        HashAlgorithm::Blake3,
        HashAlgorithm::Sha256,
    ] {
        let deriver = AccountDeriver::new(
            Arc::new(SubstrateBackend::new(algorithm, DEFAULT_SS58_PREFIX)),
            Arc::new(TracingSink),
        );
        group.bench_function(algorithm.as_str(), |b| {
            b.iter(|| deriver.derive(&tag, 0).unwrap());
        });
    }

    group.finish();
}

fn bench_normalize_batch(c: &mut Criterion) {
    let sink = TracingSink;
    let records: Vec<_> = (0..LINEAR_SCAN_CAP)
        .map(|i| {
            RawRecord::human(json!({
                "borrower": "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY",
                "collateralAmount": "2,000,000,000,000",
                "loanAmount": "1,000,000,000,000",
                "ltv": "50",
                "status": if i % 3 == 0 { "Repaid" } else { "Active" },
            }))
            .with(Representation::Json, json!({ "loanAmount": 1_000_000_000_000u64 }))
        })
        .collect();

    let mut group = c.benchmark_group("resolver/normalize");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("bounded_scan_batch", |b| {
        b.iter(|| {
            records
                .iter()
                .enumerate()
                .map(|(i, record)| normalize_loan(&i.to_string(), record, &sink))
                .count()
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_format_display,
    bench_parse_amount,
    bench_derive,
    bench_normalize_batch,
);
criterion_main!(benches);
