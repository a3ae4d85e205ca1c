//! Benchmark suite for Ringwatch
//!
//! Run with: `cargo bench --package ringwatch`

use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ringwatch::prelude::*;
use ringwatch::graph::intelligence::GraphIntelligence;
use ringwatch::patterns::shell::ShellDetection;
use std::hint::black_box;

/// Deterministic synthetic ledger over two weeks (xorshift, no self-transfers).
fn ledger(accounts: usize, transactions: usize) -> Vec<Transaction> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    (0..transactions)
        .map(|i| {
            let from = (next() % accounts as u64) as usize;
            let mut to = (next() % accounts as u64) as usize;
            if to == from {
                to = (to + 1) % accounts;
            }
            let amount = 50.0 + (next() % 10_000) as f64;
            let minutes = (next() % (14 * 24 * 60)) as i64;
            Transaction::new(
                format!("TX{i:07}"),
                format!("ACC{from:05}"),
                format!("ACC{to:05}"),
                amount,
                base + Duration::minutes(minutes),
            )
        })
        .collect()
}

fn bench_pipeline(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let pipeline = Pipeline::new(AnalysisConfig::default());

    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);
    for &(accounts, txs) in &[(200, 1_000), (1_000, 5_000)] {
        let data = ledger(accounts, txs);
        group.bench_with_input(BenchmarkId::from_parameter(txs), &data, |b, data| {
            b.iter(|| {
                runtime
                    .block_on(pipeline.run(black_box(data.clone())))
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_stages(c: &mut Criterion) {
    let data = ledger(1_000, 5_000);
    let graph = TransactionGraph::from_transactions(&data);
    let config = AnalysisConfig::default();

    c.bench_function("graph_intelligence_5k", |b| {
        b.iter(|| GraphIntelligence::compute(black_box(&graph), &config.graph))
    });
    c.bench_function("shell_detection_5k", |b| {
        b.iter(|| ShellDetection::compute(black_box(&graph), &config.shell).unwrap())
    });
}

criterion_group!(benches, bench_pipeline, bench_stages);
criterion_main!(benches);
