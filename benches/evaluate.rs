//! Parse and evaluate throughput.
//!
//! Run benchmarks: `cargo bench --bench evaluate`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use jel::{EvaluationConfig, JelContext};
use std::hint::black_box;

/// A document exercising references, generators, templates and branches.
fn document(records: usize) -> String {
    let rows: Vec<String> = (0..records)
        .map(|i| format!("{{ id: {}, name: \"Record {}\", value: {} }}", i, i, i * 100))
        .collect();
    format!(
        "rows: [{}]\n(v) if band: {{\n  $v > 5000: high\n  $v > 1000: mid\n  else: low\n}}\n[row] ($rows..) bands: $band($row.value)\n[row, i] ($rows..) totals: $row.value * 2 + $i\ncount: $rows.size()",
        rows.join(", ")
    )
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for records in [10, 100, 1000] {
        let source = document(records);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(records), &source, |b, source| {
            b.iter(|| jel::parse(black_box(source)).expect("parse"));
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    for records in [10, 100, 1000] {
        let document = jel::parse(&document(records)).expect("parse");
        group.throughput(Throughput::Elements(records as u64));
        group.bench_with_input(BenchmarkId::from_parameter(records), &document, |b, document| {
            b.iter(|| {
                let mut ctx = JelContext::with_config(EvaluationConfig::default());
                jel::evaluate(black_box(document), &mut ctx).expect("evaluate")
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_evaluate);
criterion_main!(benches);
