//! Privacy benchmarks for PAN/PII detection and redaction.
//!
//! These benches focus on the hot paths exercised by the sanitizer: raw
//! detection over transaction log lines of increasing size, and full
//! redaction including the re-scan that proves the output clean.
//!
//! Run with: `cargo bench --bench privacy_bench -p sentinelpay-common
//! --features foundation`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sentinelpay_common::privacy::patterns::PatternMatcher;

const BASE_LOG_LINE: &str = "\
    [2024-03-17T12:01:45Z] TXN-000421 cardholder: John Doe email=john.doe@example.com \
    phone=+1-415-555-2671 card=4111-1111-1111-1111 cvv 123 exp 09/27 \
    merchant=\"Corner Coffee\" amount=12.50 ship to 42 Elm Street\n";

const CLEAN_LOG_LINE: &str = "\
    [2024-03-17T12:01:45Z] TXN-000422 merchant=\"Corner Coffee\" amount=12.50 \
    status=approved terminal=POS-7 batch=19\n";

type DetectionCorpusEntry = (&'static str, Arc<str>);

fn generate_detection_corpus() -> Vec<DetectionCorpusEntry> {
    vec![
        ("short_log", Arc::<str>::from(BASE_LOG_LINE)),
        ("medium_log", Arc::<str>::from(BASE_LOG_LINE.repeat(8))),
        ("long_log", Arc::<str>::from(BASE_LOG_LINE.repeat(32))),
        ("clean_long_log", Arc::<str>::from(CLEAN_LOG_LINE.repeat(32))),
    ]
}

fn bench_detection(c: &mut Criterion) {
    let matcher = PatternMatcher::with_defaults().expect("failed to build matcher for benchmark");
    let mut group = c.benchmark_group("privacy/detect");

    for (name, text) in generate_detection_corpus() {
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &text, |b, text| {
            b.iter(|| black_box(matcher.detect(black_box(text))));
        });
    }

    group.finish();
}

fn bench_redaction(c: &mut Criterion) {
    let matcher = PatternMatcher::with_defaults().expect("failed to build matcher for benchmark");
    let mut group = c.benchmark_group("privacy/redact");

    for (name, text) in generate_detection_corpus() {
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &text, |b, text| {
            b.iter(|| black_box(matcher.redact(black_box(text))));
        });
    }

    group.finish();
}

criterion_group!(privacy_benches, bench_detection, bench_redaction);
criterion_main!(privacy_benches);
