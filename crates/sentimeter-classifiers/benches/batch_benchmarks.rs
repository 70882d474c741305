//! Batch throughput benchmarks
//!
//! Measures per-batch overhead of classification plus summary and
//! word-frequency aggregation, using the lexicon classifier so no model
//! files are needed.
//!
//! Run with: cargo bench -p sentimeter-classifiers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sentimeter_classifiers::{BatchProcessor, LexiconClassifier};
use sentimeter_core::words::{top_k, tokenize, DEFAULT_TOP_K};
use std::sync::Arc;
use tokio::runtime::Runtime;

const SAMPLE_TEXTS: &[&str] = &[
    "Great product, fast delivery and the packaging was excellent",
    "Bad service, the courier was late and the box was damaged",
    "ok fine, nothing special about it",
    "Pelayanan sangat bagus dan cepat",
    "Barang rusak, kecewa sekali dengan penjual ini",
    "",
];

fn make_batch(size: usize) -> Vec<String> {
    SAMPLE_TEXTS
        .iter()
        .cycle()
        .take(size)
        .map(|s| s.to_string())
        .collect()
}

fn benchmark_batch_sizes(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let classifier = LexiconClassifier::new().expect("Failed to create lexicon classifier");
    let processor = BatchProcessor::new(Arc::new(classifier));

    let mut group = c.benchmark_group("Batch_Predict");
    group.sample_size(50);

    for size in [1usize, 10, 100, 1000] {
        let batch = make_batch(size);
        group.bench_with_input(BenchmarkId::new("lexicon", size), &batch, |b, batch| {
            b.iter(|| rt.block_on(async { processor.predict(black_box(batch.as_slice())).await }));
        });
    }

    group.finish();
}

fn benchmark_word_frequency(c: &mut Criterion) {
    let batch = make_batch(1000);

    c.bench_function("word_freq_top_k_1000_texts", |b| {
        b.iter(|| {
            let words = black_box(&batch).iter().flat_map(|t| tokenize(t));
            top_k(words, DEFAULT_TOP_K)
        });
    });
}

criterion_group!(benches, benchmark_batch_sizes, benchmark_word_frequency);
criterion_main!(benches);
