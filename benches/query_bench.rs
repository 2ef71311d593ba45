//! Benchmarks for n-gram queries against a built index, at a few corpus
//! sizes and n-gram lengths.
//!
//! Run with: cargo bench --bench query_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;

use capidx::binary::CodecParams;
use capidx::build::document::{CaptionDocument, CaptionLine};
use capidx::build::shard::build_shard;
use capidx::docstats::DocStats;
use capidx::doctable::DocumentTable;
use capidx::index::IndexReader;
use capidx::lexicon::Lexicon;
use capidx::merge::merge_shards;

const VOCAB: &[&str] = &[
    "united", "states", "the", "of", "america", "president", "congress", "senate", "house",
    "today", "announced", "budget", "economy", "election", "treaty", "border", "trade", "market",
];

fn build_index(num_docs: usize, tokens_per_doc: usize) -> IndexReader {
    let docs: Vec<CaptionDocument> = (0..num_docs)
        .map(|i| {
            let tokens: Vec<String> = (0..tokens_per_doc)
                .map(|j| VOCAB[(i + j) % VOCAB.len()].to_string())
                .collect();
            CaptionDocument {
                name: format!("doc-{i:05}.srt"),
                lines: vec![CaptionLine {
                    start_ms: 0,
                    end_ms: (tokens_per_doc as u64) * 500,
                    tokens,
                }],
            }
        })
        .collect();

    let mut counts = HashMap::new();
    for doc in &docs {
        for line in &doc.lines {
            for token in &line.tokens {
                *counts.entry(token.clone()).or_insert(0u64) += 1;
            }
        }
    }
    let mut lexicon = Lexicon::from_counts(counts);
    let params = CodecParams::default();
    let doctable = DocumentTable::from_names(docs.iter().map(|d| d.name.clone()).collect());

    let mut stats = vec![(0u64, 0u64); doctable.size()];
    let mut batch = Vec::with_capacity(docs.len());
    for doc in docs {
        let id = doctable.lookup_by_name(&doc.name).unwrap();
        stats[id as usize] = DocStats::compute(&doc);
        batch.push((id, doc));
    }
    let doc_stats = DocStats::from_entries(stats);

    let dir = tempfile::tempdir().unwrap();
    let shard_path = dir.path().join("shard.bin");
    build_shard(&batch, &lexicon, &params, &shard_path).unwrap();

    let index_path = dir.path().join("index.bin");
    merge_shards(&[&shard_path], &mut lexicon, &params, 4, &index_path).unwrap();

    // Keep the directory alive for the lifetime of the reader by leaking
    // it: this is benchmark-only setup, run once per corpus size.
    let index_path = Box::leak(Box::new(index_path)).clone();
    IndexReader::open(&index_path, lexicon, doctable, doc_stats, params).unwrap()
}

fn bench_ngram_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("ngram_search");
    for &num_docs in &[50usize, 500] {
        let reader = build_index(num_docs, 200);
        let united = reader.lexicon().lookup_by_token("united").unwrap().id;
        let states = reader.lexicon().lookup_by_token("states").unwrap().id;

        group.bench_with_input(BenchmarkId::from_parameter(num_docs), &reader, |b, reader| {
            b.iter(|| {
                black_box(reader.ngram_search(&[united, states], None).unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ngram_search);
criterion_main!(benches);
