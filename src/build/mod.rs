// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Build pipeline orchestration: list documents → build lexicon (parallel
//! word counting) → build shards (parallel) → merge (parallel) → rewrite
//! lexicon with offsets.
//!
//! The pipeline either produces a complete, valid index directory or exits
//! with an error and no partial shard directory left behind — see
//! [`TempDirGuard`].

pub mod document;
pub mod shard;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::binary::CodecParams;
use crate::docstats::DocStats;
use crate::doctable::DocumentTable;
use crate::error::Result;
use crate::lexicon::Lexicon;
use crate::merge::merge_shards;
use document::CaptionDocument;
use shard::build_shard;

/// Documents per shard, bounding a single shard-build worker's memory
/// while amortizing the cost of sorting postings by token.
const SHARD_BATCH_SIZE: usize = 100;

/// Inputs to a single build run.
pub struct BuildOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub num_workers: usize,
    pub doc_limit: Option<usize>,
    pub codec_params: CodecParams,
}

/// Removes its directory on drop — including on an early return via `?` —
/// so a build that fails partway never leaves a partial shard tree behind.
struct TempDirGuard(PathBuf);

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn progress_bar(len: u64, message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(
        "{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    ) {
        bar.set_style(style.progress_chars("##-"));
    }
    bar.set_message(message);
    bar
}

fn list_input_files(input_dir: &Path, limit: Option<usize>) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    if let Some(limit) = limit {
        files.truncate(limit);
    }
    Ok(files)
}

/// Load documents in parallel. A document that fails to parse is skipped
/// with a warning rather than failing the whole build.
fn load_documents(files: &[PathBuf], progress: &ProgressBar) -> Vec<CaptionDocument> {
    files
        .par_iter()
        .filter_map(|path| {
            let result = CaptionDocument::load(path);
            progress.inc(1);
            match result {
                Ok(doc) => Some(doc),
                Err(e) => {
                    log::warn!("skipping {}: {e}", path.display());
                    None
                }
            }
        })
        .collect()
}

/// Corpus-wide token counts, computed as a parallel map-reduce: each
/// worker folds a local count table over its slice of documents, and the
/// partial tables are combined pairwise. No shared mutable state or
/// mutex — the combination step *is* the aggregation the orchestrator
/// performs.
fn count_words(documents: &[CaptionDocument]) -> HashMap<String, u64> {
    documents
        .par_iter()
        .fold(HashMap::new, |mut acc, doc| {
            for line in &doc.lines {
                for token in &line.tokens {
                    *acc.entry(token.clone()).or_insert(0) += 1;
                }
            }
            acc
        })
        .reduce(HashMap::new, |mut a, b| {
            for (token, count) in b {
                *a.entry(token).or_insert(0) += count;
            }
            a
        })
}

fn build_shards_parallel(
    documents: &[(u32, CaptionDocument)],
    lexicon: &Lexicon,
    params: &CodecParams,
    shard_dir: &Path,
    progress: &ProgressBar,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(shard_dir)?;
    documents
        .chunks(SHARD_BATCH_SIZE)
        .enumerate()
        .collect::<Vec<_>>()
        .par_iter()
        .map(|&(i, batch)| {
            let path = shard_dir.join(format!("shard-{i:05}.bin"));
            build_shard(batch, lexicon, params, &path)?;
            progress.inc(1);
            Ok(path)
        })
        .collect()
}

/// Run the full build pipeline, writing `words.lex`, `docs.list`,
/// `docs.stats`, and `index.bin` into `opts.output_dir`.
pub fn run_build(opts: &BuildOptions) -> Result<()> {
    std::fs::create_dir_all(&opts.output_dir)?;
    let shard_dir = opts.output_dir.join("shards");
    let _guard = TempDirGuard(shard_dir.clone());

    let files = list_input_files(&opts.input_dir, opts.doc_limit)?;
    log::info!("found {} input documents", files.len());

    let load_bar = progress_bar(files.len() as u64, "loading documents");
    let documents = load_documents(&files, &load_bar);
    load_bar.finish_with_message("documents loaded");

    let counts = count_words(&documents);
    let mut lexicon = Lexicon::from_counts(counts);
    log::info!("lexicon has {} tokens", lexicon.size());

    let names: Vec<String> = documents.iter().map(|d| d.name.clone()).collect();
    let doctable = DocumentTable::from_names(names);

    let mut stats_by_id = vec![(0u64, 0u64); doctable.size()];
    let mut assigned: Vec<(u32, CaptionDocument)> = Vec::with_capacity(documents.len());
    for doc in documents {
        let doc_id = doctable.lookup_by_name(&doc.name)?;
        stats_by_id[doc_id as usize] = DocStats::compute(&doc);
        assigned.push((doc_id, doc));
    }
    let doc_stats = DocStats::from_entries(stats_by_id);

    let shard_bar = progress_bar(
        assigned.len().div_ceil(SHARD_BATCH_SIZE).max(1) as u64,
        "building shards",
    );
    let shard_paths =
        build_shards_parallel(&assigned, &lexicon, &opts.codec_params, &shard_dir, &shard_bar)?;
    shard_bar.finish_with_message("shards built");

    log::info!("merging {} shards with {} workers", shard_paths.len(), opts.num_workers);
    let index_path = opts.output_dir.join("index.bin");
    merge_shards(
        &shard_paths,
        &mut lexicon,
        &opts.codec_params,
        opts.num_workers,
        &index_path,
    )?;

    crate::contracts::check_lexicon_sorted(&lexicon);
    crate::contracts::check_document_table_dense(&doctable);

    lexicon.store(opts.output_dir.join("words.lex"))?;
    doctable.store(opts.output_dir.join("docs.list"))?;
    doc_stats.store(opts.output_dir.join("docs.stats"))?;

    log::info!("build complete: {}", opts.output_dir.display());
    Ok(())
}
