// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! capidx CLI: build, inspect, and search caption inverted indexes.
//!
//! ```bash
//! # Build an index from a directory of pre-tokenized JSON documents
//! capidx build --input ./docs --output ./index
//!
//! # Inspect the lexicon and document table
//! capidx inspect ./index
//!
//! # Run an n-gram query
//! capidx search ./index "UNITED STATES" --limit 10
//! ```

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use capidx::binary::CodecParams;
use capidx::build::{run_build, BuildOptions};
use capidx::cli::display::{print_inspect_summary, print_search_results};
use capidx::cli::{Cli, Commands};
use capidx::docstats::DocStats;
use capidx::doctable::DocumentTable;
use capidx::index::IndexReader;
use capidx::lexicon::Lexicon;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build {
            input,
            output,
            workers,
            limit,
        } => build(&input, &output, workers, limit),
        Commands::Inspect { dir } => inspect(&dir),
        Commands::Search { dir, query, limit } => search(&dir, &query, limit),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn build(input: &str, output: &str, workers: usize, limit: Option<usize>) -> Result<()> {
    let opts = BuildOptions {
        input_dir: Path::new(input).to_path_buf(),
        output_dir: Path::new(output).to_path_buf(),
        num_workers: workers,
        doc_limit: limit,
        codec_params: CodecParams::default(),
    };
    run_build(&opts).context("build failed")?;
    Ok(())
}

fn open_reader(dir: &str) -> Result<IndexReader> {
    let dir = Path::new(dir);
    let lexicon = Lexicon::load(dir.join("words.lex")).context("loading lexicon")?;
    let documents = DocumentTable::load(dir.join("docs.list")).context("loading document table")?;
    let doc_stats = DocStats::load(dir.join("docs.stats")).context("loading document stats")?;
    let params = CodecParams::default();
    IndexReader::open(dir.join("index.bin"), lexicon, documents, doc_stats, params)
        .context("opening index")
}

fn inspect(dir: &str) -> Result<()> {
    let reader = open_reader(dir)?;
    print_inspect_summary(reader.lexicon(), reader.documents());
    Ok(())
}

fn search(dir: &str, query: &str, limit: usize) -> Result<()> {
    let reader = open_reader(dir)?;
    let word_ids: Vec<u32> = query
        .split_whitespace()
        .map(|token| reader.lexicon().lookup_by_token(token).map(|w| w.id))
        .collect::<capidx::Result<_>>()
        .context("resolving query tokens")?;

    let mut results = reader.ngram_search(&word_ids, None)?;
    results.truncate(limit);
    print_search_results(&results, reader.documents());
    Ok(())
}
