// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the capidx command-line interface.
//!
//! Three subcommands: `build` to construct an index from a directory of
//! pre-tokenized caption documents, `inspect` to examine an index
//! directory's structure, and `search` to run n-gram queries against one.

pub mod display;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "capidx",
    about = "Memory-mappable inverted index over time-stamped caption corpora",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build an index from a directory of tokenized caption documents
    Build {
        /// Input directory containing `*.json` caption documents
        #[arg(short, long)]
        input: String,

        /// Output directory for the index, lexicon, and document table
        #[arg(short, long)]
        output: String,

        /// Number of parallel workers for shard building and merging
        #[arg(short = 'w', long, default_value_t = num_cpus())]
        workers: usize,

        /// Only index the first N documents (by name), for quick iteration
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Inspect an index directory's lexicon and document table
    Inspect {
        /// Path to the index output directory
        dir: String,
    },

    /// Run an n-gram query against an index directory
    Search {
        /// Path to the index output directory
        dir: String,

        /// Whitespace-separated phrase to search for, e.g. "UNITED STATES"
        query: String,

        /// Maximum number of matching documents to print
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
