// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Terminal display for the `search` and `inspect` subcommands.
//!
//! Output is plain JSON — the CLI is a driver around the core library, not
//! a UI, and JSON keeps it trivially pipeable into `jq` or a test harness.

use serde::Serialize;

use crate::doctable::DocumentTable;
use crate::index::DocumentMatches;
use crate::lexicon::Lexicon;

#[derive(Serialize)]
struct MatchView<'a> {
    doc_id: u32,
    doc_name: &'a str,
    postings: Vec<PostingView>,
}

#[derive(Serialize)]
struct PostingView {
    position: u64,
    start_ms: u64,
    end_ms: u64,
    len: usize,
}

/// Print search results as a JSON array, one object per matching document.
pub fn print_search_results(results: &[DocumentMatches], documents: &DocumentTable) {
    let views: Vec<MatchView> = results
        .iter()
        .map(|m| MatchView {
            doc_id: m.doc_id,
            doc_name: documents.lookup_by_id(m.doc_id).unwrap_or("<unknown>"),
            postings: m
                .postings
                .iter()
                .map(|p| PostingView {
                    position: p.position,
                    start_ms: p.start_ms,
                    end_ms: p.end_ms,
                    len: p.len,
                })
                .collect(),
        })
        .collect();

    match serde_json::to_string_pretty(&views) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to serialize results: {e}"),
    }
}

#[derive(Serialize)]
struct LexiconSummary {
    token_count: usize,
    document_count: usize,
    sample_tokens: Vec<String>,
}

/// Print a short summary of an index directory's lexicon and document table.
pub fn print_inspect_summary(lexicon: &Lexicon, documents: &DocumentTable) {
    let sample_tokens: Vec<String> = lexicon.iter().take(10).map(|w| w.token.clone()).collect();
    let summary = LexiconSummary {
        token_count: lexicon.size(),
        document_count: documents.size(),
        sample_tokens,
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to serialize summary: {e}"),
    }
}
