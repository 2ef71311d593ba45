// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Shard builder: turns a batch of documents into one partial index file.
//!
//! A shard holds postings for its batch of documents only, grouped by
//! token id and then by document id — the same physical layout as the
//! final index file (see [`crate::binary`]), so the merger can treat shard
//! blocks and final blocks identically. Shards are transient: deleted once
//! the merge has consumed them.

use std::collections::BTreeMap;
use std::path::Path;

use crate::binary::{CodecParams, DocBlock, Posting, TokenBlock};
use crate::build::document::CaptionDocument;
use crate::error::Result;
use crate::lexicon::Lexicon;

/// Clamp a caption line's time interval to the codec's representable
/// range, logging a warning whenever clamping changes the input.
/// Clamping is diagnostic, never an error.
fn clamp_interval(
    doc_name: &str,
    line_index: usize,
    start_ms: u64,
    end_ms: u64,
    max_interval: u64,
) -> (u64, u64) {
    let mut end_ms = end_ms;
    if end_ms < start_ms {
        log::warn!(
            "{doc_name}: line {line_index} has end {end_ms} < start {start_ms}, clamping end to start"
        );
        end_ms = start_ms;
    }
    let duration = end_ms - start_ms;
    if duration > max_interval {
        log::warn!(
            "{doc_name}: line {line_index} duration {duration}ms exceeds max {max_interval}ms, clamping"
        );
        end_ms = start_ms + max_interval;
    }
    (start_ms, end_ms)
}

/// Build one shard file from a batch of `(doc_id, document)` pairs.
///
/// Tokens not present in `lexicon` are skipped for posting emission but
/// still advance the running position counter, so positions reflect the
/// surface token stream rather than the indexed one.
pub fn build_shard(
    batch: &[(u32, CaptionDocument)],
    lexicon: &Lexicon,
    params: &CodecParams,
    output_path: impl AsRef<Path>,
) -> Result<()> {
    let max_interval = params.max_time_interval();
    // token_id -> doc_id -> postings, both orderings ascending by
    // construction (BTreeMap), matching the required shard write-out order.
    let mut by_token: BTreeMap<u64, BTreeMap<u64, Vec<Posting>>> = BTreeMap::new();

    for (doc_id, doc) in batch {
        let mut position: u64 = 0;
        for (line_index, line) in doc.lines.iter().enumerate() {
            let (start_ms, end_ms) =
                clamp_interval(&doc.name, line_index, line.start_ms, line.end_ms, max_interval);
            for token in &line.tokens {
                if let Ok(word) = lexicon.lookup_by_token(token) {
                    by_token
                        .entry(word.id as u64)
                        .or_default()
                        .entry(*doc_id as u64)
                        .or_default()
                        .push(Posting {
                            position,
                            start_ms,
                            end_ms,
                        });
                }
                position += 1;
            }
        }
    }

    let mut buf = Vec::new();
    for (token_id, docs) in by_token {
        let doc_blocks: Vec<DocBlock> = docs
            .into_iter()
            .map(|(doc_id, postings)| DocBlock { doc_id, postings })
            .collect();
        let block = TokenBlock { token_id, docs: doc_blocks };
        crate::contracts::check_token_block_well_formed(&block);
        for doc in &block.docs {
            for posting in &doc.postings {
                crate::contracts::check_posting_interval_valid(posting, params);
            }
        }
        block.encode(params, &mut buf)?;
    }

    std::fs::write(output_path, buf)?;
    Ok(())
}
