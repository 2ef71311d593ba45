// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! External merger: assembles shard files into one index file with
//! globally sorted tokens and, within each token, globally sorted doc ids.
//!
//! Two phases:
//! - **Phase A (parallel).** The lexicon's token-id space is split into
//!   `W` roughly equal partitions. Each partition is merged independently
//!   by a worker that opens one [`ShardParser`] per shard, restricted to
//!   that partition's token range, and drains them via a two-level
//!   priority queue (outer: token id, inner: doc id). See
//!   [`merge_partition`].
//! - **Phase B (sequential).** Partition outputs are concatenated in
//!   partition order; each partition's local jump offsets are rescaled by
//!   the cumulative byte size of the partitions before it.

pub mod parser;

use std::collections::BinaryHeap;
use std::cmp::Reverse;
use std::path::Path;

use rayon::prelude::*;

use crate::binary::{CodecParams, TokenBlock};
use crate::error::{IndexError, Result};
use crate::lexicon::{Lexicon, UNINDEXED};
use parser::ShardParser;

/// Merge all `shard_paths` into the final index at `output_path`, writing
/// jump offsets back into `lexicon`. `num_workers` bounds parallelism in
/// phase A; it is clamped to at least 1.
pub fn merge_shards(
    shard_paths: &[impl AsRef<Path>],
    lexicon: &mut Lexicon,
    params: &CodecParams,
    num_workers: usize,
    output_path: impl AsRef<Path>,
) -> Result<()> {
    let shard_paths: Vec<&Path> = shard_paths.iter().map(|p| p.as_ref()).collect();
    let total_tokens = lexicon.size() as u64;
    if total_tokens == 0 {
        std::fs::write(output_path, [])?;
        return Ok(());
    }

    let num_workers = num_workers.max(1) as u64;
    let tokens_per_worker = total_tokens.div_ceil(num_workers);
    let partitions: Vec<(u64, u64)> = (0..num_workers)
        .map(|w| {
            let lo = w * tokens_per_worker;
            let hi = ((w + 1) * tokens_per_worker).min(total_tokens);
            (lo, hi)
        })
        .filter(|(lo, hi)| lo < hi)
        .collect();

    let partition_results: Vec<Result<(Vec<u8>, std::collections::HashMap<u64, i64>)>> =
        partitions
            .par_iter()
            .map(|&(lo, hi)| merge_partition(&shard_paths, lexicon, params, lo, hi))
            .collect();

    let mut final_bytes = Vec::new();
    let mut global_offsets = std::collections::HashMap::new();
    for result in partition_results {
        let (bytes, local_offsets) = result?;
        let base = final_bytes.len() as i64;
        for (token_id, local_offset) in local_offsets {
            global_offsets.insert(token_id as u32, base + local_offset);
        }
        final_bytes.extend_from_slice(&bytes);
    }

    std::fs::write(output_path, &final_bytes)?;
    lexicon.apply_offsets(&global_offsets);
    Ok(())
}

/// Merge the `[partition_min, partition_max)` token range across every
/// shard in `shard_paths`, returning the partition's encoded bytes and the
/// byte offset (relative to the start of those bytes) of each token it
/// produced.
fn merge_partition(
    shard_paths: &[&Path],
    lexicon: &Lexicon,
    params: &CodecParams,
    partition_min: u64,
    partition_max: u64,
) -> Result<(Vec<u8>, std::collections::HashMap<u64, i64>)> {
    let mut parsers = Vec::with_capacity(shard_paths.len());
    for path in shard_paths {
        let bytes = std::fs::read(path)?;
        let mut blocks = Vec::new();
        let mut offset = 0;
        while offset < bytes.len() {
            let (block, consumed) = TokenBlock::decode(params, &bytes[offset..])?;
            offset += consumed;
            blocks.push(block);
        }
        let parser = ShardParser::for_partition(blocks, partition_min, partition_max);
        if !parser.is_exhausted() {
            parsers.push(parser);
        }
    }

    let mut outer: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::new();
    for (idx, parser) in parsers.iter().enumerate() {
        if let Some(token) = parser.current_token_id() {
            outer.push(Reverse((token, idx)));
        }
    }

    let mut out = Vec::new();
    let mut jump_offsets = std::collections::HashMap::new();

    while let Some(&Reverse((token, _))) = outer.peek() {
        let mut same_token = Vec::new();
        while let Some(&Reverse((t, idx))) = outer.peek() {
            if t != token {
                break;
            }
            outer.pop();
            same_token.push(idx);
        }

        let mut inner: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::new();
        for &idx in &same_token {
            if let Some(doc_id) = parsers[idx].current_doc_id() {
                inner.push(Reverse((doc_id, idx)));
            }
        }

        let mut docs = Vec::new();
        let mut last_doc: Option<u64> = None;
        while let Some(Reverse((doc_id, idx))) = inner.pop() {
            if last_doc == Some(doc_id) {
                return Err(IndexError::IntegrityError(format!(
                    "token {token} has duplicate doc {doc_id} across shards"
                )));
            }
            last_doc = Some(doc_id);
            docs.push(parsers[idx].current_doc().clone());

            if parsers[idx].advance_doc() {
                let next_doc = parsers[idx].current_doc_id().unwrap();
                inner.push(Reverse((next_doc, idx)));
            } else if parsers[idx].advance_token() {
                if let Some(next_token) = parsers[idx].current_token_id() {
                    outer.push(Reverse((next_token, idx)));
                }
            }
        }

        if docs.is_empty() {
            return Err(IndexError::IntegrityError(format!(
                "token {token} produced an empty doc list during merge"
            )));
        }

        let jump_offset = out.len() as i64;
        let block = TokenBlock {
            token_id: token,
            docs,
        };
        crate::contracts::check_token_block_well_formed(&block);
        if let Ok(word) = lexicon.lookup_by_id(token as u32) {
            crate::contracts::check_token_count_matches(word.count, &block);
        }
        block.encode(params, &mut out)?;
        jump_offsets.insert(token, jump_offset);
    }

    Ok((out, jump_offsets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::document::{CaptionDocument, CaptionLine};
    use crate::build::shard::build_shard;
    use std::collections::HashMap;

    fn lexicon() -> Lexicon {
        let mut counts = HashMap::new();
        counts.insert("united".to_string(), 3);
        counts.insert("states".to_string(), 3);
        counts.insert("the".to_string(), 1);
        Lexicon::from_counts(counts)
    }

    fn line(start: u64, end: u64, tokens: &[&str]) -> CaptionLine {
        CaptionLine {
            start_ms: start,
            end_ms: end,
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn two_shard_merge_orders_docs_globally() {
        let lex_initial = lexicon();
        let params = CodecParams::default();
        let dir = tempfile::tempdir().unwrap();

        // shard 1: docs 2 and 5 both contain "united"
        let shard1_docs = vec![
            (2u32, CaptionDocument { name: "doc2".into(), lines: vec![line(0, 10, &["united"])] }),
            (5u32, CaptionDocument { name: "doc5".into(), lines: vec![line(0, 10, &["united"])] }),
        ];
        let shard1_path = dir.path().join("shard1.bin");
        build_shard(&shard1_docs, &lex_initial, &params, &shard1_path).unwrap();

        // shard 2: doc 3 contains "united"
        let shard2_docs = vec![(
            3u32,
            CaptionDocument { name: "doc3".into(), lines: vec![line(0, 10, &["united"])] },
        )];
        let shard2_path = dir.path().join("shard2.bin");
        build_shard(&shard2_docs, &lex_initial, &params, &shard2_path).unwrap();

        let mut lex = lexicon();
        let index_path = dir.path().join("index.bin");
        merge_shards(&[&shard1_path, &shard2_path], &mut lex, &params, 2, &index_path).unwrap();

        let bytes = std::fs::read(&index_path).unwrap();
        let united_id = lex.lookup_by_token("united").unwrap().id;
        let offset = lex.lookup_by_token("united").unwrap().offset;
        assert_ne!(offset, crate::lexicon::UNINDEXED);

        let (block, _) = TokenBlock::decode(&params, &bytes[offset as usize..]).unwrap();
        assert_eq!(block.token_id, united_id as u64);
        let doc_ids: Vec<u64> = block.docs.iter().map(|d| d.doc_id).collect();
        assert_eq!(doc_ids, vec![2, 3, 5]);
    }

    #[test]
    fn unindexed_tokens_keep_sentinel_offset() {
        let lex_initial = lexicon();
        let params = CodecParams::default();
        let dir = tempfile::tempdir().unwrap();
        let shard_docs = vec![(
            0u32,
            CaptionDocument { name: "doc0".into(), lines: vec![line(0, 10, &["united"])] },
        )];
        let shard_path = dir.path().join("shard.bin");
        build_shard(&shard_docs, &lex_initial, &params, &shard_path).unwrap();

        let mut lex = lexicon();
        let index_path = dir.path().join("index.bin");
        merge_shards(&[&shard_path], &mut lex, &params, 4, &index_path).unwrap();

        assert_eq!(lex.lookup_by_token("the").unwrap().offset, crate::lexicon::UNINDEXED);
    }
}
