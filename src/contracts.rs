// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Runtime contracts for the index's structural invariants.
//!
//! These are `debug_assert!`-based checks, zero-cost in release builds.
//! They exist to catch a broken build pipeline early rather than to be
//! exhaustively re-verified at query time — readers trust that an index
//! they open was produced by a pipeline that upheld these contracts.
//!
//! # Invariants checked here
//!
//! | Contract                         | Invariant                                   |
//! |-----------------------------------|----------------------------------------------|
//! | `check_lexicon_sorted`            | lexicon monotone in id and in token          |
//! | `check_document_table_dense`      | document ids are `[0, |D|)`                  |
//! | `check_token_block_well_formed`   | docs strictly increasing; postings strictly increasing by position |
//! | `check_posting_interval_valid`    | `start <= end <= start + MAX_INTERVAL`       |
//! | `check_token_count_matches`       | `count(token) == sum of posting counts`      |

use crate::binary::{CodecParams, Posting, TokenBlock};
use crate::doctable::DocumentTable;
use crate::lexicon::Lexicon;

/// Lexicon is stored sorted by both id and token.
pub fn check_lexicon_sorted(lexicon: &Lexicon) {
    let mut prev: Option<(u32, &str)> = None;
    for word in lexicon.iter() {
        if let Some((prev_id, prev_token)) = prev {
            debug_assert!(word.id > prev_id, "lexicon not sorted by id");
            debug_assert!(word.token.as_str() > prev_token, "lexicon not sorted by token");
        }
        prev = Some((word.id, word.token.as_str()));
    }
}

/// Document ids form the dense range `[0, |D|)`.
pub fn check_document_table_dense(documents: &DocumentTable) {
    for (i, doc) in documents.iter().enumerate() {
        debug_assert_eq!(doc.id as usize, i, "document ids are not dense from 0");
    }
}

/// Within a token block: doc ids strictly increasing; within each doc,
/// positions strictly increasing.
pub fn check_token_block_well_formed(block: &TokenBlock) {
    let mut prev_doc_id: Option<u64> = None;
    for doc in &block.docs {
        if let Some(prev) = prev_doc_id {
            debug_assert!(doc.doc_id > prev, "doc ids not strictly increasing within token block");
        }
        prev_doc_id = Some(doc.doc_id);

        debug_assert!(!doc.postings.is_empty(), "doc sub-block has no postings");
        let mut prev_position: Option<u64> = None;
        for posting in &doc.postings {
            if let Some(prev) = prev_position {
                debug_assert!(posting.position > prev, "positions not strictly increasing within doc");
            }
            prev_position = Some(posting.position);
        }
    }
}

/// A posting's time interval is within the codec's representable range.
pub fn check_posting_interval_valid(posting: &Posting, params: &CodecParams) {
    debug_assert!(posting.start_ms <= posting.end_ms, "posting start exceeds end");
    debug_assert!(
        posting.end_ms - posting.start_ms <= params.max_time_interval(),
        "posting duration exceeds codec's max interval"
    );
}

/// A token's stored corpus-wide count equals the number of postings that
/// survived into its block (unknown-token drops don't affect this, since
/// `count` is computed from the same indexed occurrences as the block).
pub fn check_token_count_matches(expected_count: u64, block: &TokenBlock) {
    let actual: u64 = block.docs.iter().map(|d| d.postings.len() as u64).sum();
    debug_assert_eq!(actual, expected_count, "token count does not match posting total");
}
