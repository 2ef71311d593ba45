// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Per-document length and duration, backing `IndexReader::document_length`.
//!
//! These are not derivable from the inverted index's postings alone (a
//! document's trailing untokenized or unindexed lines contribute to its
//! length and duration but leave no posting behind), so they are computed
//! once from the full token stream at shard-build time and persisted
//! alongside the document table. Duration is stored here in milliseconds,
//! matching the posting time fields it is derived from; the reader
//! truncates to seconds at the query boundary, where the public contract
//! is stated in seconds.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::build::document::CaptionDocument;
use crate::error::{IndexError, Result};

/// `(token_count, duration_ms)` for one document, indexed by doc id.
#[derive(Debug, Clone, Default)]
pub struct DocStats {
    entries: Vec<(u64, u64)>,
}

impl DocStats {
    pub fn from_entries(entries: Vec<(u64, u64)>) -> Self {
        DocStats { entries }
    }

    /// Compute a document's stats from its raw caption lines: token count
    /// is the surface token count (matching the position counter used by
    /// the shard builder); duration is the last line's end time.
    pub fn compute(doc: &CaptionDocument) -> (u64, u64) {
        let n_tokens = doc.token_count() as u64;
        let duration_ms = doc.lines.iter().map(|l| l.end_ms).max().unwrap_or(0);
        (n_tokens, duration_ms)
    }

    pub fn get(&self, doc_id: u32) -> Result<(u64, u64)> {
        self.entries
            .get(doc_id as usize)
            .copied()
            .ok_or(IndexError::OutOfRange {
                id: doc_id as u64,
                size: self.entries.len() as u64,
            })
    }

    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        for (id, (n_tokens, duration_ms)) in self.entries.iter().enumerate() {
            writeln!(w, "{id}\t{n_tokens}\t{duration_ms}")?;
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let mut parts = line.splitn(3, '\t');
            let malformed = || IndexError::MalformedInput {
                path: path_ref.display().to_string(),
                reason: "expected id\\tn_tokens\\tduration_ms".to_string(),
            };
            let _id: usize = parts.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
            let n_tokens: u64 = parts.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
            let duration_ms: u64 = parts.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
            entries.push((n_tokens, duration_ms));
        }
        Ok(DocStats { entries })
    }
}
