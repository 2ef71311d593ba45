// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Token lexicon: a bijection between token strings and dense ids.
//!
//! The lexicon is built once (sorted by token, ids assigned in that order),
//! persisted, and rewritten exactly once more after the merge to fill in
//! jump offsets. Outside of that rewrite, it is read-only.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{IndexError, Result};

/// Sentinel `jump_offset` for a token with no postings in the final index.
pub const UNINDEXED: i64 = -1;

/// One lexicon entry: a token, its assigned id, its corpus-wide occurrence
/// count, and its byte offset into the final index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub id: u32,
    pub token: String,
    pub count: u64,
    pub offset: i64,
}

/// A map from token to id, and vice versa.
///
/// Entries are stored sorted by both `id` and `token` — the two orders
/// coincide by construction, since ids are assigned in token-sorted order
/// at build time ([`Lexicon::from_counts`]).
#[derive(Debug, Clone)]
pub struct Lexicon {
    words: Vec<Word>,
    by_token: HashMap<String, u32>,
}

impl Lexicon {
    /// Build a lexicon from per-token occurrence counts, sorting tokens
    /// lexicographically and assigning ids `[0, |L|)` in that order.
    pub fn from_counts(counts: HashMap<String, u64>) -> Self {
        let mut tokens: Vec<(String, u64)> = counts.into_iter().collect();
        tokens.sort_by(|a, b| a.0.cmp(&b.0));
        let words = tokens
            .into_iter()
            .enumerate()
            .map(|(id, (token, count))| Word {
                id: id as u32,
                token,
                count,
                offset: UNINDEXED,
            })
            .collect();
        Self::from_words(words)
    }

    /// Construct directly from an already id/token-sorted word list.
    pub fn from_words(words: Vec<Word>) -> Self {
        let by_token = words
            .iter()
            .map(|w| (w.token.clone(), w.id))
            .collect();
        Lexicon { words, by_token }
    }

    pub fn size(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Iterate lexicon entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Word> {
        self.words.iter()
    }

    pub fn lookup_by_token(&self, token: &str) -> Result<&Word> {
        let id = *self
            .by_token
            .get(token)
            .ok_or_else(|| IndexError::UnknownToken(token.to_string()))?;
        Ok(&self.words[id as usize])
    }

    pub fn lookup_by_id(&self, id: u32) -> Result<&Word> {
        self.words.get(id as usize).ok_or(IndexError::OutOfRange {
            id: id as u64,
            size: self.words.len() as u64,
        })
    }

    pub fn contains_token(&self, token: &str) -> bool {
        self.by_token.contains_key(token)
    }

    /// Overwrite jump offsets after the merge phase, by id. `offsets[id]`
    /// is the byte offset of that token's block, or [`UNINDEXED`].
    pub fn apply_offsets(&mut self, offsets: &HashMap<u32, i64>) {
        for word in &mut self.words {
            if let Some(&offset) = offsets.get(&word.id) {
                word.offset = offset;
            }
        }
    }

    /// Persist as a length-prefixed record stream: for each word, a u32
    /// length-prefixed UTF-8 token followed by fixed-width id/count/offset
    /// fields. Sorted by id (equivalently, by token).
    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut prev: Option<&Word> = None;
        for w in &self.words {
            if let Some(p) = prev {
                debug_assert!(w.id > p.id, "lexicon not sorted by id");
                debug_assert!(w.token > p.token, "lexicon not sorted by token");
            }
            prev = Some(w);
        }

        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        w.write_all(&(self.words.len() as u32).to_le_bytes())?;
        for word in &self.words {
            w.write_all(&word.id.to_le_bytes())?;
            let token_bytes = word.token.as_bytes();
            w.write_all(&(token_bytes.len() as u32).to_le_bytes())?;
            w.write_all(token_bytes)?;
            w.write_all(&word.count.to_le_bytes())?;
            w.write_all(&word.offset.to_le_bytes())?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mut offset = 0usize;
        let read_u32 = |b: &[u8], o: usize| -> Result<u32> {
            let arr: [u8; 4] = b.get(o..o + 4).ok_or_else(|| {
                IndexError::MalformedInput {
                    path: path.display().to_string(),
                    reason: "truncated lexicon".to_string(),
                }
            })?.try_into().unwrap();
            Ok(u32::from_le_bytes(arr))
        };

        let count = read_u32(&bytes, offset)? as usize;
        offset += 4;
        let mut words = Vec::with_capacity(count);
        for _ in 0..count {
            let id = read_u32(&bytes, offset)?;
            offset += 4;
            let token_len = read_u32(&bytes, offset)? as usize;
            offset += 4;
            let token_bytes = bytes.get(offset..offset + token_len).ok_or_else(|| {
                IndexError::MalformedInput {
                    path: path.display().to_string(),
                    reason: "truncated token".to_string(),
                }
            })?;
            let token = String::from_utf8(token_bytes.to_vec()).map_err(|e| {
                IndexError::MalformedInput {
                    path: path.display().to_string(),
                    reason: format!("invalid utf8 token: {e}"),
                }
            })?;
            offset += token_len;
            let count_bytes: [u8; 8] = bytes
                .get(offset..offset + 8)
                .ok_or_else(|| IndexError::MalformedInput {
                    path: path.display().to_string(),
                    reason: "truncated count".to_string(),
                })?
                .try_into()
                .unwrap();
            let word_count = u64::from_le_bytes(count_bytes);
            offset += 8;
            let offset_bytes: [u8; 8] = bytes
                .get(offset..offset + 8)
                .ok_or_else(|| IndexError::MalformedInput {
                    path: path.display().to_string(),
                    reason: "truncated offset".to_string(),
                })?
                .try_into()
                .unwrap();
            let jump_offset = i64::from_le_bytes(offset_bytes);
            offset += 8;
            words.push(Word {
                id,
                token,
                count: word_count,
                offset: jump_offset,
            });
        }
        Ok(Self::from_words(words))
    }

    /// Human-readable variant kept for debugging and small fixtures, mirroring
    /// the document table's tab-separated text form. Not used by the build
    /// pipeline but handy in tests and the `inspect` CLI command.
    pub fn store_text(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        for word in &self.words {
            writeln!(w, "{}\t{}\t{}\t{}", word.id, word.token, word.count, word.offset)?;
        }
        Ok(())
    }

    pub fn load_text(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut words = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let mut parts = line.splitn(4, '\t');
            let malformed = || IndexError::MalformedInput {
                path: path.display().to_string(),
                reason: "expected id\\ttoken\\tcount\\toffset".to_string(),
            };
            let id: u32 = parts.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
            let token = parts.next().ok_or_else(malformed)?.to_string();
            let count: u64 = parts.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
            let offset: i64 = parts.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
            words.push(Word { id, token, count, offset });
        }
        Ok(Self::from_words(words))
    }
}
