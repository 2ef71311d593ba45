// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Binary format for capidx search indexes.
//!
//! The index file is a flat concatenation of per-token blocks, ordered by
//! increasing token id. Each block is a header (token id, doc count)
//! followed by per-document sub-blocks (doc id, posting count, posting
//! bytes). There is no file-level header, footer, or checksum: the format
//! is trusted build output, read back only by readers that were given the
//! same codec widths the writer used.
//!
//! ```text
//! repeat over tokens in ascending token_id:
//!   datum[D]          token_id
//!   datum[D]          n_docs          (>= 1)
//!   repeat n_docs:
//!     datum[D]        doc_id
//!     datum[D]        n_postings      (>= 1)
//!     repeat n_postings:
//!       datum[D]      position
//!       bytes[S]      start_ms        (little-endian)
//!       bytes[E]      duration_ms     (little-endian; end = start + duration)
//! ```
//!
//! Shard files (see [`crate::build::shard`]) use the same block layout,
//! restricted to a partition's token range and a batch's document ids.

pub mod codec;

pub use codec::CodecParams;

use crate::error::Result;

/// One occurrence of a token in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Posting {
    pub position: u64,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Posting {
    pub fn encoded_len(params: &CodecParams) -> usize {
        params.datum_bytes + params.time_interval_bytes()
    }

    pub fn encode(&self, params: &CodecParams, buf: &mut Vec<u8>) -> Result<()> {
        params.encode_datum(self.position, buf)?;
        params.encode_time(self.start_ms, self.end_ms, buf)?;
        Ok(())
    }

    pub fn decode(params: &CodecParams, bytes: &[u8]) -> Result<(Self, usize)> {
        let (position, n1) = params.decode_datum(bytes)?;
        let ((start_ms, end_ms), n2) = params.decode_time(&bytes[n1..])?;
        Ok((
            Posting {
                position,
                start_ms,
                end_ms,
            },
            n1 + n2,
        ))
    }
}

/// All postings for one document within a token block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocBlock {
    pub doc_id: u64,
    pub postings: Vec<Posting>,
}

impl DocBlock {
    pub fn encode(&self, params: &CodecParams, buf: &mut Vec<u8>) -> Result<()> {
        params.encode_datum(self.doc_id, buf)?;
        params.encode_datum(self.postings.len() as u64, buf)?;
        for p in &self.postings {
            p.encode(params, buf)?;
        }
        Ok(())
    }

    /// Decode one doc sub-block from the front of `bytes`. Returns the
    /// block and the number of bytes consumed.
    pub fn decode(params: &CodecParams, bytes: &[u8]) -> Result<(Self, usize)> {
        let (doc_id, mut offset) = params.decode_datum(bytes)?;
        let (n_postings, n) = params.decode_datum(&bytes[offset..])?;
        offset += n;
        let mut postings = Vec::with_capacity(n_postings as usize);
        for _ in 0..n_postings {
            let (p, n) = Posting::decode(params, &bytes[offset..])?;
            postings.push(p);
            offset += n;
        }
        Ok((DocBlock { doc_id, postings }, offset))
    }
}

/// All postings for one token, across documents, in doc-id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBlock {
    pub token_id: u64,
    pub docs: Vec<DocBlock>,
}

impl TokenBlock {
    pub fn encode(&self, params: &CodecParams, buf: &mut Vec<u8>) -> Result<()> {
        params.encode_datum(self.token_id, buf)?;
        params.encode_datum(self.docs.len() as u64, buf)?;
        for d in &self.docs {
            d.encode(params, buf)?;
        }
        Ok(())
    }

    /// Decode one token block from the front of `bytes`.
    pub fn decode(params: &CodecParams, bytes: &[u8]) -> Result<(Self, usize)> {
        let (token_id, mut offset) = params.decode_datum(bytes)?;
        let (n_docs, n) = params.decode_datum(&bytes[offset..])?;
        offset += n;
        let mut docs = Vec::with_capacity(n_docs as usize);
        for _ in 0..n_docs {
            let (d, n) = DocBlock::decode(params, &bytes[offset..])?;
            docs.push(d);
            offset += n;
        }
        Ok((TokenBlock { token_id, docs }, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> TokenBlock {
        TokenBlock {
            token_id: 7,
            docs: vec![
                DocBlock {
                    doc_id: 2,
                    postings: vec![Posting {
                        position: 0,
                        start_ms: 0,
                        end_ms: 2000,
                    }],
                },
                DocBlock {
                    doc_id: 5,
                    postings: vec![
                        Posting {
                            position: 1,
                            start_ms: 5000,
                            end_ms: 6500,
                        },
                        Posting {
                            position: 9,
                            start_ms: 9000,
                            end_ms: 9200,
                        },
                    ],
                },
            ],
        }
    }

    #[test]
    fn token_block_roundtrip() {
        let params = CodecParams::default();
        let block = sample_block();
        let mut buf = Vec::new();
        block.encode(&params, &mut buf).unwrap();
        let (decoded, consumed) = TokenBlock::decode(&params, &buf).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(consumed, buf.len());
    }
}
