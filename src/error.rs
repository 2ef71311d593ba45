// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Error types for the caption index.
//!
//! One enum, one variant per failure mode the build and query paths can hit.
//! `UnknownToken`/`OutOfRange` are query-time lookup misses, not bugs — callers
//! are expected to match on them. `IntegrityError`/`EncodingOverflow` mean the
//! corpus or the build pipeline did something the format can't represent;
//! these are fatal during a build. `IndexClosed` guards the reader state
//! machine (see `index::IndexReader`).

use std::io;

use thiserror::Error;

/// Errors produced by lexicon, document table, shard, merge, and reader operations.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("unknown token: {0:?}")]
    UnknownToken(String),

    #[error("id {id} out of range [0, {size})")]
    OutOfRange { id: u64, size: u64 },

    #[error("malformed input in {path}: {reason}")]
    MalformedInput { path: String, reason: String },

    #[error("encoding overflow: {value} does not fit in {bytes} byte(s)")]
    EncodingOverflow { value: u64, bytes: usize },

    #[error("integrity error: {0}")]
    IntegrityError(String),

    #[error("operation attempted on a closed index")]
    IndexClosed,

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;
