// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! A compact, memory-mappable full-text index over time-stamped caption
//! corpora: for each token, the documents it appears in and, per
//! document, the token's ordinal position and spoken time interval.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌────────────┐
//! │ binary   │   │ lexicon  │   │ doctable   │   leaves: fixed-width codec,
//! │ (codec,  │   │ (token   │   │ (document  │   token<->id and doc<->id
//! │  blocks) │   │  <-> id) │   │  <-> id)   │   bijections
//! └────┬─────┘   └────┬─────┘   └─────┬──────┘
//!      │              │               │
//!      └──────┬───────┴───────┬───────┘
//!             ▼               ▼
//!        ┌─────────┐    ┌───────────┐
//!        │ build    │    │ merge     │   shard construction (parallel per
//!        │ ::shard  │───▶│           │   batch) feeds the external k-way
//!        └─────────┘    └─────┬─────┘   merge (parallel by token partition)
//!                              ▼
//!                        ┌───────────┐
//!                        │  index    │   memory-mapped reader: ngram_search,
//!                        │ (reader)  │   ngram_contains, document_length
//!                        └───────────┘
//! ```
//!
//! `build::run_build` is the top-level orchestrator tying these together;
//! `cli` is a thin driver around it and is not part of the core.
//!
//! # Non-goals
//!
//! No ranked retrieval, no fuzzy matching, no incremental updates after an
//! index seals, no cross-document phrase matching, and no tokenization —
//! captions arrive pre-split into `(start_ms, end_ms, tokens)` lines.

pub mod binary;
pub mod build;
pub mod cli;
pub mod contracts;
pub mod docstats;
pub mod doctable;
pub mod error;
pub mod index;
pub mod lexicon;
pub mod merge;

pub use error::{IndexError, Result};
