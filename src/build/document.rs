// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Document input format for the build pipeline.
//!
//! Subtitle parsing and tokenization are external collaborators: by the
//! time a document reaches this crate, captions have already been split
//! into `(start_ms, end_ms)` lines and each line's text has already been
//! tokenized. A [`CaptionDocument`] is that pre-tokenized representation,
//! serialized as JSON on disk so the build tool can consume the output of
//! any upstream tokenizer without linking against it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// One caption line: a time interval and the tokens spoken during it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CaptionLine {
    pub start_ms: u64,
    pub end_ms: u64,
    pub tokens: Vec<String>,
}

/// A single document: a name (used to assign its document id) and its
/// ordered caption lines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CaptionDocument {
    pub name: String,
    pub lines: Vec<CaptionLine>,
}

impl CaptionDocument {
    /// Total token count across all lines, before any clamping or
    /// lexicon lookup. This is the document's length `N` per the data
    /// model: positions occupy `[0, N)`.
    pub fn token_count(&self) -> usize {
        self.lines.iter().map(|l| l.tokens.len()).sum()
    }

    pub fn from_json_str(name: &str, text: &str) -> Result<Self> {
        let mut doc: CaptionDocument =
            serde_json::from_str(text).map_err(|e| IndexError::MalformedInput {
                path: name.to_string(),
                reason: e.to_string(),
            })?;
        if doc.name.is_empty() {
            doc.name = name.to_string();
        }
        Ok(doc)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        Self::from_json_str(stem, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document() {
        let json = r#"{
            "name": "A.srt",
            "lines": [
                {"start_ms": 0, "end_ms": 2000, "tokens": ["UNITED", "STATES"]}
            ]
        }"#;
        let doc = CaptionDocument::from_json_str("A.srt", json).unwrap();
        assert_eq!(doc.name, "A.srt");
        assert_eq!(doc.token_count(), 2);
    }

    #[test]
    fn malformed_json_is_reported_with_document_name() {
        let err = CaptionDocument::from_json_str("bad.srt", "not json").unwrap_err();
        match err {
            IndexError::MalformedInput { path, .. } => assert_eq!(path, "bad.srt"),
            other => panic!("expected MalformedInput, got {other:?}"),
        }
    }
}
