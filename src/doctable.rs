// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Document table: a bijection between document names and dense ids.
//!
//! Ids are assigned by sorting document names at build time and are stable
//! for the lifetime of an index. Persisted as plain `id<TAB>name` text,
//! matching the flat structure used by the lexicon's text form.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{IndexError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct DocumentTable {
    docs: Vec<DocumentEntry>,
    by_name: HashMap<String, u32>,
}

impl DocumentTable {
    /// Build a table from document names, sorting names and assigning ids
    /// `[0, |D|)` in that order.
    pub fn from_names(mut names: Vec<String>) -> Self {
        names.sort();
        let docs = names
            .into_iter()
            .enumerate()
            .map(|(id, name)| DocumentEntry { id: id as u32, name })
            .collect();
        Self::from_entries(docs)
    }

    pub fn from_entries(docs: Vec<DocumentEntry>) -> Self {
        let by_name = docs.iter().map(|d| (d.name.clone(), d.id)).collect();
        DocumentTable { docs, by_name }
    }

    pub fn size(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentEntry> {
        self.docs.iter()
    }

    pub fn lookup_by_name(&self, name: &str) -> Result<u32> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| IndexError::UnknownToken(name.to_string()))
    }

    pub fn lookup_by_id(&self, id: u32) -> Result<&str> {
        self.docs
            .get(id as usize)
            .map(|d| d.name.as_str())
            .ok_or(IndexError::OutOfRange {
                id: id as u64,
                size: self.docs.len() as u64,
            })
    }

    /// One `id<TAB>name` per line, in id order.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        for d in &self.docs {
            writeln!(w, "{}\t{}", d.id, d.name)?;
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref)?;
        let reader = BufReader::new(file);
        let mut docs = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let (id_str, name) = line.split_once('\t').ok_or_else(|| IndexError::MalformedInput {
                path: path_ref.display().to_string(),
                reason: "expected id\\tname".to_string(),
            })?;
            let id: u32 = id_str.parse().map_err(|_| IndexError::MalformedInput {
                path: path_ref.display().to_string(),
                reason: format!("bad id: {id_str}"),
            })?;
            docs.push(DocumentEntry {
                id,
                name: name.to_string(),
            });
        }
        Ok(Self::from_entries(docs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_assigned_in_name_sorted_order() {
        let table = DocumentTable::from_names(vec!["B".into(), "A".into()]);
        assert_eq!(table.lookup_by_id(0).unwrap(), "A");
        assert_eq!(table.lookup_by_id(1).unwrap(), "B");
        assert_eq!(table.lookup_by_name("A").unwrap(), 0);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let table = DocumentTable::from_names(vec!["A".into()]);
        assert!(table.lookup_by_name("nope").is_err());
    }

    #[test]
    fn store_load_roundtrip() {
        let table = DocumentTable::from_names(vec!["B.srt".into(), "A.srt".into()]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.list");
        table.store(&path).unwrap();
        let loaded = DocumentTable::load(&path).unwrap();
        assert_eq!(loaded.size(), table.size());
        for (a, b) in table.iter().zip(loaded.iter()) {
            assert_eq!(a, b);
        }
    }
}
