//! Bibliography resolution
//!
//! Entries come from the first strategy that produces any: declared `.bib` files
//! ([`BibFileStrategy`]) are trusted over `thebibliography` text parsed by the
//! analysis service ([`BibItemStrategy`]).

mod bib_file;
mod bib_item;
mod bibtex;
mod resolver;

pub use bib_file::{find_bib_file, BibFileStrategy};
pub use bib_item::{find_bibliography_region, split_bibitems, BibItemStrategy};
pub use bibtex::{parse_bibtex, BibtexEntry};
pub use resolver::{BibliographyResolver, BibliographyStrategy, ReferenceBlockParser};

use crate::analysis::AnalysisOutcome;
use crate::util::deserialize_null_default;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

pub const TITLE_NOT_FOUND: &str = "Title not found";

#[derive(Debug, Error)]
pub enum BibliographyError {
    #[error("No bibliography found: {0}")]
    NoBibliographyFound(String),
}

/// One reference of the paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibEntry {
    pub key: String,
    pub inferred_title: String,
    pub inferred_author: Option<String>,
    /// Verbatim source text of the entry
    pub raw_content: String,
    /// 1-based position in discovery order
    pub sequence_id: usize,
    pub analysis: Option<AnalysisOutcome>,
}

impl BibEntry {
    pub fn new(key: impl Into<String>, title: impl Into<String>, raw_content: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            inferred_title: title.into(),
            inferred_author: None,
            raw_content: raw_content.into(),
            sequence_id: 0,
            analysis: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.inferred_author = Some(author.into());
        self
    }
}

/// A reference as returned by the service in reference-parse mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedReference {
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub key: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub content: String,
}

/// Drops every entry whose key was already seen; the first occurrence wins
pub fn dedup_by_key(entries: Vec<BibEntry>) -> Vec<BibEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            let first = seen.insert(entry.key.clone());
            if !first {
                debug!(key = %entry.key, "Dropping duplicate bibliography entry");
            }
            first
        })
        .collect()
}

/// Numbers entries 1..=n in their current order
pub fn assign_sequence_ids(entries: &mut [BibEntry]) {
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.sequence_id = i + 1;
    }
}
