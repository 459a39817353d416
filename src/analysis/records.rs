use super::{AnalysisOutcome, Citation};
use crate::bibliography::{BibEntry, TITLE_NOT_FOUND};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

const NOT_ANALYZED: &str = "not analyzed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordStatus {
    Analyzed { citations: Vec<Citation> },
    Failed { reason: String },
}

/// Render-ready view of one bibliography entry after analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub key: String,
    pub sequence_id: usize,
    pub title: String,
    pub author: Option<String>,
    pub source: Option<String>,
    pub raw_content: String,
    #[serde(flatten)]
    pub status: RecordStatus,
}

impl EntryRecord {
    /// Merges the entry's own fields with what the service inferred
    ///
    /// Bibliography data wins; inferred values only fill gaps. An entry without an
    /// outcome is recorded as failed.
    pub fn from_entry(entry: BibEntry) -> Self {
        let mut title = entry.inferred_title;
        let mut author = entry.inferred_author;
        let mut source = None;

        let status = match entry.analysis {
            Some(AnalysisOutcome::Succeeded(result)) => {
                if title == TITLE_NOT_FOUND {
                    if let Some(inferred) = result.inferred_title {
                        title = inferred;
                    }
                }
                author = author.or(result.inferred_author);
                source = result.inferred_source;
                RecordStatus::Analyzed {
                    citations: result.citations,
                }
            }
            Some(AnalysisOutcome::Failed { reason }) => RecordStatus::Failed { reason },
            None => {
                warn!(key = %entry.key, "Entry reached merge without analysis");
                RecordStatus::Failed {
                    reason: NOT_ANALYZED.to_string(),
                }
            }
        };

        Self {
            key: entry.key,
            sequence_id: entry.sequence_id,
            title,
            author,
            source,
            raw_content: entry.raw_content,
            status,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, RecordStatus::Failed { .. })
    }

    pub fn citations(&self) -> &[Citation] {
        match &self.status {
            RecordStatus::Analyzed { citations } => citations,
            RecordStatus::Failed { .. } => &[],
        }
    }

    /// Distinct section names this entry is cited in, sorted
    pub fn cited_sections(&self) -> Vec<String> {
        self.citations()
            .iter()
            .map(|c| c.section.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Analysis records ordered by sequence id, indexed by key
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<EntryRecord>,
    index: HashMap<String, usize>,
}

impl RecordSet {
    /// Builds the set in `sequence_id` order, whatever order `entries` arrive in
    pub fn from_entries(entries: Vec<BibEntry>) -> Self {
        let mut records: Vec<EntryRecord> = entries.into_iter().map(EntryRecord::from_entry).collect();
        records.sort_by_key(|r| r.sequence_id);

        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key.clone(), i))
            .collect();

        Self { records, index }
    }

    pub fn get(&self, key: &str) -> Option<&EntryRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[EntryRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntryRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_failed()).count()
    }

    pub fn into_records(self) -> Vec<EntryRecord> {
        self.records
    }
}
