//! Report data handed to the renderers

use crate::analysis::{EntryRecord, RecordSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub records: Vec<EntryRecord>,
}

impl Report {
    pub fn new(title: impl Into<String>, records: RecordSet) -> Self {
        Self {
            title: title.into(),
            generated_at: Utc::now(),
            records: records.into_records(),
        }
    }

    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_failed()).count()
    }

    /// Entries with at least one citation
    pub fn cited_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !r.citations().is_empty())
            .count()
    }
}
