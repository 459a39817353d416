use super::gateway::ServiceGateway;
use super::prompts::{citation_context_message, citation_context_prompt};
use super::records::RecordSet;
use super::{AnalysisError, AnalysisOutcome, AnalysisResult, Citation};
use crate::bibliography::BibEntry;
use crate::latex::AssembledDocument;
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::util::deserialize_null_default;
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Bump whenever the extraction prompt or response shape changes
pub const CITATION_CONTEXT_VERSION: &str = "citation-context/v1";
pub const DEFAULT_CONCURRENCY: usize = 16;
const EXTRACTION_TEMPERATURE: f32 = 0.1;

#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    #[serde(deserialize_with = "deserialize_null_default")]
    analysis_results: Vec<EntryAnalysis>,
}

#[derive(Debug, Deserialize)]
struct EntryAnalysis {
    #[serde(default, deserialize_with = "deserialize_null_default")]
    key: String,
    #[serde(default)]
    inferred_author: Option<String>,
    #[serde(default)]
    inferred_title: Option<String>,
    #[serde(default)]
    inferred_source: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    citations: Vec<Citation>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<EntryAnalysis> for AnalysisResult {
    fn from(analysis: EntryAnalysis) -> Self {
        Self {
            citations: analysis.citations,
            inferred_title: non_empty(analysis.inferred_title),
            inferred_author: non_empty(analysis.inferred_author),
            inferred_source: non_empty(analysis.inferred_source),
        }
    }
}

/// Picks the record for `key`, or the only record when the service returned one
fn select_record(response: ExtractionResponse, key: &str) -> AnalysisResult {
    let mut records = response.analysis_results;
    if let Some(pos) = records.iter().position(|r| r.key.trim() == key) {
        return records.swap_remove(pos).into();
    }
    if records.len() == 1 {
        if let Some(only) = records.pop() {
            debug!(key, returned = %only.key, "Using sole analysis record");
            return only.into();
        }
    }
    debug!(key, records = records.len(), "No analysis record for entry, assuming no citations");
    AnalysisResult::default()
}

fn key_payload(model: Option<String>, document: &str, entry: &BibEntry) -> Value {
    json!({
        "version": CITATION_CONTEXT_VERSION,
        "model": model,
        "document": document,
        "entry": entry_payload(entry),
    })
}

fn entry_payload(entry: &BibEntry) -> Value {
    json!({
        "key": entry.key,
        "title": entry.inferred_title,
        "author": entry.inferred_author,
        "content": entry.raw_content,
    })
}

/// Finds where each bibliography entry is cited, one service request per entry
pub struct CitationAnalyzer {
    gateway: Arc<ServiceGateway>,
    concurrency: usize,
    progress: Option<Arc<dyn ProgressHandler>>,
}

impl CitationAnalyzer {
    pub fn new(gateway: Arc<ServiceGateway>) -> Self {
        Self {
            gateway,
            concurrency: DEFAULT_CONCURRENCY,
            progress: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress = Some(handler);
        self
    }

    /// Analyzes every entry concurrently and merges the outcomes
    ///
    /// Each task owns its entry and hands it back with the outcome set. A failing
    /// entry is recorded as failed; it never cancels or delays the others.
    pub async fn analyze_all(&self, document: &AssembledDocument, entries: Vec<BibEntry>) -> RecordSet {
        let total = entries.len();
        let completed = AtomicUsize::new(0);
        let content: &str = &document.content;
        let completed_ref = &completed;

        info!(entries = total, concurrency = self.concurrency, "Analyzing citations");

        let analyzed: Vec<BibEntry> = stream::iter(entries)
            .map(|entry| async move {
                let (entry, cache_hit) = self.analyze_entry(content, entry).await;
                let done = completed_ref.fetch_add(1, Ordering::SeqCst) + 1;
                self.emit(&entry, done, total, cache_hit);
                entry
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let records = RecordSet::from_entries(analyzed);
        info!(
            entries = records.len(),
            failed = records.failed_count(),
            "Citation analysis complete"
        );
        records
    }

    async fn analyze_entry(&self, document: &str, mut entry: BibEntry) -> (BibEntry, bool) {
        let (outcome, cache_hit) = match self.request(document, &entry).await {
            Ok((result, cache_hit)) => (AnalysisOutcome::Succeeded(result), cache_hit),
            Err(e) => {
                warn!(key = %entry.key, error = %e, "Entry analysis failed");
                (
                    AnalysisOutcome::Failed {
                        reason: e.to_string(),
                    },
                    false,
                )
            }
        };
        entry.analysis = Some(outcome);
        (entry, cache_hit)
    }

    async fn request(
        &self,
        document: &str,
        entry: &BibEntry,
    ) -> Result<(AnalysisResult, bool), AnalysisError> {
        let payload = key_payload(self.gateway.model(), document, entry);
        let entry_json = serde_json::to_string_pretty(&entry_payload(entry))
            .unwrap_or_else(|_| entry.key.clone());

        let response = self
            .gateway
            .request::<ExtractionResponse>(
                "citation-context",
                &entry.key,
                &payload,
                citation_context_prompt(&entry.key),
                citation_context_message(document, &entry_json),
                EXTRACTION_TEMPERATURE,
            )
            .await?;

        Ok((select_record(response.value, &entry.key), response.cache_hit))
    }

    fn emit(&self, entry: &BibEntry, completed: usize, total: usize, cache_hit: bool) {
        if let Some(handler) = &self.progress {
            handler.on_progress(&ProgressEvent::EntryAnalyzed {
                key: entry.key.clone(),
                completed,
                total,
                cache_hit,
                success: !entry.analysis.as_ref().is_some_and(|a| a.is_failed()),
            });
        }
    }
}
