//! Per-entry citation analysis
//!
//! Every service call goes through [`ServiceGateway`]: cache lookup, call on miss,
//! strict decode, one repair pass. [`CitationAnalyzer`] fans out one request per
//! bibliography entry and merges the outcomes into a [`RecordSet`];
//! [`ReferenceParser`] does the same per `\bibitem` block.

mod citations;
mod gateway;
pub mod prompts;
mod records;
mod references;

pub use citations::{CitationAnalyzer, CITATION_CONTEXT_VERSION, DEFAULT_CONCURRENCY};
pub use gateway::{decode_response, GatewayResponse, ServiceGateway};
pub use records::{EntryRecord, RecordSet, RecordStatus};
pub use references::{ReferenceParser, REFERENCE_PARSE_VERSION};

use crate::error::BackendError;
use crate::util::deserialize_null_default;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One place where a reference is cited
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub section: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub pre_context: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub citation_sentence: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub post_context: String,
}

/// Successful analysis of one entry; an empty citation list is a valid result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub citations: Vec<Citation>,
    pub inferred_title: Option<String>,
    pub inferred_author: Option<String>,
    pub inferred_source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Succeeded(AnalysisResult),
    Failed { reason: String },
}

impl AnalysisOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, AnalysisOutcome::Failed { .. })
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis service error: {0}")]
    Service(#[from] BackendError),

    #[error("response could not be decoded: {message}")]
    DecodeFailed { message: String },
}
