//! citetrace - LLM-assisted citation context analysis for LaTeX papers
//!
//! Given a paper's source tree (or an archive of it), citetrace assembles the
//! multi-file LaTeX project into one document, resolves the bibliography and asks a
//! language model, once per entry and concurrently, where and how each reference is
//! cited. Results are merged into a [`RecordSet`] ordered by bibliography position and
//! rendered as an HTML or JSON report.
//!
//! # Core Concepts
//!
//! - **Assembly**: entry-file discovery and recursive `\input`/`\include` expansion
//!   ([`latex`])
//! - **Bibliography resolution**: `.bib` files first, then `thebibliography` blocks
//!   parsed by the model ([`bibliography`])
//! - **Response cache**: SHA-256 keyed, content addressable, shared by every task
//!   ([`cache`])
//! - **Analysis**: one isolated task per entry; a failing entry is recorded, never
//!   fatal ([`analysis`])
//!
//! # Example Usage
//!
//! ```ignore
//! use citetrace::pipeline::{AnalysisContext, PipelineContext, PipelineOrchestrator};
//! use citetrace::{select_llm_client, CitetraceConfig};
//! use std::sync::Arc;
//!
//! async fn analyze() -> anyhow::Result<()> {
//!     let config = CitetraceConfig::load();
//!     let client = select_llm_client(&config)?.client;
//!     let pipeline = Arc::new(PipelineContext::from_config(config, client));
//!
//!     let mut context = AnalysisContext::new(pipeline, "paper/".into(), "data".into());
//!     let report = PipelineOrchestrator::new().execute(&mut context).await?;
//!
//!     for record in &report.records {
//!         println!("{}: {:?}", record.key, record.cited_sections());
//!     }
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod archive;
pub mod bibliography;
pub mod cache;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod latex;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod repair;
pub mod util;

pub use analysis::{AnalysisOutcome, AnalysisResult, Citation, EntryRecord, RecordSet};
pub use bibliography::BibEntry;
pub use config::{CitetraceConfig, ConfigError};
pub use error::{BackendError, PipelineError};
pub use latex::AssembledDocument;
pub use llm::{select_llm_client, LLMClient};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
