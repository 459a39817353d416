//! Pipeline context for managing dependencies and run state

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use crate::analysis::{RecordSet, ServiceGateway};
use crate::bibliography::BibEntry;
use crate::cache::{CacheStore, DiskCache, NoopCache};
use crate::config::CitetraceConfig;
use crate::diagnostics::FailureLog;
use crate::latex::AssembledDocument;
use crate::llm::LLMClient;
use crate::progress::{LoggingHandler, ProgressHandler};

/// Context that owns all long-lived pipeline dependencies
pub struct PipelineContext {
    pub config: CitetraceConfig,

    /// Shared cache → call → decode path used by every analysis task
    pub gateway: Arc<ServiceGateway>,

    pub progress: Arc<dyn ProgressHandler>,
}

impl PipelineContext {
    pub fn new(
        config: CitetraceConfig,
        client: Arc<dyn LLMClient>,
        cache: Arc<dyn CacheStore>,
        progress: Arc<dyn ProgressHandler>,
    ) -> Self {
        let gateway = ServiceGateway::new(client, cache)
            .with_failure_log(FailureLog::new(config.failure_log.clone()))
            .with_max_tokens(config.max_tokens);

        Self {
            config,
            gateway: Arc::new(gateway),
            progress,
        }
    }

    /// Builds the cache the configuration asks for and logs progress through tracing
    pub fn from_config(config: CitetraceConfig, client: Arc<dyn LLMClient>) -> Self {
        let cache = open_cache(&config);
        Self::new(config, client, cache, Arc::new(LoggingHandler))
    }
}

/// Disk cache when enabled; an unusable cache directory degrades to no caching
pub fn open_cache(config: &CitetraceConfig) -> Arc<dyn CacheStore> {
    if !config.cache_enabled {
        info!("Response cache disabled");
        return Arc::new(NoopCache);
    }

    match DiskCache::new(&config.cache_dir) {
        Ok(cache) => {
            info!(dir = %config.cache_dir.display(), "Using response cache");
            Arc::new(cache)
        }
        Err(e) => {
            warn!(
                dir = %config.cache_dir.display(),
                error = %e,
                "Cannot open cache directory, continuing without cache"
            );
            Arc::new(NoopCache)
        }
    }
}

/// State accumulated by the phases of one run
pub struct AnalysisContext {
    pub pipeline: Arc<PipelineContext>,

    /// Directory or archive given by the user
    pub input: PathBuf,

    /// Where archives are extracted
    pub work_dir: PathBuf,

    pub project_root: Option<PathBuf>,
    pub document: Option<AssembledDocument>,
    pub entries: Vec<BibEntry>,
    pub records: Option<RecordSet>,
}

impl AnalysisContext {
    pub fn new(pipeline: Arc<PipelineContext>, input: PathBuf, work_dir: PathBuf) -> Self {
        Self {
            pipeline,
            input,
            work_dir,
            project_root: None,
            document: None,
            entries: Vec::new(),
            records: None,
        }
    }

    pub fn document(&self) -> Result<&AssembledDocument> {
        self.document
            .as_ref()
            .ok_or_else(|| anyhow!("Document has not been assembled"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLLMClient;
    use tempfile::TempDir;

    #[test]
    fn test_disabled_cache_is_noop() {
        let config = CitetraceConfig {
            cache_enabled: false,
            ..CitetraceConfig::default()
        };
        assert_eq!(open_cache(&config).name(), "noop");
    }

    #[test]
    fn test_enabled_cache_creates_directory() {
        let dir = TempDir::new().unwrap();
        let config = CitetraceConfig {
            cache_enabled: true,
            cache_dir: dir.path().join("cache"),
            ..CitetraceConfig::default()
        };

        assert_eq!(open_cache(&config).name(), "disk");
        assert!(dir.path().join("cache").is_dir());
    }

    #[test]
    fn test_context_starts_empty() {
        let pipeline = PipelineContext::from_config(
            CitetraceConfig {
                cache_enabled: false,
                ..CitetraceConfig::default()
            },
            Arc::new(MockLLMClient::new()),
        );
        let context = AnalysisContext::new(Arc::new(pipeline), "paper".into(), "data".into());

        assert!(context.document().is_err());
        assert!(context.entries.is_empty());
        assert!(context.records.is_none());
    }
}
