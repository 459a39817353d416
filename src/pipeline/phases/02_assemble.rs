use crate::error::PipelineError;
use crate::latex::{AssembledDocument, Assembler, LatexProject};
use crate::pipeline::context::AnalysisContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::{info, warn};

/// Finds the entry file and inlines every include into one document
pub struct AssemblePhase;

#[async_trait]
impl WorkflowPhase for AssemblePhase {
    fn name(&self) -> &'static str {
        "AssemblePhase"
    }

    async fn execute(&self, context: &mut AnalysisContext) -> Result<()> {
        let root = context
            .project_root
            .clone()
            .ok_or_else(|| anyhow!("Project root has not been resolved"))?;

        let document = tokio::task::spawn_blocking(move || assemble_project(&root))
            .await
            .context("Assembly task panicked")??;

        for missing in &document.missing_includes {
            warn!(include = %missing, "Included file not found");
        }
        info!(
            entry = %document.entry_file.display(),
            files = document.processed_files.len(),
            title = document.title_or_unknown(),
            bibliographies = document.bibliography_sources.len(),
            "Document assembled"
        );

        context.document = Some(document);
        Ok(())
    }
}

fn assemble_project(root: &Path) -> Result<AssembledDocument, PipelineError> {
    let project = LatexProject::open(root)?;
    let entry = project.entry_file_or_first()?;
    Ok(Assembler::new(&project).assemble(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NoopCache;
    use crate::config::CitetraceConfig;
    use crate::llm::MockLLMClient;
    use crate::pipeline::PipelineContext;
    use crate::progress::NoOpHandler;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(root: Option<&Path>) -> AnalysisContext {
        let pipeline = PipelineContext::new(
            CitetraceConfig::default(),
            Arc::new(MockLLMClient::new()),
            Arc::new(NoopCache),
            Arc::new(NoOpHandler),
        );
        let mut context = AnalysisContext::new(Arc::new(pipeline), "in".into(), "work".into());
        context.project_root = root.map(Path::to_path_buf);
        context
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_assembles_project_root() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("main.tex"),
            "\\documentclass{article}\n\\title{T}\n\\input{body}\n",
        )
        .unwrap();
        fs::write(dir.path().join("body.tex"), "BODY").unwrap();

        let mut context = context(Some(dir.path()));
        AssemblePhase.execute(&mut context).await.unwrap();

        let document = context.document().unwrap();
        assert!(document.content.contains("BODY"));
        assert_eq!(document.title.as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn test_empty_project_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut context = context(Some(dir.path()));
        assert!(AssemblePhase.execute(&mut context).await.is_err());
        assert!(context.document.is_none());
    }
}
