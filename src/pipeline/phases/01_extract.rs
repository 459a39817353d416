use crate::archive::extract_archive;
use crate::error::PipelineError;
use crate::pipeline::context::AnalysisContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// Resolves the project root: a directory is used in place, an archive is unpacked
pub struct ExtractPhase;

#[async_trait]
impl WorkflowPhase for ExtractPhase {
    fn name(&self) -> &'static str {
        "ExtractPhase"
    }

    async fn execute(&self, context: &mut AnalysisContext) -> Result<()> {
        let input = context.input.clone();

        if input.is_dir() {
            debug!(root = %input.display(), "Input is a directory, analyzing in place");
            context.project_root = Some(input);
            return Ok(());
        }

        if !input.exists() {
            return Err(PipelineError::InputNotFound(input).into());
        }

        let work_dir = context.work_dir.clone();
        let root = tokio::task::spawn_blocking(move || extract_archive(&input, &work_dir))
            .await
            .context("Archive extraction task panicked")?
            .map_err(PipelineError::from)?;

        info!(root = %root.display(), "Sources extracted");
        context.project_root = Some(root);
        Ok(())
    }
}
