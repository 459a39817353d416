use crate::analysis::ReferenceParser;
use crate::bibliography::BibliographyResolver;
use crate::error::PipelineError;
use crate::pipeline::context::AnalysisContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Produces the deduplicated, numbered entry list
pub struct BibliographyPhase;

#[async_trait]
impl WorkflowPhase for BibliographyPhase {
    fn name(&self) -> &'static str {
        "BibliographyPhase"
    }

    async fn execute(&self, context: &mut AnalysisContext) -> Result<()> {
        let pipeline = context.pipeline.clone();
        let parser = ReferenceParser::new(pipeline.gateway.clone())
            .with_concurrency(pipeline.config.concurrency)
            .with_progress(pipeline.progress.clone());
        let resolver = BibliographyResolver::standard(Arc::new(parser));

        let entries = resolver
            .resolve(context.document()?)
            .await
            .map_err(PipelineError::from)?;

        context.entries = entries;
        Ok(())
    }
}
