use crate::analysis::CitationAnalyzer;
use crate::pipeline::context::AnalysisContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use anyhow::Result;
use async_trait::async_trait;

/// Runs one analysis per entry and merges the outcomes
pub struct CitationPhase;

#[async_trait]
impl WorkflowPhase for CitationPhase {
    fn name(&self) -> &'static str {
        "CitationPhase"
    }

    async fn execute(&self, context: &mut AnalysisContext) -> Result<()> {
        let pipeline = context.pipeline.clone();
        let analyzer = CitationAnalyzer::new(pipeline.gateway.clone())
            .with_concurrency(pipeline.config.concurrency)
            .with_progress(pipeline.progress.clone());

        let entries = std::mem::take(&mut context.entries);
        let records = analyzer.analyze_all(context.document()?, entries).await;

        context.records = Some(records);
        Ok(())
    }
}
