use super::context::AnalysisContext;
use super::phase_trait::WorkflowPhase;
use super::phases::{
    assemble::AssemblePhase, bibliography::BibliographyPhase, citations::CitationPhase,
    extract::ExtractPhase,
};
use crate::output::Report;
use crate::progress::ProgressEvent;
use anyhow::{anyhow, Context, Result};
use std::time::Instant;
use tracing::{debug, info};

pub struct PipelineOrchestrator {
    phases: Vec<Box<dyn WorkflowPhase>>,
}

impl Default for PipelineOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineOrchestrator {
    pub fn new() -> Self {
        Self {
            phases: vec![
                Box::new(ExtractPhase),
                Box::new(AssemblePhase),
                Box::new(BibliographyPhase),
                Box::new(CitationPhase),
            ],
        }
    }

    pub fn phase_names(&self) -> Vec<&'static str> {
        self.phases.iter().map(|p| p.name()).collect()
    }

    pub async fn execute(&self, context: &mut AnalysisContext) -> Result<Report> {
        let progress = context.pipeline.progress.clone();
        let start = Instant::now();
        info!("Starting pipeline for: {}", context.input.display());

        progress.on_progress(&ProgressEvent::Started {
            input: context.input.display().to_string(),
        });

        for phase in &self.phases {
            let phase_name = phase.name();
            progress.on_progress(&ProgressEvent::PhaseStarted {
                phase: phase_name.to_string(),
            });

            let phase_start = Instant::now();
            if let Err(e) = phase
                .execute(context)
                .await
                .with_context(|| format!("Phase {} failed", phase_name))
            {
                progress.on_progress(&ProgressEvent::Failed {
                    error: format!("{:#}", e),
                });
                return Err(e);
            }

            progress.on_progress(&ProgressEvent::PhaseComplete {
                phase: phase_name.to_string(),
                duration: phase_start.elapsed(),
            });
            debug!("Phase {} complete", phase_name);
        }

        let records = context
            .records
            .take()
            .ok_or_else(|| anyhow!("Pipeline finished without records"))?;
        let report = Report::new(context.document()?.title_or_unknown(), records);

        progress.on_progress(&ProgressEvent::Completed {
            entries: report.records.len(),
            failed: report.failed_count(),
            total_time: start.elapsed(),
        });
        info!(
            entries = report.records.len(),
            failed = report.failed_count(),
            "Pipeline complete"
        );

        Ok(report)
    }
}
