//! Phase-based pipeline: extract, assemble, resolve the bibliography, analyze citations

pub mod context;
pub mod orchestrator;
pub mod phase_trait;
pub mod phases;

pub use context::{AnalysisContext, PipelineContext};
pub use orchestrator::PipelineOrchestrator;
pub use phase_trait::WorkflowPhase;
