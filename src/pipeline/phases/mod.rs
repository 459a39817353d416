// Pipeline phases, run in file order by the orchestrator

#[path = "01_extract.rs"]
pub mod extract;
#[path = "02_assemble.rs"]
pub mod assemble;
#[path = "03_bibliography.rs"]
pub mod bibliography;
#[path = "04_citations.rs"]
pub mod citations;
