//! Command handlers; each returns the process exit code

use super::commands::{AnalyzeArgs, CacheArgs, CacheCommand};
use crate::cache::DiskCache;
use crate::config::{default_model, CitetraceConfig};
use crate::llm::select_llm_client;
use crate::output::{render, OutputFormat, Report};
use crate::pipeline::{AnalysisContext, PipelineContext, PipelineOrchestrator};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

pub async fn handle_analyze(args: &AnalyzeArgs, quiet: bool) -> i32 {
    match run_analyze(args).await {
        Ok((report, path)) => {
            if !quiet {
                print_summary(&report, &path);
            }
            0
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

async fn run_analyze(args: &AnalyzeArgs) -> Result<(Report, std::path::PathBuf)> {
    let config = apply_overrides(CitetraceConfig::load(), args);
    config.validate()?;
    info!("Configuration:\n{}", config);

    let selected = select_llm_client(&config)?;
    info!(client = %selected.description, "Analysis service ready");

    let pipeline = Arc::new(PipelineContext::from_config(config, selected.client));
    let mut context = AnalysisContext::new(pipeline, args.input.clone(), args.work_dir.clone());

    let report = PipelineOrchestrator::new().execute(&mut context).await?;

    let format = OutputFormat::from(args.format);
    let path = args.output_path();
    write_report(&report, format, &path)?;
    info!(path = %path.display(), %format, "Report written");

    Ok((report, path))
}

/// CLI flags win over environment values
pub fn apply_overrides(mut config: CitetraceConfig, args: &AnalyzeArgs) -> CitetraceConfig {
    if let Some(provider) = args.backend {
        if provider != config.provider && args.model.is_none() {
            config.model = default_model(provider);
        }
        config.provider = provider;
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout_secs = timeout;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = dir.clone();
    }
    if args.no_cache {
        config.cache_enabled = false;
    }
    config
}

fn write_report(report: &Report, format: OutputFormat, path: &Path) -> Result<()> {
    let rendered = render(report, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, rendered).with_context(|| format!("Failed to write {}", path.display()))
}

/// One line per entry: the sections it is cited in, or why there are none
pub fn format_summary(report: &Report) -> String {
    let mut lines = vec![format!("Paper: {}", report.title)];

    for record in &report.records {
        let detail = if let crate::analysis::RecordStatus::Failed { reason } = &record.status {
            format!("analysis failed ({})", reason)
        } else {
            let sections = record.cited_sections();
            if sections.is_empty() {
                "no citations".to_string()
            } else {
                sections.join(", ")
            }
        };
        lines.push(format!("  [{}] {}: {}", record.sequence_id, record.key, detail));
    }

    lines.push(format!(
        "{} entries, {} cited, {} failed",
        report.records.len(),
        report.cited_count(),
        report.failed_count()
    ));
    lines.join("\n")
}

fn print_summary(report: &Report, path: &Path) {
    println!("{}", format_summary(report));
    println!("Report: {}", path.display());
}

pub fn handle_cache(args: &CacheArgs) -> i32 {
    match &args.command {
        CacheCommand::Clear { cache_dir } => {
            let dir = cache_dir
                .clone()
                .unwrap_or_else(|| CitetraceConfig::load().cache_dir);

            if !dir.exists() {
                println!("Cache directory {} does not exist", dir.display());
                return 0;
            }

            match DiskCache::new(&dir).and_then(|cache| cache.clear()) {
                Ok(removed) => {
                    println!("Removed {} cached responses from {}", removed, dir.display());
                    0
                }
                Err(e) => {
                    eprintln!("Error: failed to clear {}: {}", dir.display(), e);
                    1
                }
            }
        }
    }
}
