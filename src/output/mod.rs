//! Report rendering
//!
//! Rendering is a pure function of the [`Report`]; writing it out is left to the CLI.

mod html;
pub mod schema;

pub use schema::Report;

use anyhow::{Context, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Html => Ok(html::render_html(report)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{EntryRecord, RecordStatus};
    use serde_json::Value;

    fn report() -> Report {
        Report {
            title: "Attention Is Enough".into(),
            generated_at: chrono::Utc::now(),
            records: vec![
                EntryRecord {
                    key: "a2020".into(),
                    sequence_id: 1,
                    title: "Foo".into(),
                    author: None,
                    source: None,
                    raw_content: "@article{a2020}".into(),
                    status: RecordStatus::Analyzed { citations: vec![] },
                },
                EntryRecord {
                    key: "b2021".into(),
                    sequence_id: 2,
                    title: "Bar".into(),
                    author: None,
                    source: None,
                    raw_content: "@article{b2021}".into(),
                    status: RecordStatus::Failed {
                        reason: "timeout".into(),
                    },
                },
            ],
        }
    }

    #[test]
    fn test_json_render() {
        let json: Value = serde_json::from_str(&render(&report(), OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["title"], "Attention Is Enough");
        assert_eq!(json["records"][0]["status"], "analyzed");
        assert_eq!(json["records"][1]["status"], "failed");
        assert_eq!(json["records"][1]["reason"], "timeout");
    }

    #[test]
    fn test_counts() {
        let report = report();
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.cited_count(), 0);
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(OutputFormat::default(), OutputFormat::Html);
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
