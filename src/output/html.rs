use super::Report;
use crate::analysis::{Citation, EntryRecord, RecordStatus};
use regex::Regex;
use std::fmt::Write;

const STYLESHEET: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, Arial, sans-serif; line-height: 1.6; color: #333; background: #f8f9fa; margin: 0; padding: 20px; }
.container { max-width: 900px; margin: 0 auto; background: #fff; padding: 2rem; border-radius: 8px; }
h1 { border-bottom: 2px solid #dee2e6; padding-bottom: 0.5rem; text-align: center; }
h1, h2, h3 { color: #0056b3; }
.reference-item { margin-bottom: 2rem; padding: 1.5rem; border: 1px solid #e9ecef; border-radius: 6px; }
blockquote { margin: 0; padding: 1rem; background: #f8f9fa; border-left: 5px solid #007bff; }
code { background: #e9ecef; color: #d63384; padding: 2px 4px; border-radius: 3px; }
.citation-context strong.cite { color: #d9534f; }
.failed { color: #c00; }
.footer { text-align: center; margin-top: 2rem; font-size: 0.9em; color: #6c757d; }
"#;

pub(super) fn render_html(report: &Report) -> String {
    let title = escape(&report.title);
    let mut out = String::new();

    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>Reference analysis - {title}</title>\n<style>{STYLESHEET}</style>\n</head>\n<body>\n\
         <div class=\"container\">\n<h1>Reference Context Analysis</h1>\n<h2>Paper: <em>{title}</em></h2>\n"
    );

    for record in &report.records {
        render_record(&mut out, record);
    }

    let _ = write!(
        out,
        "</div>\n<div class=\"footer\"><p>Generated at {}</p></div>\n</body>\n</html>\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out
}

fn render_record(out: &mut String, record: &EntryRecord) {
    let source = record.source.as_deref().unwrap_or(&record.raw_content);

    let _ = writeln!(out, "<div class=\"reference-item\" id=\"ref-{}\">", escape(&record.key));
    let _ = writeln!(out, "<h3>[{}] <code>{}</code></h3>", record.sequence_id, escape(&record.key));
    let _ = writeln!(
        out,
        "<blockquote>\n<p><strong>Author:</strong> {}</p>\n<p><strong>Title:</strong> {}</p>\n<p><strong>Source:</strong> {}</p>\n</blockquote>",
        escape(record.author.as_deref().unwrap_or("not available")),
        escape(&record.title),
        escape(source)
    );
    out.push_str("<h4>Citations</h4>\n");

    match &record.status {
        RecordStatus::Failed { reason } => {
            let _ = writeln!(
                out,
                "<p class=\"failed\"><em>Analysis failed: {}</em></p>",
                escape(reason)
            );
        }
        RecordStatus::Analyzed { citations } if citations.is_empty() => {
            out.push_str("<p><em>No citations found in the body text.</em></p>\n");
        }
        RecordStatus::Analyzed { citations } => {
            out.push_str("<ul>\n");
            for (i, citation) in citations.iter().enumerate() {
                render_citation(out, i + 1, citation, &record.key);
            }
            out.push_str("</ul>\n");
        }
    }

    out.push_str("</div>\n");
}

fn render_citation(out: &mut String, position: usize, citation: &Citation, key: &str) {
    let section = if citation.section.trim().is_empty() {
        "Unknown section"
    } else {
        &citation.section
    };

    let _ = writeln!(
        out,
        "<li><strong>Occurrence {position}:</strong>\n<ul class=\"citation-context\">\n\
         <li><strong>Section:</strong> {}</li>\n<li><strong>Before:</strong> {}</li>\n\
         <li><strong>Sentence:</strong> {}</li>\n<li><strong>After:</strong> {}</li>\n</ul>\n</li>",
        escape(section),
        escape(&citation.pre_context),
        highlight_citations(&escape(&citation.citation_sentence), key),
        escape(&citation.post_context)
    );
}

/// Wraps citation commands naming `key` in `<strong class="cite">`; `text` is already escaped
fn highlight_citations(text: &str, key: &str) -> String {
    let pattern = format!(
        r"(\\(?:cite|citep|citet|Citep|Citet|citealt|citealp|parencite|textcite|autocite)\*?(?:\[[^\]]*\])*\{{[^}}]*?{}[^}}]*?\}})",
        regex::escape(&escape(key))
    );
    match Regex::new(&pattern) {
        Ok(re) => re
            .replace_all(text, r#"<strong class="cite">$1</strong>"#)
            .into_owned(),
        Err(_) => text.to_string(),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
