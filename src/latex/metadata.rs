use super::tokenizer::{latex_to_text, scan_macros};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

const METADATA_MACROS: [&str; 3] = ["title", "bibliography", "addbibresource"];

fn title_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\title\s*(?:\[[^\]]*\])?\s*\{((?:[^{}]|\{(?:[^{}]|\{[^{}]*\})*\})*)\}")
            .expect("valid regex")
    })
}

fn bibliography_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\(?:bibliography|addbibresource)\s*(?:\[[^\]]*\])?\s*\{([^}]+)\}")
            .expect("valid regex")
    })
}

/// Title and bibliography declarations of an assembled document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    /// Declared bibliography names in declaration order, without duplicates
    pub bibliography_sources: Vec<String>,
}

impl DocumentMetadata {
    /// Structural pass over one piece of source text
    pub fn scan(&mut self, text: &str) {
        for call in scan_macros(text, &METADATA_MACROS) {
            match call.name.as_str() {
                "title" => {
                    if self.title.is_none() {
                        let title = latex_to_text(&call.argument);
                        if !title.is_empty() {
                            self.title = Some(title);
                        }
                    }
                }
                _ => self.add_sources(&call.argument),
            }
        }
    }

    /// Pattern pass over the full document for every field the structural pass missed
    pub fn fill_from_patterns(&mut self, content: &str) {
        if self.title.is_none() {
            match title_pattern().captures(content) {
                Some(caps) => {
                    let title = latex_to_text(&caps[1]);
                    if !title.is_empty() {
                        debug!(title = %title, "Title recovered by pattern scan");
                        self.title = Some(title);
                    }
                }
                None => warn!("No \\title found in document"),
            }
        }

        if self.bibliography_sources.is_empty() {
            for caps in bibliography_pattern().captures_iter(content) {
                self.add_sources(&caps[1]);
            }
            if !self.bibliography_sources.is_empty() {
                debug!(
                    sources = ?self.bibliography_sources,
                    "Bibliography sources recovered by pattern scan"
                );
            }
        }
    }

    fn add_sources(&mut self, argument: &str) {
        for name in argument.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if !self.bibliography_sources.iter().any(|s| s == name) {
                self.bibliography_sources.push(name.to_string());
            }
        }
    }
}
