use super::resolver::{BibliographyStrategy, ReferenceBlockParser};
use super::{dedup_by_key, BibEntry, BibliographyError, TITLE_NOT_FOUND};
use crate::latex::AssembledDocument;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

const BIBITEM: &str = "\\bibitem";
const END_BIBLIOGRAPHY: &str = "\\end{thebibliography}";

fn region_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\\begin\{thebibliography\}.*?(?:\\end\{thebibliography\}|\z)")
            .expect("valid regex")
    })
}

/// The first `thebibliography` environment in `text`, including its delimiters
///
/// An environment that is never closed runs to the end of the text.
pub fn find_bibliography_region(text: &str) -> Option<&str> {
    region_pattern().find(text).map(|m| m.as_str())
}

/// Splits a bibliography region into one `\bibitem ...` block per reference
pub fn split_bibitems(region: &str) -> Vec<String> {
    region
        .split(BIBITEM)
        .skip(1)
        .map(|part| {
            let part = part.split(END_BIBLIOGRAPHY).next().unwrap_or(part);
            format!("{}{}", BIBITEM, part.trim_end())
        })
        .collect()
}

/// Parses `thebibliography` entries with the analysis service
pub struct BibItemStrategy {
    parser: Arc<dyn ReferenceBlockParser>,
}

impl BibItemStrategy {
    pub fn new(parser: Arc<dyn ReferenceBlockParser>) -> Self {
        Self { parser }
    }

    async fn locate_region(&self, document: &AssembledDocument) -> Option<String> {
        if let Some(region) = find_bibliography_region(&document.content) {
            debug!("Found inline thebibliography environment");
            return Some(region.to_string());
        }

        let bbl = document.entry_path().with_extension("bbl");
        match tokio::fs::read(&bbl).await {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                let region = find_bibliography_region(&text).map(str::to_string);
                if region.is_some() {
                    debug!(path = %bbl.display(), "Found thebibliography in compiled .bbl");
                } else {
                    warn!(path = %bbl.display(), "Compiled .bbl has no thebibliography environment");
                }
                region
            }
            Err(_) => None,
        }
    }
}

#[async_trait]
impl BibliographyStrategy for BibItemStrategy {
    fn name(&self) -> &str {
        "bibitems"
    }

    async fn resolve(
        &self,
        document: &AssembledDocument,
    ) -> Result<Vec<BibEntry>, BibliographyError> {
        let Some(region) = self.locate_region(document).await else {
            return Err(BibliographyError::NoBibliographyFound(format!(
                "no thebibliography environment in the document or {}",
                document.entry_file.with_extension("bbl").display()
            )));
        };

        let blocks = split_bibitems(&region);
        info!(blocks = blocks.len(), "Parsing reference list");

        let results = self.parser.parse_blocks(blocks.clone()).await;

        let mut entries = Vec::new();
        for (block, references) in blocks.iter().zip(results) {
            let single = references.len() == 1;
            for reference in references {
                let key = reference.key.trim().to_string();
                if key.is_empty() {
                    warn!("Skipping parsed reference without a key");
                    continue;
                }
                let title = reference.title.trim();
                let raw_content = if single {
                    block.clone()
                } else {
                    reference.content
                };
                entries.push(BibEntry::new(
                    key,
                    if title.is_empty() { TITLE_NOT_FOUND } else { title },
                    raw_content,
                ));
            }
        }

        Ok(dedup_by_key(entries))
    }
}
