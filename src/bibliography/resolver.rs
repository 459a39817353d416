use super::{assign_sequence_ids, dedup_by_key, BibEntry, BibliographyError, ParsedReference};
use super::{BibFileStrategy, BibItemStrategy};
use crate::latex::AssembledDocument;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// One way of producing the bibliography
///
/// `Ok(vec![])` means "nothing here" and lets the next strategy run.
#[async_trait]
pub trait BibliographyStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn resolve(&self, document: &AssembledDocument)
        -> Result<Vec<BibEntry>, BibliographyError>;
}

/// Turns `\bibitem` blocks into structured references
#[async_trait]
pub trait ReferenceBlockParser: Send + Sync {
    /// One result list per block, in block order; a failed block yields an empty list
    async fn parse_blocks(&self, blocks: Vec<String>) -> Vec<Vec<ParsedReference>>;
}

pub struct BibliographyResolver {
    strategies: Vec<Box<dyn BibliographyStrategy>>,
}

impl BibliographyResolver {
    pub fn new(strategies: Vec<Box<dyn BibliographyStrategy>>) -> Self {
        Self { strategies }
    }

    /// `.bib` files first, then `thebibliography` text parsed by `parser`
    pub fn standard(parser: Arc<dyn ReferenceBlockParser>) -> Self {
        Self::new(vec![
            Box::new(BibFileStrategy),
            Box::new(BibItemStrategy::new(parser)),
        ])
    }

    /// Runs strategies in order; the first non-empty result becomes the entry list
    pub async fn resolve(
        &self,
        document: &AssembledDocument,
    ) -> Result<Vec<BibEntry>, BibliographyError> {
        let mut last_error = None;

        for strategy in &self.strategies {
            match strategy.resolve(document).await {
                Ok(entries) if !entries.is_empty() => {
                    let mut entries = dedup_by_key(entries);
                    assign_sequence_ids(&mut entries);
                    info!(
                        strategy = strategy.name(),
                        entries = entries.len(),
                        "Bibliography resolved"
                    );
                    return Ok(entries);
                }
                Ok(_) => {
                    debug!(strategy = strategy.name(), "Strategy produced no entries");
                }
                Err(e) => {
                    debug!(strategy = strategy.name(), error = %e, "Strategy failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BibliographyError::NoBibliographyFound(
                "no strategy produced any bibliography entries".to_string(),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        entries: Vec<BibEntry>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BibliographyStrategy for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn resolve(
            &self,
            _document: &AssembledDocument,
        ) -> Result<Vec<BibEntry>, BibliographyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.entries.clone())
        }
    }

    fn document() -> AssembledDocument {
        AssembledDocument {
            content: Arc::from("body"),
            entry_file: PathBuf::from("main.tex"),
            root: PathBuf::from("/nonexistent"),
            processed_files: Vec::new(),
            title: None,
            bibliography_sources: Vec::new(),
            missing_includes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_first_non_empty_strategy_wins() {
        let second_calls = Arc::new(AtomicUsize::new(0));
        let resolver = BibliographyResolver::new(vec![
            Box::new(Fixed {
                entries: vec![],
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Box::new(Fixed {
                entries: vec![BibEntry::new("a", "A", ""), BibEntry::new("b", "B", "")],
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Box::new(Fixed {
                entries: vec![BibEntry::new("z", "Z", "")],
                calls: second_calls.clone(),
            }),
        ]);

        let entries = resolver.resolve(&document()).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].sequence_id, 2);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_empty_is_no_bibliography() {
        let resolver = BibliographyResolver::new(vec![Box::new(Fixed {
            entries: vec![],
            calls: Arc::new(AtomicUsize::new(0)),
        })]);

        assert!(matches!(
            resolver.resolve(&document()).await,
            Err(BibliographyError::NoBibliographyFound(_))
        ));
    }
}
