use super::bibtex::{parse_bibtex, BibtexEntry};
use super::resolver::BibliographyStrategy;
use super::{dedup_by_key, BibEntry, BibliographyError, TITLE_NOT_FOUND};
use crate::latex::{latex_to_text, walk_files, AssembledDocument};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Reads the `.bib` files the document declares
#[derive(Debug, Default, Clone, Copy)]
pub struct BibFileStrategy;

/// First file under `root`, in sorted walk order, whose path ends with `<name>.bib`
pub fn find_bib_file(root: &Path, name: &str) -> Option<PathBuf> {
    let file_name = if name.ends_with(".bib") {
        name.to_string()
    } else {
        format!("{}.bib", name)
    };
    let wanted = Path::new(&file_name);

    walk_files(root)
        .into_iter()
        .find(|path| path.ends_with(wanted))
        .map(|path| root.join(path))
}

fn to_bib_entry(entry: BibtexEntry) -> BibEntry {
    let title = entry
        .field("title")
        .map(latex_to_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| TITLE_NOT_FOUND.to_string());
    let author = entry
        .field("author")
        .map(latex_to_text)
        .filter(|a| !a.is_empty());

    BibEntry {
        key: entry.key,
        inferred_title: title,
        inferred_author: author,
        raw_content: entry.raw,
        sequence_id: 0,
        analysis: None,
    }
}

#[async_trait]
impl BibliographyStrategy for BibFileStrategy {
    fn name(&self) -> &str {
        "bib-files"
    }

    async fn resolve(
        &self,
        document: &AssembledDocument,
    ) -> Result<Vec<BibEntry>, BibliographyError> {
        if document.bibliography_sources.is_empty() {
            debug!("Document declares no bibliography files");
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for name in &document.bibliography_sources {
            let Some(path) = find_bib_file(&document.root, name) else {
                warn!(name = %name, "Declared bibliography file not found");
                continue;
            };

            let content = match tokio::fs::read(&path).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read bibliography file");
                    continue;
                }
            };

            let parsed = parse_bibtex(&content);
            info!(path = %path.display(), entries = parsed.len(), "Parsed bibliography file");
            entries.extend(parsed.into_iter().map(to_bib_entry));
        }

        Ok(dedup_by_key(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn document(root: &Path, sources: &[&str]) -> AssembledDocument {
        AssembledDocument {
            content: Arc::from(""),
            entry_file: PathBuf::from("main.tex"),
            root: root.to_path_buf(),
            processed_files: vec![PathBuf::from("main.tex")],
            title: None,
            bibliography_sources: sources.iter().map(|s| s.to_string()).collect(),
            missing_includes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_keys_across_files_keep_first() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("one.bib"),
            "@article{k1, title={From One}}\n@article{only1, title={Solo}}",
        )
        .unwrap();
        fs::write(
            dir.path().join("two.bib"),
            "@article{k1, title={From Two}, author={Someone}}",
        )
        .unwrap();

        let entries = BibFileStrategy
            .resolve(&document(dir.path(), &["one", "two"]))
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        let k1: Vec<_> = entries.iter().filter(|e| e.key == "k1").collect();
        assert_eq!(k1.len(), 1);
        assert_eq!(k1[0].inferred_title, "From One");
        assert!(k1[0].raw_content.contains("From One"));
        assert!(k1[0].inferred_author.is_none());
    }

    #[tokio::test]
    async fn test_fields_are_normalized() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("bib")).unwrap();
        fs::write(
            dir.path().join("bib/refs.bib"),
            "@misc{x, title = {{BERT}:\n   Pre-training of\n  \\emph{Deep} Transformers}, author = {M{\\\"u}ller, J.}}\n@misc{y}",
        )
        .unwrap();

        let entries = BibFileStrategy
            .resolve(&document(dir.path(), &["refs.bib"]))
            .await
            .unwrap();

        assert_eq!(entries[0].inferred_title, "BERT: Pre-training of Deep Transformers");
        assert_eq!(entries[0].inferred_author.as_deref(), Some("Müller, J."));
        assert_eq!(entries[1].inferred_title, TITLE_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_file_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let entries = BibFileStrategy
            .resolve(&document(dir.path(), &["absent"]))
            .await
            .unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_find_bib_file_honours_subpaths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a/refs.bib"), "").unwrap();
        fs::write(dir.path().join("b/refs.bib"), "").unwrap();

        assert_eq!(
            find_bib_file(dir.path(), "refs"),
            Some(dir.path().join("a/refs.bib"))
        );
        assert_eq!(
            find_bib_file(dir.path(), "b/refs"),
            Some(dir.path().join("b/refs.bib"))
        );
        assert!(find_bib_file(dir.path(), "other").is_none());
    }
}
