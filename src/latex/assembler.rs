use super::metadata::DocumentMetadata;
use super::project::{load_source_file, LatexProject, SourceFile};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Nesting limit for include expansion
pub const MAX_INCLUDE_DEPTH: usize = 32;

fn include_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*\\(?:input|include|subfile)\s*\{([^}]+)\}").expect("valid regex")
    })
}

fn missing_marker(name: &str) -> String {
    format!("%% citetrace: missing include '{}' %%", name)
}

fn depth_marker(name: &str) -> String {
    format!("%% citetrace: include depth limit reached at '{}' %%", name)
}

/// The whole paper as one logical text body
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub content: Arc<str>,
    /// Entry file, relative to the project root
    pub entry_file: PathBuf,
    pub root: PathBuf,
    /// Files expanded into the body, in visiting order, relative to the root
    pub processed_files: Vec<PathBuf>,
    pub title: Option<String>,
    pub bibliography_sources: Vec<String>,
    pub missing_includes: Vec<String>,
}

impl AssembledDocument {
    pub fn title_or_unknown(&self) -> &str {
        self.title.as_deref().unwrap_or("unknown")
    }

    /// Absolute path of the entry file
    pub fn entry_path(&self) -> PathBuf {
        self.root.join(&self.entry_file)
    }
}

pub struct Assembler<'a> {
    project: &'a LatexProject,
}

struct Walk<'a> {
    root: PathBuf,
    canonical_root: PathBuf,
    /// Files loaded by the project, keyed by canonical path
    sources: HashMap<PathBuf, &'a SourceFile>,
    visited: HashSet<PathBuf>,
    processed: Vec<PathBuf>,
    missing: Vec<String>,
    metadata: DocumentMetadata,
}

impl<'a> Assembler<'a> {
    pub fn new(project: &'a LatexProject) -> Self {
        Self { project }
    }

    /// Expands every include directive reachable from `entry`
    ///
    /// Never fails: unresolved includes leave a marker in the body, and a file that
    /// was already expanded contributes nothing on later visits.
    pub fn assemble(&self, entry: &SourceFile) -> AssembledDocument {
        let root = self.project.root().to_path_buf();
        let canonical_root = std::fs::canonicalize(&root).unwrap_or_else(|_| root.clone());

        let sources = self
            .project
            .files()
            .iter()
            .map(|file| (canonical(&root.join(&file.path)), file))
            .collect();

        let mut walk = Walk {
            root: root.clone(),
            canonical_root,
            sources,
            visited: HashSet::new(),
            processed: Vec::new(),
            missing: Vec::new(),
            metadata: DocumentMetadata::default(),
        };

        let entry_path = canonical(&root.join(&entry.path));
        walk.visited.insert(entry_path.clone());
        let entry_relative = walk.relative(&entry_path);
        walk.processed.push(entry_relative);

        let content = walk.expand(&entry_path, &entry.content, 0);
        walk.metadata.fill_from_patterns(&content);

        info!(
            entry = %entry.path.display(),
            files = walk.processed.len(),
            missing = walk.missing.len(),
            bytes = content.len(),
            "Assembled document"
        );

        AssembledDocument {
            content: Arc::from(content),
            entry_file: entry.path.clone(),
            root,
            processed_files: walk.processed,
            title: walk.metadata.title,
            bibliography_sources: walk.metadata.bibliography_sources,
            missing_includes: walk.missing,
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

impl<'a> Walk<'a> {
    fn expand(&mut self, path: &Path, content: &str, depth: usize) -> String {
        let dir = path.parent().unwrap_or(&self.root).to_path_buf();
        let mut out = String::with_capacity(content.len());
        let mut last = 0;

        for caps in include_pattern().captures_iter(content) {
            let Some(directive) = caps.get(0) else {
                continue;
            };
            let before = &content[last..directive.start()];
            self.metadata.scan(before);
            out.push_str(before);

            // Keep the indentation that preceded the directive
            let text = directive.as_str();
            out.push_str(&text[..text.len() - text.trim_start().len()]);

            out.push_str(&self.include(&dir, caps[1].trim(), depth));
            last = directive.end();
        }

        let rest = &content[last..];
        self.metadata.scan(rest);
        out.push_str(rest);
        out
    }

    fn include(&mut self, dir: &Path, name: &str, depth: usize) -> String {
        if depth + 1 >= MAX_INCLUDE_DEPTH {
            warn!(include = name, depth, "Include depth limit reached");
            return depth_marker(name);
        }

        let Some(path) = self.resolve(dir, name) else {
            warn!(include = name, "Included file not found");
            self.missing.push(name.to_string());
            return missing_marker(name);
        };

        let path = canonical(&path);
        if !self.visited.insert(path.clone()) {
            debug!(include = name, "File already expanded, skipping");
            return String::new();
        }

        let relative = self.relative(&path);
        let loaded;
        let source = match self.sources.get(&path).copied() {
            Some(file) => file,
            None => match load_source_file(&self.canonical_root, relative.clone()) {
                Some(file) => {
                    loaded = file;
                    &loaded
                }
                None => {
                    warn!(include = name, "Included file exceeds the size limit");
                    self.missing.push(name.to_string());
                    return missing_marker(name);
                }
            },
        };

        if !source.is_readable() {
            warn!(include = name, "Included file unreadable");
            self.missing.push(name.to_string());
            return missing_marker(name);
        }

        self.processed.push(relative);
        self.expand(&path, &source.content, depth + 1)
    }

    /// Looks for the include target next to the includer, then at the project root
    fn resolve(&self, dir: &Path, name: &str) -> Option<PathBuf> {
        let mut names = Vec::with_capacity(2);
        if !name.ends_with(".tex") {
            names.push(format!("{}.tex", name));
        }
        names.push(name.to_string());

        [dir, self.root.as_path()]
            .iter()
            .flat_map(|base| names.iter().map(move |n| base.join(n)))
            .find(|candidate| candidate.is_file())
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.canonical_root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
