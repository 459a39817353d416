use super::AssembleError;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Files above this size are never considered part of the source tree
pub const MAX_SOURCE_FILE_BYTES: u64 = 5_000_000;

const ROOT_MARKER: &str = "\\documentclass";
const BODY_MARKER: &str = "\\begin{document}";
const PREFERRED_ENTRY_NAMES: [&str; 3] = ["main.tex", "paper.tex", "article.tex"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Ok,
    Unreadable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the project root
    pub path: PathBuf,
    pub content: String,
    pub status: FileStatus,
}

impl SourceFile {
    pub fn is_readable(&self) -> bool {
        self.status == FileStatus::Ok
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Every `.tex` file under a project root, in scan order
#[derive(Debug, Clone)]
pub struct LatexProject {
    root: PathBuf,
    files: Vec<SourceFile>,
}

/// Lists regular files under `root` as root-relative paths, sorted by name per directory
///
/// Hidden files are included and ignore files are disregarded; a paper archive has
/// no reason to carry a meaningful `.gitignore`.
pub(crate) fn walk_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for result in WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
    {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }

    files
}

fn is_tex_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tex"))
}

/// Reads one source file, or `None` when it exceeds [`MAX_SOURCE_FILE_BYTES`]
///
/// A file that cannot be read is kept with [`FileStatus::Unreadable`].
pub(crate) fn load_source_file(root: &Path, relative: PathBuf) -> Option<SourceFile> {
    let absolute = root.join(&relative);

    if let Ok(meta) = std::fs::metadata(&absolute) {
        if meta.len() > MAX_SOURCE_FILE_BYTES {
            debug!(path = %relative.display(), size = meta.len(), "Skipping oversized file");
            return None;
        }
    }

    let file = match std::fs::read(&absolute) {
        Ok(bytes) => SourceFile {
            path: relative,
            content: String::from_utf8_lossy(&bytes).into_owned(),
            status: FileStatus::Ok,
        },
        Err(e) => {
            warn!(path = %relative.display(), error = %e, "Unreadable source file");
            SourceFile {
                path: relative,
                content: String::new(),
                status: FileStatus::Unreadable,
            }
        }
    };
    Some(file)
}

impl LatexProject {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AssembleError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(AssembleError::NotADirectory(root));
        }

        let files: Vec<SourceFile> = walk_files(&root)
            .into_iter()
            .filter(|p| is_tex_file(p))
            .filter_map(|relative| load_source_file(&root, relative))
            .collect();

        if files.is_empty() {
            return Err(AssembleError::ProjectEmpty { root });
        }

        debug!(root = %root.display(), files = files.len(), "Loaded LaTeX project");
        Ok(Self { root, files })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn locate_entry_file(&self) -> Result<&SourceFile, AssembleError> {
        locate_entry_file(self)
    }

    /// Entry file, or the first readable file when no candidate qualifies
    pub fn entry_file_or_first(&self) -> Result<&SourceFile, AssembleError> {
        match locate_entry_file(self) {
            Ok(entry) => Ok(entry),
            Err(AssembleError::NoEntryFileFound { .. }) => {
                let first = self
                    .files
                    .iter()
                    .find(|f| f.is_readable())
                    .ok_or_else(|| AssembleError::ProjectEmpty {
                        root: self.root.clone(),
                    })?;
                warn!(
                    file = %first.path.display(),
                    "No \\documentclass found, using first discovered file as entry"
                );
                Ok(first)
            }
            Err(e) => Err(e),
        }
    }
}

/// Picks the root document of the project
///
/// Candidates declare `\documentclass`. Those that also open `\begin{document}`
/// outrank the rest; within the top rank a preferred file name wins, otherwise the
/// first candidate in scan order.
pub fn locate_entry_file(project: &LatexProject) -> Result<&SourceFile, AssembleError> {
    let candidates: Vec<(&SourceFile, bool)> = project
        .files
        .iter()
        .filter(|f| f.is_readable() && f.content.contains(ROOT_MARKER))
        .map(|f| (f, f.content.contains(BODY_MARKER)))
        .collect();

    let Some(top_rank) = candidates.iter().map(|(_, has_body)| *has_body).max() else {
        return Err(AssembleError::NoEntryFileFound {
            root: project.root.clone(),
        });
    };

    let best: Vec<&SourceFile> = candidates
        .into_iter()
        .filter(|(_, has_body)| *has_body == top_rank)
        .map(|(f, _)| f)
        .collect();

    let entry = PREFERRED_ENTRY_NAMES
        .iter()
        .find_map(|name| {
            best.iter()
                .find(|f| f.file_name().eq_ignore_ascii_case(name))
                .copied()
        })
        .unwrap_or(best[0]);

    info!(entry = %entry.path.display(), candidates = best.len(), "Located entry file");
    Ok(entry)
}
