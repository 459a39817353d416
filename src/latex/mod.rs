//! LaTeX source tree loading and single-document assembly
//!
//! [`LatexProject`] walks a project directory and ranks entry-file candidates;
//! [`Assembler`] expands include directives depth-first into one
//! [`AssembledDocument`] while collecting the title and declared bibliography
//! sources.

mod assembler;
mod metadata;
mod project;
mod tokenizer;

pub use assembler::{AssembledDocument, Assembler, MAX_INCLUDE_DEPTH};
pub use metadata::DocumentMetadata;
pub use project::{locate_entry_file, FileStatus, LatexProject, SourceFile, MAX_SOURCE_FILE_BYTES};
pub use tokenizer::{latex_to_text, scan_macros, MacroCall};

pub(crate) use project::walk_files;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("No .tex files found under {}", root.display())]
    ProjectEmpty { root: PathBuf },

    #[error("No file containing \\documentclass found under {}", root.display())]
    NoEntryFileFound { root: PathBuf },

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
