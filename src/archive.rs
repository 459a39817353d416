//! Unpacking of compressed paper sources
//!
//! Supported inputs are `.tar`, `.tar.gz`, `.tgz` and `.gz`. A bare `.gz` is often a
//! misnamed tarball, so it is unpacked as one when the decompressed bytes carry the
//! `ustar` magic and written out as a single file otherwise.

use flate2::read::MultiGzDecoder;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const USTAR_MAGIC_OFFSET: usize = 257;
const USTAR_MAGIC: &[u8] = b"ustar";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported archive format: {0} (expected .tar, .tar.gz, .tgz or .gz)")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to extract {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Tar,
    TarGz,
    Gz,
}

impl ArchiveKind {
    fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".tar") {
            Some(Self::Tar)
        } else if name.ends_with(".gz") {
            Some(Self::Gz)
        } else {
            None
        }
    }
}

/// Extracts `archive` into `dest` (created if missing) and returns `dest`
///
/// Entry paths that would escape `dest` are refused by the tar reader.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<PathBuf, ArchiveError> {
    if !archive.is_file() {
        return Err(ArchiveError::NotFound(archive.to_path_buf()));
    }
    let kind = ArchiveKind::detect(archive)
        .ok_or_else(|| ArchiveError::UnsupportedFormat(archive.to_path_buf()))?;

    let corrupt = |source: io::Error| ArchiveError::Corrupt {
        path: archive.to_path_buf(),
        source,
    };

    info!(archive = %archive.display(), dest = %dest.display(), "Extracting archive");
    fs::create_dir_all(dest).map_err(corrupt)?;

    match kind {
        ArchiveKind::Tar => {
            let file = fs::File::open(archive).map_err(corrupt)?;
            unpack_tar(file, dest).map_err(corrupt)?;
        }
        ArchiveKind::TarGz => {
            let file = fs::File::open(archive).map_err(corrupt)?;
            unpack_tar(MultiGzDecoder::new(file), dest).map_err(corrupt)?;
        }
        ArchiveKind::Gz => {
            let file = fs::File::open(archive).map_err(corrupt)?;
            let mut data = Vec::new();
            MultiGzDecoder::new(file)
                .read_to_end(&mut data)
                .map_err(corrupt)?;

            if is_tar(&data) {
                debug!("Gzip payload is a tar archive");
                unpack_tar(&data[..], dest).map_err(corrupt)?;
            } else {
                let stem = archive
                    .file_stem()
                    .map(|s| s.to_os_string())
                    .unwrap_or_else(|| "source".into());
                let target = dest.join(stem);
                debug!(target = %target.display(), "Gzip payload is a single file");
                fs::write(&target, &data).map_err(corrupt)?;
            }
        }
    }

    Ok(dest.to_path_buf())
}

fn unpack_tar<R: Read>(reader: R, dest: &Path) -> io::Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(false);
    archive.unpack(dest)
}

fn is_tar(data: &[u8]) -> bool {
    data.get(USTAR_MAGIC_OFFSET..USTAR_MAGIC_OFFSET + USTAR_MAGIC.len()) == Some(USTAR_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn tar_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, content) in files {
            let mut header = tar::Header::new_ustar();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_tar_gz() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("paper.tar.gz");
        fs::write(
            &archive,
            gzip(&tar_bytes(&[("main.tex", "\\begin{document}"), ("sec/intro.tex", "Intro")])),
        )
        .unwrap();

        let out = extract_archive(&archive, &dir.path().join("out")).unwrap();
        assert_eq!(fs::read_to_string(out.join("sec/intro.tex")).unwrap(), "Intro");
    }

    #[test]
    fn test_plain_tar() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("paper.tar");
        fs::write(&archive, tar_bytes(&[("main.tex", "body")])).unwrap();

        let out = extract_archive(&archive, &dir.path().join("out")).unwrap();
        assert!(out.join("main.tex").is_file());
    }

    #[test]
    fn test_gz_holding_a_tar() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("latex_source.gz");
        fs::write(&archive, gzip(&tar_bytes(&[("main.tex", "body")]))).unwrap();

        let out = extract_archive(&archive, &dir.path().join("out")).unwrap();
        assert!(out.join("main.tex").is_file());
        assert!(!out.join("latex_source").exists());
    }

    #[test]
    fn test_gz_single_file() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("main.tex.gz");
        fs::write(&archive, gzip(b"\\documentclass{article}")).unwrap();

        let out = extract_archive(&archive, &dir.path().join("out")).unwrap();
        assert_eq!(
            fs::read_to_string(out.join("main.tex")).unwrap(),
            "\\documentclass{article}"
        );
    }

    #[test]
    fn test_errors() {
        let dir = TempDir::new().unwrap();

        let missing = extract_archive(&dir.path().join("none.tar"), dir.path());
        assert!(matches!(missing, Err(ArchiveError::NotFound(_))));

        let zip = dir.path().join("paper.zip");
        fs::write(&zip, b"PK").unwrap();
        assert!(matches!(
            extract_archive(&zip, dir.path()),
            Err(ArchiveError::UnsupportedFormat(_))
        ));

        let broken = dir.path().join("broken.tgz");
        fs::write(&broken, b"not gzip at all").unwrap();
        assert!(matches!(
            extract_archive(&broken, &dir.path().join("out")),
            Err(ArchiveError::Corrupt { .. })
        ));
    }
}
