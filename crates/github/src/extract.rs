//! Archive unpacking and binary location.
//!
//! Downloaded archives are unpacked wholesale into a scratch directory and
//! the wanted binary is then located by exact path or, failing that, by a
//! glob match over a recursive listing. Archives are small, so no indexed
//! lookup is attempted.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tracing::debug;
use walkdir::WalkDir;
use xz2::read::XzDecoder;

use arca_core::archive::ArchiveKind;
use arca_core::{Error, Result};

/// Unpack an archive into the destination directory.
///
/// # Errors
///
/// Any failure from the archive libraries is surfaced as
/// [`Error::Unpack`] with the original cause text preserved.
pub fn unpack(kind: ArchiveKind, archive: &Path, dest: &Path) -> Result<()> {
    debug!(archive = %archive.display(), ?kind, "Unpacking archive");

    match kind {
        ArchiveKind::TarGz => untar(GzDecoder::new(open(archive)?), dest),
        ArchiveKind::TarBz2 => untar(BzDecoder::new(open(archive)?), dest),
        ArchiveKind::TarXz => untar(XzDecoder::new(open(archive)?), dest),
        ArchiveKind::Zip => unzip(archive, dest),
    }
}

/// Locate the wanted binary under an unpacked archive root.
///
/// The pattern is first tried verbatim as a regular file; otherwise every
/// file found by a recursive walk is glob-matched (case-sensitive) against
/// its path relative to the root, and the first match in listing order
/// wins.
///
/// # Errors
///
/// Fails with [`Error::BinaryNotFound`] naming the pattern when the
/// listing is exhausted without a match.
pub fn locate_binary(root: &Path, pattern: &str) -> Result<PathBuf> {
    let verbatim = root.join(pattern);
    if verbatim.is_file() {
        return Ok(verbatim);
    }

    if let Ok(glob) = glob::Pattern::new(pattern) {
        let walker = WalkDir::new(root).sort_by_file_name();

        for entry in walker.into_iter().filter_map(std::result::Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };

            if glob.matches(&relative.to_string_lossy()) {
                return Ok(entry.path().to_path_buf());
            }
        }
    }

    Err(Error::BinaryNotFound {
        pattern: pattern.to_string(),
    })
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::io("open_archive", path, e))
}

fn untar(reader: impl Read, dest: &Path) -> Result<()> {
    tar::Archive::new(reader)
        .unpack(dest)
        .map_err(|e| Error::unpack(e.to_string()))
}

fn unzip(archive: &Path, dest: &Path) -> Result<()> {
    let mut zip = zip::ZipArchive::new(open(archive)?).map_err(|e| Error::unpack(e.to_string()))?;
    zip.extract(dest).map_err(|e| Error::unpack(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Build a small tar.gz with the given entries on disk.
    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, *content).unwrap();
        }

        builder.into_inner().unwrap().finish().unwrap();
    }

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();

        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }

        writer.finish().unwrap();
    }

    #[test]
    fn test_unpack_tar_gz_and_locate_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool.tar.gz");
        write_tar_gz(&archive, &[("tool-1.0/tool", b"binary"), ("tool-1.0/readme", b"doc")]);

        let dest = dir.path().join("unpacked");
        unpack(ArchiveKind::TarGz, &archive, &dest).unwrap();

        let found = locate_binary(&dest, "tool-1.0/tool").unwrap();
        assert_eq!(std::fs::read(found).unwrap(), b"binary");
    }

    #[test]
    fn test_unpack_zip_and_locate_by_glob() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool.zip");
        write_zip(&archive, &[("tool-1.0/bin/tool", b"binary")]);

        let dest = dir.path().join("unpacked");
        unpack(ArchiveKind::Zip, &archive, &dest).unwrap();

        let found = locate_binary(&dest, "tool-*/bin/tool").unwrap();
        assert!(found.ends_with("tool-1.0/bin/tool"));
    }

    #[test]
    fn test_locate_glob_is_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Tool"), b"x").unwrap();

        let err = locate_binary(dir.path(), "tool").unwrap_err();
        assert!(matches!(err, Error::BinaryNotFound { .. }));
    }

    #[test]
    fn test_locate_missing_binary_names_pattern() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("other"), b"x").unwrap();

        let err = locate_binary(dir.path(), "tool-*/tool").unwrap_err();
        assert!(err.to_string().contains("tool-*/tool"));
    }

    #[test]
    fn test_unpack_failure_keeps_cause() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.tar.gz");
        std::fs::write(&bogus, b"not an archive").unwrap();

        let err = unpack(ArchiveKind::TarGz, &bogus, &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, Error::Unpack { .. }));
    }
}
