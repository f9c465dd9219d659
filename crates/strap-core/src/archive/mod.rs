//! Archive installation: extract into the install directory, find the executable.
//!
//! The archive is removed only after the executable is confirmed present, so a
//! failed install leaves it on disk for inspection.

mod tar_gz;
mod zip_file;

use crate::checksum;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("cannot create install directory {path}: {reason}")]
    InstallDir { path: String, reason: String },

    #[error("unsupported archive type: {path} (expected .zip, .tar.gz or .tgz)")]
    Unsupported { path: String },

    #[error("cannot read archive {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to extract {entry} from {path}: {reason}")]
    Extract {
        path: String,
        entry: String,
        reason: String,
    },

    #[error("{exe} not found in {dir} after extraction; the archive may be corrupted or laid out differently")]
    MissingExecutable { exe: String, dir: String },

    #[error("'{0}' is not a SHA-256 digest (64 hex digits)")]
    InvalidDigest(String),

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("cannot remove archive {path}: {reason}")]
    Cleanup { path: String, reason: String },
}

/// Supported archive formats, chosen by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }
}

/// Creates `dir` (and parents) if missing.
pub fn ensure_install_dir(dir: &Path) -> Result<(), ArchiveError> {
    fs::create_dir_all(dir).map_err(|e| ArchiveError::InstallDir {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })
}

/// Checks `archive` against an expected SHA-256 digest.
pub fn check_digest(archive: &Path, expected: &str) -> Result<(), ArchiveError> {
    let expected = checksum::normalize_sha256(expected)
        .ok_or_else(|| ArchiveError::InvalidDigest(expected.trim().to_string()))?;
    let actual = checksum::sha256_path(archive).map_err(|e| ArchiveError::Read {
        path: archive.display().to_string(),
        reason: format!("{e:#}"),
    })?;
    if actual != expected {
        return Err(ArchiveError::ChecksumMismatch {
            path: archive.display().to_string(),
            expected,
            actual,
        });
    }
    tracing::debug!(archive = %archive.display(), "checksum ok");
    Ok(())
}

/// Extracts `archive` into `target_dir` and returns the path of `exe_name`
/// directly inside it. Deletes the archive on success only.
pub fn install(
    archive: &Path,
    target_dir: &Path,
    exe_name: &str,
    expected_sha256: Option<&str>,
) -> Result<PathBuf, ArchiveError> {
    let format = ArchiveFormat::from_path(archive).ok_or_else(|| ArchiveError::Unsupported {
        path: archive.display().to_string(),
    })?;
    if let Some(expected) = expected_sha256 {
        check_digest(archive, expected)?;
    }

    ensure_install_dir(target_dir)?;
    let stats = match format {
        ArchiveFormat::Zip => zip_file::extract(archive, target_dir)?,
        ArchiveFormat::TarGz => tar_gz::extract(archive, target_dir)?,
    };
    tracing::info!(
        archive = %archive.display(),
        extracted = stats.extracted,
        skipped = stats.skipped,
        "archive extracted"
    );

    let exe = target_dir.join(exe_name);
    if !exe.is_file() {
        return Err(ArchiveError::MissingExecutable {
            exe: exe_name.to_string(),
            dir: target_dir.display().to_string(),
        });
    }
    ensure_executable(&exe)?;

    fs::remove_file(archive).map_err(|e| ArchiveError::Cleanup {
        path: archive.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(exe)
}

/// Entry counts from one extraction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub extracted: usize,
    /// Entries whose path would land outside the target directory.
    pub skipped: usize,
}

/// Archives built without mode bits still yield a runnable binary.
#[cfg(unix)]
fn ensure_executable(exe: &Path) -> Result<(), ArchiveError> {
    use std::os::unix::fs::PermissionsExt;

    let err = |e: std::io::Error| ArchiveError::Extract {
        path: exe.display().to_string(),
        entry: exe.display().to_string(),
        reason: e.to_string(),
    };
    let mut perms = fs::metadata(exe).map_err(err)?.permissions();
    if perms.mode() & 0o111 == 0 {
        perms.set_mode(perms.mode() | 0o755);
        fs::set_permissions(exe, perms).map_err(err)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_executable(_exe: &Path) -> Result<(), ArchiveError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_zip(path: &Path, entries: &[(&str, &[u8], u32)]) {
        let file = fs::File::create(path).unwrap();
        let mut zw = zip::ZipWriter::new(file);
        for (name, data, mode) in entries {
            let opts = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated)
                .unix_permissions(*mode);
            zw.start_file(*name, opts).unwrap();
            zw.write_all(data).unwrap();
        }
        zw.finish().unwrap();
    }

    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8], u32)]) {
        let file = fs::File::create(path).unwrap();
        let enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(enc);
        for (name, data, mode) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn format_by_file_name() {
        assert_eq!(ArchiveFormat::from_path(Path::new("a/t.zip")), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_path(Path::new("t.TAR.GZ")), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_path(Path::new("t.tgz")), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_path(Path::new("t.tar.xz")), None);
    }

    #[test]
    fn zip_install_finds_executable_and_removes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool.zip");
        let target = dir.path().join("bin");
        write_zip(&archive, &[("tool", b"#!/bin/sh\necho 1\n", 0o755), ("README.md", b"hi", 0o644)]);

        let exe = install(&archive, &target, "tool", None).unwrap();
        assert_eq!(exe, target.join("tool"));
        assert!(target.join("README.md").is_file());
        assert!(!archive.exists());
    }

    #[test]
    fn tar_gz_install_overwrites_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool.tar.gz");
        let target = dir.path().join("bin");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("tool"), b"old").unwrap();
        write_tar_gz(&archive, &[("tool", b"new", 0o755)]);

        let exe = install(&archive, &target, "tool", None).unwrap();
        assert_eq!(fs::read(exe).unwrap(), b"new");
        assert!(!archive.exists());
    }

    #[test]
    fn missing_executable_keeps_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool.zip");
        let target = dir.path().join("bin");
        write_zip(&archive, &[("README.md", b"no binary here", 0o644)]);

        let err = install(&archive, &target, "tool", None).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingExecutable { .. }));
        assert!(archive.exists());
    }

    #[test]
    fn executable_in_subdirectory_does_not_count() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool.tgz");
        let target = dir.path().join("bin");
        write_tar_gz(&archive, &[("tool-1.0/tool", b"x", 0o755)]);

        let err = install(&archive, &target, "tool", None).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingExecutable { .. }));
        assert!(target.join("tool-1.0/tool").is_file());
        assert!(archive.exists());
    }

    #[test]
    fn corrupted_archive_is_a_read_error_and_kept() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool.zip");
        fs::write(&archive, b"this is not a zip file").unwrap();

        let err = install(&archive, &dir.path().join("bin"), "tool", None).unwrap_err();
        assert!(matches!(err, ArchiveError::Read { .. }));
        assert!(archive.exists());
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool.rar");
        fs::write(&archive, b"x").unwrap();
        let err = install(&archive, &dir.path().join("bin"), "tool", None).unwrap_err();
        assert!(matches!(err, ArchiveError::Unsupported { .. }));
    }

    #[test]
    fn checksum_mismatch_stops_before_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool.zip");
        let target = dir.path().join("bin");
        write_zip(&archive, &[("tool", b"x", 0o755)]);

        let err = install(&archive, &target, "tool", Some(&"0".repeat(64))).unwrap_err();
        assert!(matches!(err, ArchiveError::ChecksumMismatch { .. }));
        assert!(!target.join("tool").exists());
        assert!(archive.exists());
    }

    #[test]
    fn matching_checksum_installs() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool.zip");
        write_zip(&archive, &[("tool", b"x", 0o755)]);
        let digest = checksum::sha256_path(&archive).unwrap();

        install(&archive, &dir.path().join("bin"), "tool", Some(&digest.to_uppercase())).unwrap();
    }

    #[test]
    fn malformed_digest_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool.zip");
        write_zip(&archive, &[("tool", b"x", 0o755)]);
        let err = install(&archive, &dir.path().join("bin"), "tool", Some("abc")).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidDigest(_)));
    }

    #[test]
    fn install_dir_blocked_by_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let err = ensure_install_dir(&blocker.join("sub")).unwrap_err();
        assert!(matches!(err, ArchiveError::InstallDir { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn mode_bits_applied_and_exec_bit_ensured() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool.zip");
        let target = dir.path().join("bin");
        write_zip(&archive, &[("tool", b"x", 0o644), ("data.txt", b"d", 0o600)]);

        let exe = install(&archive, &target, "tool", None).unwrap();
        assert_ne!(fs::metadata(exe).unwrap().permissions().mode() & 0o111, 0);
        assert_eq!(
            fs::metadata(target.join("data.txt")).unwrap().permissions().mode() & 0o777,
            0o600
        );
    }
}
