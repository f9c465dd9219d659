use super::{ArchiveError, ExtractStats};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use zip::ZipArchive;

pub(super) fn extract(archive: &Path, target_dir: &Path) -> Result<ExtractStats, ArchiveError> {
    let read_err = |reason: String| ArchiveError::Read {
        path: archive.display().to_string(),
        reason,
    };
    let file = File::open(archive).map_err(|e| read_err(e.to_string()))?;
    let mut zip = ZipArchive::new(file).map_err(|e| read_err(e.to_string()))?;

    let mut stats = ExtractStats::default();
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| read_err(e.to_string()))?;
        let name = entry.name().to_string();
        let extract_err = |reason: String| ArchiveError::Extract {
            path: archive.display().to_string(),
            entry: name.clone(),
            reason,
        };

        // Absolute paths and `..` components yield None.
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(entry = %name, "skipping entry outside install directory");
            stats.skipped += 1;
            continue;
        };
        let out_path = target_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| extract_err(e.to_string()))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| extract_err(e.to_string()))?;
        }

        // A previous install may have left this file read-only.
        match fs::symlink_metadata(&out_path) {
            Ok(meta) if !meta.is_dir() => {
                fs::remove_file(&out_path).map_err(|e| extract_err(e.to_string()))?
            }
            _ => {}
        }
        let mut out = File::create(&out_path).map_err(|e| extract_err(e.to_string()))?;
        io::copy(&mut entry, &mut out).map_err(|e| extract_err(e.to_string()))?;
        out.sync_all().map_err(|e| extract_err(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o7777))
                    .map_err(|e| extract_err(e.to_string()))?;
            }
        }
        stats.extracted += 1;
    }
    Ok(stats)
}
