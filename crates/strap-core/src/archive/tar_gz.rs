use super::{ArchiveError, ExtractStats};
use flate2::read::GzDecoder;
use std::fs::File;
use std::path::Path;
use tar::Archive;

pub(super) fn extract(archive: &Path, target_dir: &Path) -> Result<ExtractStats, ArchiveError> {
    let read_err = |reason: String| ArchiveError::Read {
        path: archive.display().to_string(),
        reason,
    };
    let file = File::open(archive).map_err(|e| read_err(e.to_string()))?;
    let mut tar = Archive::new(GzDecoder::new(file));
    tar.set_overwrite(true);
    tar.set_preserve_permissions(true);

    let mut stats = ExtractStats::default();
    for entry in tar.entries().map_err(|e| read_err(e.to_string()))? {
        let mut entry = entry.map_err(|e| read_err(e.to_string()))?;
        let name = entry
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "<invalid path>".to_string());

        // false: the entry would land outside target_dir and was not written.
        let unpacked = entry
            .unpack_in(target_dir)
            .map_err(|e| ArchiveError::Extract {
                path: archive.display().to_string(),
                entry: name.clone(),
                reason: e.to_string(),
            })?;
        if unpacked {
            if entry.header().entry_type().is_file() {
                stats.extracted += 1;
            }
        } else {
            tracing::warn!(entry = %name, "skipping entry outside install directory");
            stats.skipped += 1;
        }
    }
    Ok(stats)
}
