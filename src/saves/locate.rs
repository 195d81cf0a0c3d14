//! Newest-save-file lookup.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

/// Find the most recently modified file under `base` (up to two levels deep)
/// whose name ends with `extension` and passes `keep`.
///
/// Returns `None` when the directory is missing or holds no candidate. Ties on
/// modification time are broken by path ordering so the result is stable for a
/// given filesystem snapshot. Entries whose metadata cannot be read are
/// skipped.
pub fn find_latest<F>(base: &Path, extension: &str, keep: F) -> Option<PathBuf>
where
    F: Fn(&str) -> bool,
{
    if !base.is_dir() {
        tracing::debug!("save directory {} not found", base.display());
        return None;
    }

    let mut best: Option<(SystemTime, PathBuf)> = None;

    for entry in WalkDir::new(base).max_depth(2) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(extension) || !keep(&name) {
            continue;
        }

        let modified = match entry.metadata().ok().and_then(|m| m.modified().ok()) {
            Some(modified) => modified,
            None => {
                tracing::debug!("no modification time for {}", entry.path().display());
                continue;
            }
        };

        let candidate = (modified, entry.path().to_path_buf());
        if best.as_ref().map_or(true, |b| candidate > *b) {
            best = Some(candidate);
        }
    }

    best.map(|(_, path)| path)
}
