use std::{ffi::OsString, path::PathBuf};

use itertools::Itertools;
use walkdir::WalkDir;

/// Recursively collect every video file under the given roots, by
/// extension. Paths come back canonical, sorted and deduplicated, so the
/// rest of the run is deterministic no matter how the roots overlap.
pub fn find_video_files(search_dirs: &[PathBuf], extensions: &[OsString]) -> Vec<PathBuf> {
    search_dirs
        .iter()
        .flat_map(|root| WalkDir::new(root).follow_links(false))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable directory entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| extensions.contains(&ext.to_ascii_lowercase()))
                .unwrap_or(false)
        })
        .filter_map(|entry| match entry.path().canonicalize() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("skipping {}: {e}", entry.path().display());
                None
            }
        })
        .sorted()
        .dedup()
        .collect()
}
