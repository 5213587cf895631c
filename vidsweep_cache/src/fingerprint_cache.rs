use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};
use vidsweep_core::{ExtractionError, FeatureExtractor, VideoFingerprint};

use crate::{base_fs_cache::BaseFsCache, CacheResult};

// One flush per this many new fingerprints, so an interrupted scan of a
// large collection loses bounded work.
const SAVE_THRESHOLD: u32 = 100;

/// A persistent store of [`VideoFingerprint`]s keyed by canonical path.
///
/// Entries are only ever returned while they are demonstrably current: a
/// fetch stats the file and requires its size and modification time to
/// equal the values captured at extraction, exactly. Any mismatch, or a
/// stat failure, makes the entry invisible. There is no tolerance window;
/// a touched-but-unchanged file is re-extracted, which costs seconds,
/// while a stale hit could silently corrupt every comparison.
pub struct FingerprintCache {
    cache: BaseFsCache<VideoFingerprint>,
}

impl FingerprintCache {
    /// Open the cache file at `cache_path`, creating an empty cache if it
    /// is missing or unreadable.
    ///
    /// # Errors
    /// Only genuine I/O failures (e.g. an unreadable directory). Corrupt
    /// contents are not an error.
    pub fn load(cache_path: impl Into<PathBuf>) -> CacheResult<Self> {
        let cache = BaseFsCache::new(SAVE_THRESHOLD, cache_path.into())?;
        info!("loaded fingerprint cache with {} entries", cache.len());
        Ok(Self { cache })
    }

    /// Flush all entries to disk.
    pub fn save(&self) -> CacheResult<()> {
        self.cache.save()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Store a fingerprint, keyed by its own path.
    pub fn insert(&self, fingerprint: VideoFingerprint) -> CacheResult<()> {
        self.cache
            .insert(fingerprint.path().to_path_buf(), fingerprint)
    }

    /// The cached fingerprint for `src_path`, if one exists and still
    /// matches the file on disk.
    #[must_use]
    pub fn fetch(&self, src_path: &Path) -> Option<VideoFingerprint> {
        let fingerprint = self.cache.fetch(src_path)?;
        if is_current(&fingerprint, src_path) {
            Some(fingerprint)
        } else {
            None
        }
    }

    /// Bring the cache up to date for the given set of files: anything
    /// with a current entry is skipped, everything else is fingerprinted
    /// and stored. `progress` is called once per path, from worker threads
    /// when the `parallel_loading` feature is enabled.
    ///
    /// Returns the files that could not be fingerprinted, with their
    /// errors. One broken file never aborts the rest of the scan.
    pub fn refresh_all(
        &self,
        extractor: &FeatureExtractor,
        paths: Vec<PathBuf>,
        progress: &(impl Fn(&Path) + Sync),
    ) -> Vec<(PathBuf, ExtractionError)> {
        let job = |src_path: PathBuf| -> Option<(PathBuf, ExtractionError)> {
            let outcome = if self.fetch(&src_path).is_some() {
                None
            } else {
                match extractor.extract(&src_path) {
                    Ok(fingerprint) => {
                        if let Err(e) = self.insert(fingerprint) {
                            // The entry is still live in memory; the final
                            // explicit save will retry the write.
                            warn!("autosave failed: {e}");
                        }
                        None
                    }
                    Err(e) => Some((src_path.clone(), e)),
                }
            };
            progress(&src_path);
            outcome
        };

        cfg_if::cfg_if! {
            if #[cfg(feature = "parallel_loading")] {
                use rayon::prelude::*;
                paths.into_par_iter().filter_map(job).collect()
            } else {
                paths.into_iter().filter_map(job).collect()
            }
        }
    }

    /// Drop entries whose file no longer exists. Returns how many were
    /// dropped.
    pub fn purge_missing(&self) -> CacheResult<usize> {
        let mut purged = 0;
        for key in self.cache.keys() {
            if !key.exists() && self.cache.remove(&key)? {
                purged += 1;
            }
        }
        if purged > 0 {
            info!("purged {purged} cache entries for missing files");
        }
        Ok(purged)
    }

    /// A path-ordered snapshot of every *current* fingerprint, ready for
    /// grouping. Stale entries are silently omitted, exactly as
    /// [`FingerprintCache::fetch`] would omit them.
    #[must_use]
    pub fn all_fingerprints(&self) -> BTreeMap<PathBuf, VideoFingerprint> {
        self.cache
            .entries()
            .into_iter()
            .filter(|(path, fingerprint)| is_current(fingerprint, path))
            .collect()
    }
}

fn is_current(fingerprint: &VideoFingerprint, src_path: &Path) -> bool {
    match fs::metadata(src_path) {
        Ok(metadata) => {
            metadata.len() == fingerprint.file_size()
                && metadata
                    .modified()
                    .map(|mtime| mtime == fingerprint.mtime())
                    .unwrap_or(false)
        }
        Err(_) => false,
    }
}
