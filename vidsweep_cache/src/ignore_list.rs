use std::{collections::BTreeSet, fs, path::PathBuf};

use log::warn;
use parking_lot::RwLock;
use vidsweep_core::IgnoreKey;

use crate::{base_fs_cache::atomic_write, CacheError, CacheResult};

/// The persistent set of dismissed duplicate groups.
///
/// Stored as human-readable JSON so an operator can audit or hand-prune
/// it. Every insertion is written to disk immediately; a dismissal that
/// only lived in memory would resurface the group if the session died
/// before a final save.
pub struct IgnoreList {
    list_path: PathBuf,
    keys: RwLock<BTreeSet<IgnoreKey>>,
}

impl IgnoreList {
    /// Open the ignore list at `list_path`. Missing means empty; corrupt
    /// means empty with a warning, and the file is rewritten at the next
    /// insertion.
    pub fn load(list_path: impl Into<PathBuf>) -> CacheResult<Self> {
        let list_path = list_path.into();

        let keys = match fs::read(&list_path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(keys) => keys,
                Err(e) => {
                    warn!(
                        "discarding unreadable ignore list at {}: {e}",
                        list_path.display()
                    );
                    BTreeSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(CacheError::io(&list_path, e)),
        };

        Ok(Self {
            list_path,
            keys: RwLock::new(keys),
        })
    }

    /// Add a key and persist the whole list before returning.
    pub fn insert(&self, key: IgnoreKey) -> CacheResult<()> {
        let snapshot = {
            let mut keys = self.keys.write();
            keys.insert(key);
            keys.clone()
        };

        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| CacheError::encode(&self.list_path, e))?;
        atomic_write(&self.list_path, &bytes)
    }

    #[must_use]
    pub fn contains(&self, key: &IgnoreKey) -> bool {
        self.keys.read().contains(key)
    }

    /// A snapshot of the whole set, as the grouper consumes it.
    #[must_use]
    pub fn snapshot(&self) -> BTreeSet<IgnoreKey> {
        self.keys.read().clone()
    }

    pub fn len(&self) -> usize {
        self.keys.read().len()
    }
}
