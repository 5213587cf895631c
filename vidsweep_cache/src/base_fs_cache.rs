use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::warn;
use parking_lot::{Mutex, RwLock};
use serde::{de::DeserializeOwned, Serialize};

use crate::{CacheError, CacheResult};

/// Write `bytes` to `dst_path` so that a crash leaves either the old file
/// or the new one, never a torn mix: temp file in the same directory,
/// fsync, rename over the destination.
pub(crate) fn atomic_write(dst_path: &Path, bytes: &[u8]) -> CacheResult<()> {
    if let Some(parent) = dst_path.parent() {
        fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
    }

    let tmp_path = dst_path.with_extension("tmp");
    let mut tmp_file = fs::File::create(&tmp_path).map_err(|e| CacheError::io(&tmp_path, e))?;
    tmp_file
        .write_all(bytes)
        .and_then(|()| tmp_file.sync_all())
        .map_err(|e| CacheError::io(&tmp_path, e))?;
    drop(tmp_file);

    fs::rename(&tmp_path, dst_path).map_err(|e| CacheError::io(dst_path, e))
}

struct Inner<T> {
    map: HashMap<PathBuf, T>,
    unsaved: u32,
}

/// A persistent path-keyed map with periodic autosave.
///
/// All access goes through a single lock, so a value type that is cheap to
/// clone keeps readers fast. Every `save_threshold` mutations the whole map
/// is flushed to disk; callers still save once explicitly when done.
pub(crate) struct BaseFsCache<T> {
    cache_path: PathBuf,
    save_threshold: u32,
    inner: RwLock<Inner<T>>,
    save_lock: Mutex<()>,
}

impl<T> BaseFsCache<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Open the store at `cache_path`, loading whatever is already there.
    /// A missing file is an empty store. An undecodable file is discarded
    /// with a warning and also yields an empty store; it will be
    /// overwritten at the next save.
    pub fn new(save_threshold: u32, cache_path: PathBuf) -> CacheResult<Self> {
        let map = match fs::read(&cache_path) {
            Ok(bytes) => match bincode::deserialize(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    warn!(
                        "discarding unreadable store at {}: {e}",
                        cache_path.display()
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(CacheError::io(&cache_path, e)),
        };

        Ok(Self {
            cache_path,
            save_threshold,
            inner: RwLock::new(Inner { map, unsaved: 0 }),
            save_lock: Mutex::new(()),
        })
    }

    /// Saves are serialized on `save_lock`: two threads can trip the
    /// autosave threshold at once, and concurrent writers would race on
    /// the shared temp file and rename each other's half-written output
    /// over the store.
    pub fn save(&self) -> CacheResult<()> {
        let _save_guard = self.save_lock.lock();

        let snapshot = {
            let mut inner = self.inner.write();
            inner.unsaved = 0;
            inner.map.clone()
        };

        let bytes =
            bincode::serialize(&snapshot).map_err(|e| CacheError::encode(&self.cache_path, e))?;
        atomic_write(&self.cache_path, &bytes)
    }

    pub fn insert(&self, key: PathBuf, value: T) -> CacheResult<()> {
        let save_due = {
            let mut inner = self.inner.write();
            inner.map.insert(key, value);
            inner.unsaved += 1;
            inner.unsaved >= self.save_threshold
        };

        if save_due {
            self.save()?;
        }
        Ok(())
    }

    pub fn remove(&self, key: &Path) -> CacheResult<bool> {
        let (removed, save_due) = {
            let mut inner = self.inner.write();
            let removed = inner.map.remove(key).is_some();
            if removed {
                inner.unsaved += 1;
            }
            (removed, inner.unsaved >= self.save_threshold)
        };

        if save_due {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn fetch(&self, key: &Path) -> Option<T> {
        self.inner.read().map.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<PathBuf> {
        self.inner.read().map.keys().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(PathBuf, T)> {
        self.inner
            .read()
            .map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }
}
