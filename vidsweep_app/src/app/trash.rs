use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrashError {
    #[error("Cannot trash {path}: file is missing")]
    Missing { path: PathBuf },

    #[error("Cannot trash {path}: {src}")]
    Io {
        path: PathBuf,
        #[source]
        src: std::io::Error,
    },
}

/// A recoverable trash location: trashed files are moved here, never
/// deleted, so every resolution decision can be undone by hand.
pub struct TrashDir {
    root: PathBuf,
}

impl TrashDir {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Move `src_path` into the trash directory and return its size in
    /// bytes. Name collisions get a numeric suffix rather than
    /// overwriting an earlier trashed file.
    pub fn trash(&self, src_path: &Path) -> Result<u64, TrashError> {
        let metadata = fs::metadata(src_path).map_err(|src| {
            if src.kind() == std::io::ErrorKind::NotFound {
                TrashError::Missing {
                    path: src_path.to_path_buf(),
                }
            } else {
                TrashError::Io {
                    path: src_path.to_path_buf(),
                    src,
                }
            }
        })?;

        fs::create_dir_all(&self.root).map_err(|src| TrashError::Io {
            path: self.root.clone(),
            src,
        })?;

        let dst_path = self.unoccupied_destination(src_path);

        // rename fails across filesystems; fall back to copy-then-remove.
        if fs::rename(src_path, &dst_path).is_err() {
            fs::copy(src_path, &dst_path)
                .and_then(|_| fs::remove_file(src_path))
                .map_err(|src| TrashError::Io {
                    path: src_path.to_path_buf(),
                    src,
                })?;
        }

        Ok(metadata.len())
    }

    fn unoccupied_destination(&self, src_path: &Path) -> PathBuf {
        let file_name = src_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "unnamed".into());

        let candidate = self.root.join(&file_name);
        if !candidate.exists() {
            return candidate;
        }

        (1..)
            .map(|i| {
                let mut numbered = file_name.clone();
                numbered.push(format!(".{i}"));
                self.root.join(numbered)
            })
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

#[cfg(test)]
mod test {
    use super::{TrashDir, TrashError};

    #[test]
    fn test_trash_moves_file_and_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let victim = dir.path().join("a.mp4");
        std::fs::write(&victim, b"0123456789").unwrap();

        let trash = TrashDir::new(dir.path().join("trash"));
        let reclaimed = trash.trash(&victim).unwrap();

        assert_eq!(reclaimed, 10);
        assert!(!victim.exists());
        assert!(dir.path().join("trash/a.mp4").exists());
    }

    #[test]
    fn test_colliding_names_are_kept_apart() {
        let dir = tempfile::tempdir().unwrap();
        let trash = TrashDir::new(dir.path().join("trash"));

        for content in [b"first", b"again"] {
            let victim = dir.path().join("a.mp4");
            std::fs::write(&victim, content).unwrap();
            trash.trash(&victim).unwrap();
        }

        assert!(dir.path().join("trash/a.mp4").exists());
        assert!(dir.path().join("trash/a.mp4.1").exists());
    }

    #[test]
    fn test_missing_file_is_its_own_error() {
        let dir = tempfile::tempdir().unwrap();
        let trash = TrashDir::new(dir.path().join("trash"));

        let err = trash.trash(&dir.path().join("gone.mp4")).unwrap_err();
        assert!(matches!(err, TrashError::Missing { .. }));
    }
}
