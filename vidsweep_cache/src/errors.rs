use std::path::PathBuf;

use thiserror::Error;

/// An error from reading or writing a persistent store.
///
/// Decoding failures are deliberately absent: a store that cannot be
/// decoded is treated as empty, not as an error.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Storage I/O error at {path}: {src}")]
    Io {
        path: PathBuf,
        #[source]
        src: std::io::Error,
    },

    #[error("Could not encode store contents for {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, src: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            src,
        }
    }

    pub(crate) fn encode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Encode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
