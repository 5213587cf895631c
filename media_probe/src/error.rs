use std::path::PathBuf;

use thiserror::Error;

/// An error raised while probing or decoding a media file.
#[derive(Error, Debug)]
pub enum MediaProbeError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to spawn {command}: {src}")]
    Spawn {
        command: String,
        #[source]
        src: std::io::Error,
    },

    #[error("{command} exceeded the {timeout_secs}s timeout for {path}")]
    Timeout {
        command: String,
        timeout_secs: u64,
        path: PathBuf,
    },

    #[error("{command} failed for {path}: {stderr}")]
    CommandFailed {
        command: String,
        path: PathBuf,
        stderr: String,
    },

    #[error("I/O error while talking to {command}: {src}")]
    Io {
        command: String,
        #[source]
        src: std::io::Error,
    },

    #[error("Could not parse ffprobe output for {path}: {reason}")]
    ParseStats { path: PathBuf, reason: String },

    #[error("No video stream present in {0}")]
    NoVideoStream(PathBuf),

    #[error("Decoded frame had unexpected size: expected {expected} bytes, got {actual}")]
    ShortFrameRead { expected: usize, actual: usize },
}
