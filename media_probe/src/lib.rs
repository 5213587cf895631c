#![warn(clippy::cast_lossless)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::unwrap_used)]

//! A thin wrapper around the command line interfaces of ffmpeg and ffprobe.
//!
//! This crate shells out to `ffprobe` for stream metadata and to `ffmpeg`
//! for raw pixel/sample data. Both binaries must be available on `PATH`.
//! Every subprocess invocation is bounded by a timeout so that a single
//! pathological file cannot stall a caller indefinitely.

mod audio;
mod error;
mod frame;
mod probe;
mod subprocess;

pub use audio::read_audio_prefix;
pub use error::MediaProbeError;
pub use frame::grab_frame_gray;
pub use probe::MediaInfo;

pub type MediaProbeResult<T> = Result<T, MediaProbeError>;
