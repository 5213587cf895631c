use std::{ffi::OsStr, path::Path};

use crate::{subprocess::run_with_timeout, MediaProbeError, MediaProbeResult};

/// Decode up to `max_secs` of the audio track as mono signed 16-bit PCM at
/// `sample_rate` Hz.
///
/// Returns an empty vector when the file has an audio stream that decodes
/// to no samples; callers treat that the same as a decode failure.
pub fn read_audio_prefix(
    src_path: impl AsRef<Path>,
    max_secs: f64,
    sample_rate: u32,
    timeout_secs: u64,
) -> MediaProbeResult<Vec<i16>> {
    let src_path = src_path.as_ref();
    if !src_path.exists() {
        return Err(MediaProbeError::FileNotFound(src_path.to_path_buf()));
    }

    let duration_string = format!("{max_secs:.3}");
    let rate_string = sample_rate.to_string();

    let args: Vec<&OsStr> = vec![
        OsStr::new("-v"),
        OsStr::new("error"),
        OsStr::new("-i"),
        src_path.as_os_str(),
        OsStr::new("-t"),
        OsStr::new(&duration_string),
        OsStr::new("-vn"),
        OsStr::new("-ac"),
        OsStr::new("1"),
        OsStr::new("-ar"),
        OsStr::new(&rate_string),
        OsStr::new("-f"),
        OsStr::new("s16le"),
        OsStr::new("pipe:1"),
    ];

    let raw = run_with_timeout("ffmpeg", &args, src_path, timeout_secs, false)?;

    let samples = raw
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    Ok(samples)
}
