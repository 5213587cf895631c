use std::{ffi::OsStr, path::Path};

use image::GrayImage;

use crate::{subprocess::run_with_timeout, MediaProbeError, MediaProbeResult};

/// Decode a single grayscale frame at `timestamp_secs`, scaled to
/// `width` x `height`.
///
/// The seek (`-ss` before `-i`) is keyframe-accurate and fast; exactness of
/// the grab position does not matter as long as it is deterministic for a
/// given file and timestamp, which it is.
pub fn grab_frame_gray(
    src_path: impl AsRef<Path>,
    timestamp_secs: f64,
    width: u32,
    height: u32,
    timeout_secs: u64,
) -> MediaProbeResult<GrayImage> {
    let src_path = src_path.as_ref();
    if !src_path.exists() {
        return Err(MediaProbeError::FileNotFound(src_path.to_path_buf()));
    }

    let timestamp_string = format!("{timestamp_secs:.3}");
    let scale_string = format!("scale={width}:{height}");

    let args: Vec<&OsStr> = vec![
        OsStr::new("-v"),
        OsStr::new("error"),
        OsStr::new("-ss"),
        OsStr::new(&timestamp_string),
        OsStr::new("-i"),
        src_path.as_os_str(),
        OsStr::new("-frames:v"),
        OsStr::new("1"),
        OsStr::new("-vf"),
        OsStr::new(&scale_string),
        OsStr::new("-f"),
        OsStr::new("rawvideo"),
        OsStr::new("-pix_fmt"),
        OsStr::new("gray"),
        OsStr::new("pipe:1"),
    ];

    let raw = run_with_timeout("ffmpeg", &args, src_path, timeout_secs, false)?;

    let expected = width as usize * height as usize;
    if raw.len() < expected {
        return Err(MediaProbeError::ShortFrameRead {
            expected,
            actual: raw.len(),
        });
    }

    // ffmpeg occasionally emits a second partial frame; keep exactly one.
    let pixels = raw[..expected].to_vec();
    GrayImage::from_raw(width, height, pixels).ok_or(MediaProbeError::ShortFrameRead {
        expected,
        actual: 0,
    })
}
