use std::{ffi::OsStr, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{subprocess::run_with_timeout, MediaProbeError, MediaProbeResult};

const FFPROBE_TIMEOUT_SECS: u64 = 60;

/// The subset of ffprobe metadata needed for fingerprinting.
#[derive(PartialEq, Clone, Debug, Serialize, Deserialize, Default)]
pub struct MediaInfo {
    duration: f64,
    resolution: (u32, u32),
    frame_rate: f64,
    file_size: u64,
    has_audio: bool,
}

impl MediaInfo {
    /// Probe the file at `src_path` with ffprobe.
    ///
    /// # Errors
    /// * The file does not exist, or ffprobe does not recognize it.
    /// * The ffprobe output could not be parsed as JSON.
    /// * The file contains no video stream.
    pub fn new(src_path: impl AsRef<Path>) -> MediaProbeResult<Self> {
        let src_path = src_path.as_ref();
        if !src_path.exists() {
            return Err(MediaProbeError::FileNotFound(src_path.to_path_buf()));
        }

        let args: Vec<&OsStr> = vec![
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-show_streams"),
            OsStr::new("-show_format"),
            OsStr::new("-of"),
            OsStr::new("json"),
            src_path.as_os_str(),
        ];

        let stdout = run_with_timeout("ffprobe", &args, src_path, FFPROBE_TIMEOUT_SECS, true)?;

        let stats: Value =
            serde_json::from_slice(&stdout).map_err(|e| MediaProbeError::ParseStats {
                path: src_path.to_path_buf(),
                reason: format!("{e}").chars().take(500).collect(),
            })?;

        let parse_err = |reason: &str| MediaProbeError::ParseStats {
            path: src_path.to_path_buf(),
            reason: reason.to_string(),
        };

        let duration = match &stats["format"]["duration"] {
            Value::String(d) => d
                .parse::<f64>()
                .map_err(|_| parse_err("format.duration is not a float"))?,
            _ => 0.0,
        };

        let file_size = match &stats["format"]["size"] {
            Value::String(s) => s
                .parse::<u64>()
                .map_err(|_| parse_err("format.size is not an integer"))?,
            _ => 0,
        };

        let video_stream = Self::first_stream_of_type(&stats, "video")
            .ok_or_else(|| MediaProbeError::NoVideoStream(src_path.to_path_buf()))?;

        let width = Self::stream_u32(video_stream, "width").unwrap_or(0);
        let height = Self::stream_u32(video_stream, "height").unwrap_or(0);

        let frame_rate = match &video_stream["avg_frame_rate"] {
            Value::String(raw) => parse_frame_rate(raw).unwrap_or(0.0),
            _ => 0.0,
        };

        let has_audio = Self::first_stream_of_type(&stats, "audio").is_some();

        Ok(Self {
            duration,
            resolution: (width, height),
            frame_rate,
            file_size,
            has_audio,
        })
    }

    /// Duration of the container in seconds. May be 0.0 when ffprobe
    /// cannot determine it; callers decide whether that is an error.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn has_audio(&self) -> bool {
        self.has_audio
    }

    fn first_stream_of_type<'a>(stats: &'a Value, stream_type: &str) -> Option<&'a Value> {
        if let Value::Array(streams) = &stats["streams"] {
            streams.iter().find(|s| match &s["codec_type"] {
                Value::String(codec_type) => codec_type == stream_type,
                _ => false,
            })
        } else {
            None
        }
    }

    fn stream_u32(stream: &Value, field_name: &str) -> Option<u32> {
        match &stream[field_name] {
            Value::Number(v) => u32::try_from(v.as_u64()?).ok(),
            _ => None,
        }
    }
}

// ffprobe reports frame rates as integer fractions, e.g "30000/1001" or "25/1".
fn parse_frame_rate(raw: &str) -> Option<f64> {
    match raw.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => raw.trim().parse::<f64>().ok(),
    }
}

#[cfg(test)]
mod test {
    use super::parse_frame_rate;

    #[test]
    fn test_parse_fractional_frame_rate() {
        let fps = parse_frame_rate("30000/1001").unwrap();
        assert!((fps - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_parse_integer_frame_rate() {
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert_eq!(parse_frame_rate("24"), Some(24.0));
    }

    #[test]
    fn test_zero_denominator_is_rejected() {
        assert_eq!(parse_frame_rate("0/0"), None);
    }
}
