use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

use log::warn;
use media_probe::{MediaInfo, MediaProbeError};
use thiserror::Error;

use crate::{
    definitions::{
        AUDIO_PREFIX_SECS, AUDIO_SAMPLE_RATE, DECODE_TIMEOUT_SECS, FRAME_SAMPLE_OFFSETS, HASH_SIZE,
    },
    AudioSignature, ExtractionResult, FrameHash, VideoFingerprint,
};

/// An error that prevented a fingerprint from being created.
///
/// All variants describe a problem with one input file; none of them
/// should abort a batch. `FileNotFound` and `Decode` are distinct because
/// a vanished file needs no attention while an undecodable one may warrant
/// repair by the operator.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Could not decode {path}: {src}")]
    Decode {
        path: PathBuf,
        #[source]
        src: MediaProbeError,
    },

    #[error("Invalid duration ({duration}s) for {path}")]
    InvalidDuration { path: PathBuf, duration: f64 },

    #[error("I/O error for {path}: {src}")]
    Io {
        path: PathBuf,
        #[source]
        src: std::io::Error,
    },
}

/// How videos are sampled when building fingerprints.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorOptions {
    /// Fractions of the duration at which one frame is sampled and
    /// hashed. Every file in a comparable set must use the same schedule.
    pub sample_offsets: Vec<f64>,

    /// Upper bound on the audio prefix analysed for the audio signature.
    /// Unit: seconds.
    pub audio_prefix_secs: f64,

    /// Per-invocation decode timeout. Unit: seconds.
    pub decode_timeout_secs: u64,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            sample_offsets: FRAME_SAMPLE_OFFSETS.to_vec(),
            audio_prefix_secs: AUDIO_PREFIX_SECS,
            decode_timeout_secs: DECODE_TIMEOUT_SECS,
        }
    }
}

/// Turns video files into [`VideoFingerprint`]s.
///
/// Read-only: extraction decodes but never modifies the source file.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    options: ExtractorOptions,
}

impl FeatureExtractor {
    /// An extractor with non-default sampling options. Fingerprints made
    /// with different options are not comparable; use one extractor (or
    /// at least one option set) per collection.
    #[must_use]
    pub fn from_options(options: ExtractorOptions) -> Self {
        assert!(
            !options.sample_offsets.is_empty(),
            "at least one sample offset is required"
        );
        Self { options }
    }

    /// Fingerprint the video file at `src_path`.
    ///
    /// Audio analysis is allowed to fail without failing the whole file:
    /// the fingerprint then simply carries no audio signature. Everything
    /// else (metadata probe, any frame grab) is required.
    ///
    /// # Errors
    /// * [`ExtractionError::FileNotFound`] when the path does not exist.
    /// * [`ExtractionError::Decode`] when ffprobe/ffmpeg cannot read it.
    /// * [`ExtractionError::InvalidDuration`] when the reported duration
    ///   is not a positive number.
    pub fn extract(&self, src_path: impl AsRef<Path>) -> ExtractionResult<VideoFingerprint> {
        let src_path = src_path.as_ref();

        let src_path = src_path.canonicalize().map_err(|src| {
            if src.kind() == std::io::ErrorKind::NotFound {
                ExtractionError::FileNotFound(src_path.to_path_buf())
            } else {
                ExtractionError::Io {
                    path: src_path.to_path_buf(),
                    src,
                }
            }
        })?;

        let info = MediaInfo::new(&src_path).map_err(|src| self.probe_error(&src_path, src))?;

        let duration = info.duration();
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ExtractionError::InvalidDuration {
                path: src_path,
                duration,
            });
        }

        // Size and mtime come from the same stat so cache validity checks
        // later see a consistent pair.
        let metadata = std::fs::metadata(&src_path).map_err(|src| ExtractionError::Io {
            path: src_path.clone(),
            src,
        })?;
        let file_size = metadata.len();
        let mtime = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        let mut frame_hashes = Vec::with_capacity(self.options.sample_offsets.len());
        for offset in &self.options.sample_offsets {
            let timestamp = offset * duration;
            let frame = media_probe::grab_frame_gray(
                &src_path,
                timestamp,
                HASH_SIZE,
                HASH_SIZE,
                self.options.decode_timeout_secs,
            )
            .map_err(|src| self.probe_error(&src_path, src))?;

            frame_hashes.push(FrameHash::from_gray_frame(&frame));
        }

        let audio_signature = if info.has_audio() {
            self.try_audio_signature(&src_path)
        } else {
            None
        };

        Ok(VideoFingerprint {
            path: src_path,
            duration,
            resolution: info.resolution(),
            frame_rate: info.frame_rate(),
            frame_hashes,
            audio_signature,
            file_size,
            mtime,
        })
    }

    // Audio problems degrade the fingerprint instead of failing it: the
    // duration, resolution and frame-hash signals are still usable.
    fn try_audio_signature(&self, src_path: &Path) -> Option<AudioSignature> {
        let samples = match media_probe::read_audio_prefix(
            src_path,
            self.options.audio_prefix_secs,
            AUDIO_SAMPLE_RATE,
            self.options.decode_timeout_secs,
        ) {
            Ok(samples) => samples,
            Err(e) => {
                warn!(target: "extraction", "audio analysis failed for {}: {e}", src_path.display());
                return None;
            }
        };

        let signature = AudioSignature::from_samples(&samples);
        if signature.is_none() {
            warn!(target: "extraction", "audio track too short to sign: {}", src_path.display());
        }
        signature
    }

    fn probe_error(&self, src_path: &Path, src: MediaProbeError) -> ExtractionError {
        match src {
            MediaProbeError::FileNotFound(path) => ExtractionError::FileNotFound(path),
            src => ExtractionError::Decode {
                path: src_path.to_path_buf(),
                src,
            },
        }
    }
}
