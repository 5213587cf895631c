use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

use serde::{Deserialize, Serialize};

use crate::{AudioSignature, FrameHash};

/// The extracted, comparable summary of one video file.
///
/// Immutable once computed: when the underlying file changes the whole
/// fingerprint is recomputed, never patched. `file_size` and `mtime` exist
/// only so a cache can tell whether the fingerprint still describes the
/// file on disk; they carry no similarity meaning of their own (although
/// near-equal sizes are used as a fast path by the scorer).
///
/// Invariant: `frame_hashes` is non-empty. An extraction that produced no
/// hashes failed; it never yields a fingerprint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoFingerprint {
    pub(crate) path: PathBuf,
    pub(crate) duration: f64,
    pub(crate) resolution: (u32, u32),
    pub(crate) frame_rate: f64,
    pub(crate) frame_hashes: Vec<FrameHash>,
    pub(crate) audio_signature: Option<AudioSignature>,
    pub(crate) file_size: u64,
    pub(crate) mtime: SystemTime,
}

impl VideoFingerprint {
    /// The canonical absolute path of the fingerprinted file. This is the
    /// fingerprint's identity key.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Duration in seconds. Always greater than zero.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[must_use]
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    #[must_use]
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Perceptual hashes in sample order. Index `i` of any two
    /// fingerprints refers to the same relative moment of playback.
    #[must_use]
    pub fn frame_hashes(&self) -> &[FrameHash] {
        &self.frame_hashes
    }

    /// Present iff the file has an audio stream and audio analysis
    /// succeeded.
    #[must_use]
    pub fn audio_signature(&self) -> Option<&AudioSignature> {
        self.audio_signature.as_ref()
    }

    /// Size of the file at capture time, in bytes.
    #[must_use]
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Modification time of the file at capture time.
    #[must_use]
    pub fn mtime(&self) -> SystemTime {
        self.mtime
    }
}

//Utilities for testing
#[doc(hidden)]
#[cfg(any(feature = "test-util", test))]
pub mod test_util {
    use super::*;
    use crate::definitions::FRAME_SAMPLE_OFFSETS;
    use rand::prelude::*;

    impl VideoFingerprint {
        /// A plain fingerprint with all-zero frame hashes and no audio.
        #[must_use]
        pub fn fixture(path: impl AsRef<Path>, duration: f64, file_size: u64) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
                duration,
                resolution: (1920, 1080),
                frame_rate: 25.0,
                frame_hashes: vec![FrameHash::empty_hash(); FRAME_SAMPLE_OFFSETS.len()],
                audio_signature: None,
                file_size,
                mtime: SystemTime::UNIX_EPOCH,
            }
        }

        /// A fingerprint with randomized frame hashes, useful as a
        /// "definitely unrelated" counterpart.
        #[must_use]
        pub fn random_fixture(
            path: impl AsRef<Path>,
            duration: f64,
            file_size: u64,
            rng: &mut StdRng,
        ) -> Self {
            let mut ret = Self::fixture(path, duration, file_size);
            ret.frame_hashes = (0..FRAME_SAMPLE_OFFSETS.len())
                .map(|_| FrameHash::random_hash(rng))
                .collect();
            ret
        }

        #[must_use]
        pub fn with_duration(mut self, duration: f64) -> Self {
            self.duration = duration;
            self
        }

        #[must_use]
        pub fn with_resolution(mut self, resolution: (u32, u32)) -> Self {
            self.resolution = resolution;
            self
        }

        #[must_use]
        pub fn with_file_size(mut self, file_size: u64) -> Self {
            self.file_size = file_size;
            self
        }

        #[must_use]
        pub fn with_mtime(mut self, mtime: SystemTime) -> Self {
            self.mtime = mtime;
            self
        }

        #[must_use]
        pub fn with_frame_hashes(mut self, frame_hashes: Vec<FrameHash>) -> Self {
            self.frame_hashes = frame_hashes;
            self
        }

        #[must_use]
        pub fn with_audio(mut self, audio_signature: Option<AudioSignature>) -> Self {
            self.audio_signature = audio_signature;
            self
        }
    }
}
