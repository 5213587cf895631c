#![allow(clippy::let_and_return)]
#![allow(clippy::len_without_is_empty)]
#![warn(clippy::cast_lossless)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::todo)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::doc_markdown)]

//! # Overview
//! `vidsweep_core` finds near-duplicate video files. A near-duplicate is a
//! file that closely resembles another but may differ in format, container,
//! quality, or encoder settings.
//!
//! Each candidate file is summarized into a [`VideoFingerprint`]: duration,
//! resolution, frame rate, a perceptual hash of one frame at 10%, 50% and
//! 90% of the runtime, and (when an audio track exists) a compact audio
//! signature of the first 30 seconds. Two fingerprints are compared by
//! [`SimilarityScorer`], which blends the per-signal similarities into a
//! single score in `0.0..=1.0`, and [`DuplicateGrouper`] partitions a whole
//! fingerprint set into groups of files worth reviewing together.
//!
//! ```rust,no_run
//! use std::collections::{BTreeMap, BTreeSet};
//! use vidsweep_core::{DuplicateGrouper, FeatureExtractor, DEFAULT_MATCH_THRESHOLD};
//!
//! let extractor = FeatureExtractor::default();
//! let mut fingerprints = BTreeMap::new();
//! for path in ["/vids/cat.1.mp4", "/vids/cat.2.webm", "/vids/dog.mp4"] {
//!     match extractor.extract(path) {
//!         Ok(fp) => {
//!             fingerprints.insert(fp.path().to_path_buf(), fp);
//!         }
//!         Err(e) => eprintln!("skipping {path}: {e}"),
//!     }
//! }
//!
//! let grouper = DuplicateGrouper::default();
//! let groups = grouper.group(&fingerprints, DEFAULT_MATCH_THRESHOLD, &BTreeSet::new());
//! for group in groups {
//!     println!("{} files look alike", group.len());
//! }
//! ```
//!
//! # Prerequisites
//! Fingerprinting shells out to ffmpeg and ffprobe (via the `media_probe`
//! crate). Both must be available on `PATH`.
//!
//! # How matching works
//! Frame hashes are sampled at fixed *fractions* of the duration, so index
//! `i` of any two hash lists refers to the same relative moment and the
//! lists are positionally comparable across videos of different lengths.
//! The blended score weights the frame-hash signal most heavily; duration,
//! resolution equality, and audio similarity make up the rest. Files whose
//! sizes differ by less than 1% short-circuit to a perfect score without
//! any hash comparison.
//!
//! Grouping is a deterministic single pass: the first unvisited file (in
//! path order) seeds a group containing every other unvisited file similar
//! to *it*. Members are guaranteed similar to the seed, not pairwise to
//! each other. This star-shaped approximation is intentional; it keeps the
//! search a cheap O(n²) over in-memory fingerprints and matches how the
//! results are reviewed (one group at a time, against the seed).

mod audio_signature;
mod definitions;
mod extractor;
mod fingerprint;
mod frame_hash;
mod grouping;
mod ignore_key;
mod scoring;

pub use audio_signature::AudioSignature;
pub use definitions::{
    AUDIO_BANDS, AUDIO_PREFIX_SECS, AUDIO_SAMPLE_RATE, DECODE_TIMEOUT_SECS,
    DEFAULT_MATCH_THRESHOLD, FRAME_SAMPLE_OFFSETS, HASH_SIZE,
};
pub use extractor::{ExtractionError, ExtractorOptions, FeatureExtractor};
pub use fingerprint::VideoFingerprint;
pub use frame_hash::{FrameHash, ParseFrameHashError};
pub use grouping::{DuplicateGroup, DuplicateGrouper, TooFewEntries};
pub use ignore_key::IgnoreKey;
pub use scoring::{Score, SignalWeights, SimilarityScorer};

type ExtractionResult<T> = Result<T, ExtractionError>;
