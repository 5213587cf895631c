/// Relative positions (fractions of total duration) at which one frame is
/// sampled and hashed. The schedule is identical for every file, so hash
/// lists are positionally comparable regardless of video length.
pub const FRAME_SAMPLE_OFFSETS: [f64; 3] = [0.1, 0.5, 0.9];

/// Side length of the thumbnail a frame is reduced to before hashing.
/// The hash carries `HASH_SIZE * HASH_SIZE` bits.
pub const HASH_SIZE: u32 = 8;

pub(crate) const HASH_BITS: u32 = HASH_SIZE * HASH_SIZE;
pub(crate) const HASH_WORDS: usize = HASH_BITS.div_ceil(u64::BITS) as usize;

/// At most this much of the audio track is decoded for the audio
/// signature. Bounding the prefix keeps extraction cost independent of
/// video length.
pub const AUDIO_PREFIX_SECS: f64 = 30.0;

/// Sample rate the audio prefix is resampled to before analysis.
pub const AUDIO_SAMPLE_RATE: u32 = 22_050;

/// Length of the audio signature vector.
pub const AUDIO_BANDS: usize = 20;

/// The default score threshold above which two videos are considered
/// duplicates. A value of 1.0 only matches (near-)identical files; lower
/// values match more aggressively. Lower this if re-encoded copies slip
/// through, raise it if there are too many false positives.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.85;

/// Two files whose sizes differ by less than this relative fraction are
/// treated as exact copies without comparing content signals.
pub(crate) const SIZE_FASTPATH_REL_TOLERANCE: f64 = 0.01;

/// Upper bound on any single ffmpeg/ffprobe invocation, so one hanging
/// file cannot stall a whole extraction run.
pub const DECODE_TIMEOUT_SECS: u64 = 120;
