use std::collections::BTreeMap;

use crate::{definitions::SIZE_FASTPATH_REL_TOLERANCE, VideoFingerprint};

/// The relative weight of each similarity signal. Weights must sum to 1.0.
///
/// The defaults put most of the weight on frame-hash agreement (the only
/// signal that looks at actual picture content), with duration next:
/// re-encodes keep their length almost exactly, while resolution often
/// changes, so resolution equality gets less say. Audio is a tie-breaker;
/// note that a missing audio signature on either side scores that signal
/// as zero rather than skipping it, which deliberately penalizes pairs
/// that cannot be compared on audio.
///
/// (An earlier in-house scheme weighted duration 0.4 / resolution 0.2 /
/// frame hash 0.3 / audio 0.1. It over-trusted duration: any two films of
/// similar length started at 0.4. The current weights replace it.)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalWeights {
    pub duration: f64,
    pub resolution: f64,
    pub frame_hash: f64,
    pub audio: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            duration: 0.30,
            resolution: 0.20,
            frame_hash: 0.35,
            audio: 0.15,
        }
    }
}

impl SignalWeights {
    fn sum(&self) -> f64 {
        self.duration + self.resolution + self.frame_hash + self.audio
    }
}

/// The result of comparing two fingerprints: the blended value plus the
/// weighted contribution of each signal (the contributions sum to the
/// value). The breakdown exists so an operator can see *why* two files
/// were or were not matched.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    value: f64,
    breakdown: BTreeMap<&'static str, f64>,
}

impl Score {
    /// The blended similarity in `0.0..=1.0`.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Per-signal weighted contributions, keyed by signal name.
    #[must_use]
    pub fn breakdown(&self) -> &BTreeMap<&'static str, f64> {
        &self.breakdown
    }
}

/// Compares two [`VideoFingerprint`]s. Pure and deterministic;
/// `score(a, b) == score(b, a)` always holds.
///
/// The scorer returns the continuous score, never a yes/no answer.
/// Thresholding belongs to the caller ([`crate::DuplicateGrouper`]), so
/// the same scores can be reused at different strictness levels.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer {
    weights: SignalWeights,
}

impl SimilarityScorer {
    /// A scorer with non-default weights.
    ///
    /// # Panics
    /// If the weights do not sum to 1.0 (a configuration bug, not a
    /// runtime condition).
    #[must_use]
    pub fn with_weights(weights: SignalWeights) -> Self {
        assert!(
            (weights.sum() - 1.0).abs() < 1e-9,
            "signal weights must sum to 1.0, got {}",
            weights.sum()
        );
        Self { weights }
    }

    /// Score the similarity of two fingerprints.
    #[must_use]
    pub fn score(&self, a: &VideoFingerprint, b: &VideoFingerprint) -> Score {
        // Exact and near-exact copies are common enough to deserve a fast
        // path: file sizes within 1% of each other settle the question
        // without touching hashes or audio.
        if relative_size_difference(a.file_size(), b.file_size()) < SIZE_FASTPATH_REL_TOLERANCE {
            return Score {
                value: 1.0,
                breakdown: BTreeMap::from([("identical_size", 1.0)]),
            };
        }

        let duration = duration_similarity(a.duration(), b.duration());
        let resolution = if a.resolution() == b.resolution() {
            1.0
        } else {
            0.0
        };
        let frame_hash = frame_hash_similarity(a, b);
        let audio = match (a.audio_signature(), b.audio_signature()) {
            (Some(sig_a), Some(sig_b)) => sig_a.cosine_similarity(sig_b).max(0.0),
            // Explicitly zero, not skipped: a pair that cannot be compared
            // on audio should not score as high as one that matches on it.
            _ => 0.0,
        };

        let w = &self.weights;
        let breakdown = BTreeMap::from([
            ("duration", w.duration * duration),
            ("resolution", w.resolution * resolution),
            ("frame_hash", w.frame_hash * frame_hash),
            ("audio", w.audio * audio),
        ]);
        let value = breakdown.values().sum();

        Score { value, breakdown }
    }
}

fn relative_size_difference(a: u64, b: u64) -> f64 {
    let max = a.max(b);
    if max == 0 {
        return 0.0;
    }
    a.abs_diff(b) as f64 / max as f64
}

fn duration_similarity(a: f64, b: f64) -> f64 {
    let max = a.max(b);
    if max <= 0.0 {
        return 0.0;
    }
    1.0 - (a - b).abs() / max
}

// Mean positional frame-hash similarity. Pairing is by sample index; both
// fingerprints used the same relative-time schedule, so index i of each
// list is the same relative moment. Lists of different lengths (from a
// different schedule configuration) are compared over the common prefix.
fn frame_hash_similarity(a: &VideoFingerprint, b: &VideoFingerprint) -> f64 {
    let pairs = a.frame_hashes().iter().zip(b.frame_hashes().iter());
    let mut count = 0u32;
    let total: f64 = pairs
        .map(|(ha, hb)| {
            count += 1;
            1.0 - ha.normalized_distance(hb)
        })
        .sum();

    if count == 0 {
        0.0
    } else {
        total / f64::from(count)
    }
}

#[cfg(test)]
mod test {
    use rand::prelude::*;

    use super::{SignalWeights, SimilarityScorer};
    use crate::{AudioSignature, FrameHash, VideoFingerprint};

    fn scorer() -> SimilarityScorer {
        SimilarityScorer::default()
    }

    // Fingerprints whose sizes differ enough to dodge the size fast path.
    fn distinct_sized(duration_a: f64, duration_b: f64) -> (VideoFingerprint, VideoFingerprint) {
        let a = VideoFingerprint::fixture("/vids/a.mp4", duration_a, 1_000_000);
        let b = VideoFingerprint::fixture("/vids/b.mp4", duration_b, 2_000_000);
        (a, b)
    }

    #[test]
    fn test_score_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(11);
        for _i in 0..50 {
            let a = VideoFingerprint::random_fixture("/vids/a.mp4", 90.0, 1_000_000, &mut rng);
            let b = VideoFingerprint::random_fixture("/vids/b.mp4", 100.0, 2_000_000, &mut rng);
            assert_eq!(scorer().score(&a, &b).value(), scorer().score(&b, &a).value());
        }
    }

    #[test]
    fn test_self_score_is_1() {
        let fp = VideoFingerprint::fixture("/vids/a.mp4", 100.0, 1_000_000);
        assert_eq!(scorer().score(&fp, &fp).value(), 1.0);
    }

    #[test]
    fn test_size_fast_path_short_circuits() {
        // 0.5% size difference: everything else about the two files
        // disagrees, but the fast path answers first.
        let mut rng = StdRng::seed_from_u64(12);
        let a = VideoFingerprint::random_fixture("/vids/a.mp4", 100.0, 1_000_000, &mut rng)
            .with_resolution((1920, 1080));
        let b = VideoFingerprint::random_fixture("/vids/b.mp4", 5.0, 1_005_000, &mut rng)
            .with_resolution((640, 480));

        let score = scorer().score(&a, &b);
        assert_eq!(score.value(), 1.0);
        assert_eq!(score.breakdown().len(), 1);
        assert!(score.breakdown().contains_key("identical_size"));
    }

    #[test]
    fn test_near_duplicate_boundary_scenario() {
        // 100s vs 101s, same resolution, identical hashes, no audio:
        // 0.3 * 0.9901 + 0.2 * 1.0 + 0.35 * 1.0 + 0.15 * 0.0 ≈ 0.847,
        // which straddles thresholds 0.85 and 0.80.
        let (a, b) = distinct_sized(100.0, 101.0);
        let score = scorer().score(&a, &b);

        assert!((score.value() - 0.847).abs() < 0.001);
        assert!(score.value() < 0.85);
        assert!(score.value() >= 0.80);

        let breakdown = score.breakdown();
        assert!((breakdown["resolution"] - 0.2).abs() < 1e-9);
        assert!((breakdown["frame_hash"] - 0.35).abs() < 1e-9);
        assert_eq!(breakdown["audio"], 0.0);
    }

    #[test]
    fn test_missing_audio_on_one_side_scores_zero() {
        let (a, b) = distinct_sized(100.0, 100.0);
        let a = a.with_audio(Some(AudioSignature::fixture(1.0)));
        let score = scorer().score(&a, &b);
        assert_eq!(score.breakdown()["audio"], 0.0);
    }

    #[test]
    fn test_matching_audio_contributes_full_weight() {
        let (a, b) = distinct_sized(100.0, 100.0);
        let a = a.with_audio(Some(AudioSignature::fixture(1.0)));
        let b = b.with_audio(Some(AudioSignature::fixture(1.0)));
        let score = scorer().score(&a, &b);
        assert!((score.breakdown()["audio"] - 0.15).abs() < 1e-9);
        assert!((score.value() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_hash_disagreement_lowers_score() {
        let mut rng = StdRng::seed_from_u64(13);
        let (a, b) = distinct_sized(100.0, 100.0);
        let far_hashes = a
            .frame_hashes()
            .iter()
            .map(|h| h.hash_with_distance(32, &mut rng))
            .collect();
        let b = b.with_frame_hashes(far_hashes);

        let score = scorer().score(&a, &b);
        // 32 of 64 bits differ at every position: hash similarity 0.5.
        assert!((score.breakdown()["frame_hash"] - 0.175).abs() < 1e-9);
        assert!(score.value() < 0.85);
    }

    #[test]
    fn test_prefix_comparison_for_unequal_hash_lists() {
        let (a, b) = distinct_sized(100.0, 100.0);
        let mut longer = a.frame_hashes().to_vec();
        longer.push(FrameHash::full_hash());
        let b = b.with_frame_hashes(longer);

        // Common prefix is identical, so the extra trailing hash must not
        // drag the signal down.
        let score = scorer().score(&a, &b);
        assert!((score.breakdown()["frame_hash"] - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_monotonicity() {
        let (a, b) = distinct_sized(100.0, 101.0);
        let value = scorer().score(&a, &b).value();
        assert!(value >= 0.80);
        // Any threshold at or below a passing one also passes.
        for t in [0.80, 0.60, 0.40, 0.0] {
            assert!(value >= t);
        }
    }

    #[test]
    #[should_panic(expected = "signal weights must sum to 1.0")]
    fn test_bad_weights_are_rejected() {
        let _scorer = SimilarityScorer::with_weights(SignalWeights {
            duration: 0.5,
            resolution: 0.5,
            frame_hash: 0.5,
            audio: 0.5,
        });
    }
}
