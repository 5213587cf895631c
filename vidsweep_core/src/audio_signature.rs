use rustdct::DctPlanner;
use serde::{Deserialize, Serialize};

use crate::definitions::AUDIO_BANDS;

/// A compact signature of an audio track prefix.
///
/// The decoded mono samples are split into [`AUDIO_BANDS`] equal segments,
/// each reduced to its log RMS energy, and the energy envelope is
/// decorrelated with a DCT-II (a coarse cepstrum). Two signatures of the
/// same length are compared by cosine similarity.
///
/// Persisted as a plain list of numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioSignature(Vec<f32>);

impl AudioSignature {
    /// Build a signature from decoded mono PCM samples.
    ///
    /// Returns `None` when there are too few samples to fill every band,
    /// which callers treat the same as any other audio-analysis failure.
    #[must_use]
    pub fn from_samples(samples: &[i16]) -> Option<Self> {
        if samples.len() < AUDIO_BANDS {
            return None;
        }

        let segment_len = samples.len() / AUDIO_BANDS;
        let mut bands: Vec<f64> = samples
            .chunks_exact(segment_len)
            .take(AUDIO_BANDS)
            .map(|segment| {
                let power: f64 = segment
                    .iter()
                    .map(|&s| {
                        let s = f64::from(s) / f64::from(i16::MAX);
                        s * s
                    })
                    .sum();
                let rms = (power / segment.len() as f64).sqrt();
                (1.0 + rms).ln()
            })
            .collect();

        let mut planner = DctPlanner::new();
        let dct = planner.plan_dct2(AUDIO_BANDS);
        dct.process_dct2(&mut bands);

        Some(Self(bands.iter().map(|&v| v as f32).collect()))
    }

    /// Cosine similarity to another signature, in `-1.0..=1.0` for
    /// comparable vectors. Signatures of different lengths (from a
    /// different analysis configuration) or degenerate all-zero vectors
    /// compare as 0.0.
    #[must_use]
    pub fn cosine_similarity(&self, other: &Self) -> f64 {
        if self.0.len() != other.0.len() {
            return 0.0;
        }

        let mut dot = 0.0f64;
        let mut norm_a = 0.0f64;
        let mut norm_b = 0.0f64;
        for (&a, &b) in self.0.iter().zip(other.0.iter()) {
            let (a, b) = (f64::from(a), f64::from(b));
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a.sqrt() * norm_b.sqrt())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[doc(hidden)]
#[cfg(any(feature = "test-util", test))]
pub mod test_util {
    use super::AudioSignature;
    use crate::definitions::AUDIO_BANDS;

    impl AudioSignature {
        #[must_use]
        pub fn fixture(seed: f32) -> Self {
            Self((0..AUDIO_BANDS).map(|i| seed + i as f32).collect())
        }
    }
}

#[cfg(test)]
mod test {
    use super::AudioSignature;
    use crate::definitions::AUDIO_BANDS;

    fn tone(frequency: f64, secs: f64) -> Vec<i16> {
        let rate = 22_050.0;
        (0..(rate * secs) as usize)
            .map(|i| {
                let t = i as f64 / rate;
                ((t * frequency * std::f64::consts::TAU).sin() * 20_000.0) as i16
            })
            .collect()
    }

    #[test]
    fn test_signature_has_fixed_length() {
        let sig = AudioSignature::from_samples(&tone(440.0, 1.0)).unwrap();
        assert_eq!(sig.len(), AUDIO_BANDS);
    }

    #[test]
    fn test_identical_audio_has_similarity_1() {
        let sig = AudioSignature::from_samples(&tone(440.0, 1.0)).unwrap();
        assert!((sig.cosine_similarity(&sig) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let a = AudioSignature::from_samples(&tone(440.0, 1.0)).unwrap();
        let b = AudioSignature::from_samples(&tone(880.0, 1.0)).unwrap();
        assert!((a.cosine_similarity(&b) - b.cosine_similarity(&a)).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_samples_yields_none() {
        let samples = vec![0i16; AUDIO_BANDS - 1];
        assert!(AudioSignature::from_samples(&samples).is_none());
    }

    #[test]
    fn test_silence_compares_as_zero() {
        let silence = AudioSignature::from_samples(&vec![0i16; 22_050]).unwrap();
        let sig = AudioSignature::from_samples(&tone(440.0, 1.0)).unwrap();
        assert_eq!(silence.cosine_similarity(&sig), 0.0);
    }

    #[test]
    fn test_mismatched_lengths_compare_as_zero() {
        let a = AudioSignature::fixture(1.0);
        let b = AudioSignature(vec![1.0; AUDIO_BANDS + 1]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }
}
