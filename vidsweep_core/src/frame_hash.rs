use std::fmt;

use bitvec::prelude::*;
use image::{imageops::FilterType, GrayImage};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::definitions::{HASH_BITS, HASH_SIZE, HASH_WORDS};

/// A perceptual hash of a single video frame.
///
/// The frame is reduced to an 8x8 grayscale thumbnail and each bit records
/// whether the corresponding pixel is brighter than the thumbnail mean
/// (an average hash). Visually similar frames produce hashes with a small
/// Hamming distance.
///
/// In memory the hash is a fixed-length bit vector. It crosses persistence
/// boundaries as its canonical 16-digit hex string; that conversion lives
/// here, in the serde impls, and nowhere near the scoring logic.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct FrameHash {
    bits: [u64; HASH_WORDS],
}

impl FrameHash {
    /// Hash a grayscale frame. Frames of any size are accepted; anything
    /// that is not already `HASH_SIZE` square is resized first.
    #[must_use]
    pub fn from_gray_frame(frame: &GrayImage) -> Self {
        let thumb: GrayImage = if frame.dimensions() == (HASH_SIZE, HASH_SIZE) {
            frame.clone()
        } else {
            image::imageops::resize(frame, HASH_SIZE, HASH_SIZE, FilterType::Triangle)
        };

        let total: u32 = thumb.pixels().map(|p| u32::from(p.0[0])).sum();
        let mean = total / (HASH_SIZE * HASH_SIZE);

        let mut bitarr: BitArray<[u64; HASH_WORDS], Lsb0> = BitArray::ZERO;
        for (mut bit, pixel) in bitarr.iter_mut().zip(thumb.pixels()) {
            *bit = u32::from(pixel.0[0]) > mean;
        }

        Self {
            bits: bitarr.into_inner(),
        }
    }

    /// The raw Hamming distance to another hash.
    #[must_use]
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        self.bits
            .iter()
            .zip(other.bits.iter())
            .fold(0, |acc, (x, y)| acc + (x ^ y).count_ones())
    }

    /// The Hamming distance normalized into `0.0..=1.0`.
    #[must_use]
    pub fn normalized_distance(&self, other: &Self) -> f64 {
        f64::from(self.hamming_distance(other)) / f64::from(HASH_BITS)
    }

    /// The canonical hex encoding, 16 lowercase digits per 64-bit word.
    #[must_use]
    pub fn to_hex(&self) -> String {
        use fmt::Write;
        let mut out = String::with_capacity(HASH_WORDS * 16);
        for word in &self.bits {
            let _ = write!(out, "{word:016x}");
        }
        out
    }

    /// Parse the canonical hex encoding produced by [`FrameHash::to_hex`].
    pub fn from_hex(raw: &str) -> Result<Self, ParseFrameHashError> {
        if raw.len() != HASH_WORDS * 16 {
            return Err(ParseFrameHashError(raw.to_string()));
        }

        let mut bits = [0u64; HASH_WORDS];
        for (i, word) in bits.iter_mut().enumerate() {
            let digits = &raw[i * 16..(i + 1) * 16];
            *word = u64::from_str_radix(digits, 16)
                .map_err(|_| ParseFrameHashError(raw.to_string()))?;
        }

        Ok(Self { bits })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Not a valid frame hash encoding: {0}")]
pub struct ParseFrameHashError(String);

impl Serialize for FrameHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FrameHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(de::Error::custom)
    }
}

//Utilities for testing
#[doc(hidden)]
#[cfg(any(feature = "test-util", test))]
pub mod test_util {
    use super::*;
    use rand::prelude::*;

    impl FrameHash {
        #[must_use]
        pub fn empty_hash() -> Self {
            Self {
                bits: [0; HASH_WORDS],
            }
        }

        #[must_use]
        pub fn full_hash() -> Self {
            let mut bitarr: BitArray<[u64; HASH_WORDS], Lsb0> = BitArray::ZERO;
            for mut bit in bitarr.iter_mut().take(HASH_BITS as usize) {
                *bit = true;
            }
            Self {
                bits: bitarr.into_inner(),
            }
        }

        pub fn random_hash(rng: &mut StdRng) -> Self {
            let mut bitarr: BitArray<[u64; HASH_WORDS], Lsb0> = BitArray::ZERO;
            for mut bit in bitarr.iter_mut().take(HASH_BITS as usize) {
                *bit = rng.gen_bool(0.5);
            }
            Self {
                bits: bitarr.into_inner(),
            }
        }

        //flip bits until the hash is exactly target_distance away from self.
        #[must_use]
        pub fn hash_with_distance(&self, target_distance: u32, rng: &mut StdRng) -> Self {
            let mut ret = *self;
            while self.hamming_distance(&ret) < target_distance {
                let chosen_bit = rng.gen_range(0..HASH_BITS);
                ret.bits[(chosen_bit / u64::BITS) as usize] ^= 1u64 << (chosen_bit % u64::BITS);
            }
            assert_eq!(self.hamming_distance(&ret), target_distance);
            ret
        }
    }
}
