use serde::{Deserialize, Serialize};

use crate::VideoFingerprint;

/// Content-derived identity of a dismissed duplicate group.
///
/// When the operator chooses never to see a group again, the decision must
/// survive renames, cache resets, and re-extraction. Paths are therefore
/// useless as a key; instead the key is built from what the seed file *is*:
/// its duration (rounded to milliseconds so a float round-trip through
/// storage cannot change the key) plus the ordered hex encodings of its
/// frame hashes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IgnoreKey {
    duration_millis: u64,
    frame_hashes: Vec<String>,
}

impl IgnoreKey {
    #[must_use]
    pub fn of(fingerprint: &VideoFingerprint) -> Self {
        Self {
            duration_millis: (fingerprint.duration() * 1000.0).round() as u64,
            frame_hashes: fingerprint
                .frame_hashes()
                .iter()
                .map(|h| h.to_hex())
                .collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::IgnoreKey;
    use crate::{FrameHash, VideoFingerprint};
    use rand::prelude::*;

    #[test]
    fn test_key_is_stable_across_paths_and_metadata() {
        let mut rng = StdRng::seed_from_u64(7);
        let hashes = (0..3)
            .map(|_| FrameHash::random_hash(&mut rng))
            .collect::<Vec<_>>();

        let a = VideoFingerprint::fixture("/old/name.mp4", 100.0, 1_000)
            .with_frame_hashes(hashes.clone());
        let b = VideoFingerprint::fixture("/new/name.mkv", 100.0, 2_000)
            .with_resolution((640, 480))
            .with_frame_hashes(hashes);

        assert_eq!(IgnoreKey::of(&a), IgnoreKey::of(&b));
    }

    #[test]
    fn test_key_distinguishes_content() {
        let mut rng = StdRng::seed_from_u64(8);
        let a = VideoFingerprint::random_fixture("/vids/a.mp4", 100.0, 1_000, &mut rng);
        let b = VideoFingerprint::random_fixture("/vids/a.mp4", 100.0, 1_000, &mut rng);
        assert_ne!(IgnoreKey::of(&a), IgnoreKey::of(&b));
    }

    #[test]
    fn test_key_serde_round_trip() {
        let fp = VideoFingerprint::fixture("/vids/a.mp4", 123.456, 1_000);
        let key = IgnoreKey::of(&fp);
        let json = serde_json::to_string(&key).unwrap();
        let back: IgnoreKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, back);
    }
}
