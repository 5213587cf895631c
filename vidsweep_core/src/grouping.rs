use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    path::{Path, PathBuf},
};

use itertools::Itertools;
use thiserror::Error;

use crate::{IgnoreKey, SimilarityScorer, VideoFingerprint};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("A duplicate group requires at least two entries")]
pub struct TooFewEntries;

/// A set of files judged near-duplicates of one seed file.
///
/// The first entry is the seed; every other entry scored at or above the
/// match threshold *against the seed*. Members are not guaranteed to be
/// pairwise similar to each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    entries: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Build a group from a seed-first list of paths.
    ///
    /// # Errors
    /// [`TooFewEntries`] when fewer than two paths are given; a file with
    /// no counterpart is not a duplicate of anything.
    pub fn new(entries: impl IntoIterator<Item = PathBuf>) -> Result<Self, TooFewEntries> {
        let entries = entries.into_iter().collect_vec();
        if entries.len() < 2 {
            return Err(TooFewEntries);
        }
        Ok(Self { entries })
    }

    /// The file the rest of the group was matched against.
    #[must_use]
    pub fn seed(&self) -> &Path {
        &self.entries[0]
    }

    /// All paths in the group, seed first.
    pub fn members(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(PathBuf::as_path)
    }

    /// The non-seed paths.
    pub fn duplicates(&self) -> impl Iterator<Item = &Path> {
        self.entries[1..].iter().map(PathBuf::as_path)
    }

    /// The number of files in the group. Always at least 2.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Partitions a fingerprint collection into [`DuplicateGroup`]s.
///
/// The search is a single deterministic pass over the collection in path
/// order. Each unvisited fingerprint in turn becomes a candidate seed and
/// claims every later-or-earlier unvisited fingerprint that scores at or
/// above the threshold against it; claimed files never seed or join another
/// group. Determinism matters: the same collection, threshold and ignore
/// set must always produce the same groups in the same order, or review
/// sessions would not be resumable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateGrouper {
    scorer: SimilarityScorer,
}

impl DuplicateGrouper {
    #[must_use]
    pub fn new(scorer: SimilarityScorer) -> Self {
        Self { scorer }
    }

    /// Find all duplicate groups at the given match threshold.
    ///
    /// A file whose [`IgnoreKey`] appears in `ignored` is retired for the
    /// whole pass: it neither seeds a group nor gets claimed as a member
    /// of anyone else's. This is stricter than only suppressing the
    /// seeding role (under which dismissed content would resurface inside
    /// groups with a different seed); other files that would have joined
    /// the dismissed group stay available to later seeds. Files that
    /// match nothing do not appear in the output at all.
    #[must_use]
    pub fn group(
        &self,
        fingerprints: &BTreeMap<PathBuf, VideoFingerprint>,
        threshold: f64,
        ignored: &BTreeSet<IgnoreKey>,
    ) -> Vec<DuplicateGroup> {
        let mut visited: HashSet<&Path> = HashSet::new();
        let mut groups = vec![];

        // Retire dismissed files up front so a path-earlier seed cannot
        // claim one before its own turn in the pass comes around.
        for (path, fp) in fingerprints {
            if ignored.contains(&IgnoreKey::of(fp)) {
                visited.insert(path.as_path());
            }
        }

        for (seed_path, seed_fp) in fingerprints {
            if visited.contains(seed_path.as_path()) {
                continue;
            }

            let matches = fingerprints
                .iter()
                .filter(|(path, _)| *path != seed_path && !visited.contains(path.as_path()))
                .filter(|(_, fp)| self.scorer.score(seed_fp, fp).value() >= threshold)
                .map(|(path, _)| path.clone())
                .collect_vec();

            if matches.is_empty() {
                continue;
            }

            visited.insert(seed_path.as_path());
            for path in &matches {
                // Paths came out of the same map they are looked up in.
                if let Some((key, _)) = fingerprints.get_key_value(path) {
                    visited.insert(key.as_path());
                }
            }

            let entries = std::iter::once(seed_path.clone()).chain(matches);
            if let Ok(group) = DuplicateGroup::new(entries) {
                groups.push(group);
            }
        }

        groups
    }
}

#[cfg(test)]
mod test {
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::PathBuf;

    use super::{DuplicateGroup, DuplicateGrouper, TooFewEntries};
    use crate::{
        AudioSignature, FrameHash, IgnoreKey, SimilarityScorer, VideoFingerprint,
        DEFAULT_MATCH_THRESHOLD,
    };

    fn collection(fps: Vec<VideoFingerprint>) -> BTreeMap<PathBuf, VideoFingerprint> {
        fps.into_iter()
            .map(|fp| (fp.path().to_path_buf(), fp))
            .collect()
    }

    #[test]
    fn test_group_requires_two_entries() {
        let err = DuplicateGroup::new([PathBuf::from("/vids/a.mp4")]).unwrap_err();
        assert_eq!(err, TooFewEntries);
    }

    #[test]
    fn test_singletons_do_not_group() {
        // Wildly different sizes and durations: nothing should match.
        let fps = collection(vec![
            VideoFingerprint::fixture("/vids/a.mp4", 100.0, 1_000_000),
            VideoFingerprint::fixture("/vids/b.mp4", 10.0, 50_000_000),
        ]);

        let groups =
            DuplicateGrouper::default().group(&fps, DEFAULT_MATCH_THRESHOLD, &BTreeSet::new());
        assert!(groups.is_empty());
    }

    #[test]
    fn test_identical_sizes_group_together() {
        let fps = collection(vec![
            VideoFingerprint::fixture("/vids/a.mp4", 100.0, 1_000_000),
            VideoFingerprint::fixture("/vids/b.mp4", 100.0, 1_000_000),
            VideoFingerprint::fixture("/vids/unrelated.mp4", 7.0, 999_000_000),
        ]);

        let groups =
            DuplicateGrouper::default().group(&fps, DEFAULT_MATCH_THRESHOLD, &BTreeSet::new());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].seed(), PathBuf::from("/vids/a.mp4"));
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let fps = collection(vec![
            VideoFingerprint::fixture("/vids/c.mp4", 100.0, 1_000_000),
            VideoFingerprint::fixture("/vids/a.mp4", 100.0, 1_000_000),
            VideoFingerprint::fixture("/vids/b.mp4", 100.0, 1_000_000),
        ]);

        for _i in 0..10 {
            let groups =
                DuplicateGrouper::default().group(&fps, DEFAULT_MATCH_THRESHOLD, &BTreeSet::new());
            assert_eq!(groups.len(), 1);
            // Insertion order above was c, a, b; iteration is path order.
            let members: Vec<_> = groups[0].members().collect();
            assert_eq!(
                members,
                ["/vids/a.mp4", "/vids/b.mp4", "/vids/c.mp4"].map(PathBuf::from)
            );
        }
    }

    #[test]
    fn test_members_match_the_seed_not_each_other() {
        // b and c are both within range of a but out of range of each
        // other: the output is the star around a, emitted once.
        let near = FrameHash::from_hex("ffff000000000000").unwrap();
        let far = FrameHash::from_hex("0000ffff00000000").unwrap();
        let audio = Some(AudioSignature::fixture(1.0));

        let a = VideoFingerprint::fixture("/vids/a.mp4", 100.0, 1_000_000)
            .with_audio(audio.clone());
        let b = VideoFingerprint::fixture("/vids/b.mp4", 100.0, 2_000_000)
            .with_frame_hashes(vec![near; 3])
            .with_audio(audio.clone());
        let c = VideoFingerprint::fixture("/vids/c.mp4", 100.0, 3_000_000)
            .with_frame_hashes(vec![far; 3])
            .with_audio(audio);

        let scorer = SimilarityScorer::default();
        assert!(scorer.score(&a, &b).value() >= DEFAULT_MATCH_THRESHOLD);
        assert!(scorer.score(&a, &c).value() >= DEFAULT_MATCH_THRESHOLD);
        assert!(scorer.score(&b, &c).value() < DEFAULT_MATCH_THRESHOLD);

        let fps = collection(vec![a, b, c]);
        let groups =
            DuplicateGrouper::default().group(&fps, DEFAULT_MATCH_THRESHOLD, &BTreeSet::new());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].seed(), PathBuf::from("/vids/a.mp4"));
        assert_eq!(groups[0].len(), 3);
    }

    #[test]
    fn test_ignored_seed_forms_no_group() {
        let a = VideoFingerprint::fixture("/vids/a.mp4", 100.0, 1_000_000);
        let ignored = BTreeSet::from([IgnoreKey::of(&a)]);
        let fps = collection(vec![
            a,
            VideoFingerprint::fixture("/vids/b.mp4", 100.0, 1_000_000),
        ]);

        // b carries the same content as a and so the same key: the
        // dismissal retires both, leaving nothing to group.
        let groups = DuplicateGrouper::default().group(&fps, DEFAULT_MATCH_THRESHOLD, &ignored);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_ignored_file_never_joins_a_group() {
        // b's key is dismissed; even a, which comes first in path order
        // and would otherwise claim b, must not pull it in.
        let near = FrameHash::from_hex("f000000000000000").unwrap();
        let b = VideoFingerprint::fixture("/vids/b.mp4", 100.0, 1_000_000)
            .with_frame_hashes(vec![near; 3]);
        let ignored = BTreeSet::from([IgnoreKey::of(&b)]);

        let fps = collection(vec![
            VideoFingerprint::fixture("/vids/a.mp4", 100.0, 1_000_000),
            b,
            VideoFingerprint::fixture("/vids/c.mp4", 100.0, 1_000_000),
        ]);

        let groups = DuplicateGrouper::default().group(&fps, DEFAULT_MATCH_THRESHOLD, &ignored);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        assert!(!groups[0].members().any(|p| p.ends_with("b.mp4")));
    }

    #[test]
    fn test_claimed_member_cannot_seed_another_group() {
        // a claims b; b must not later seed a group of its own.
        let fps = collection(vec![
            VideoFingerprint::fixture("/vids/a.mp4", 100.0, 1_000_000),
            VideoFingerprint::fixture("/vids/b.mp4", 100.0, 1_000_000),
        ]);

        let groups =
            DuplicateGrouper::default().group(&fps, DEFAULT_MATCH_THRESHOLD, &BTreeSet::new());
        assert_eq!(groups.len(), 1);
    }
}
