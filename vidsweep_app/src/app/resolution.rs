use std::{collections::BTreeMap, path::PathBuf};

use vidsweep_cache::IgnoreList;
use vidsweep_core::{DuplicateGroup, IgnoreKey, VideoFingerprint};

use crate::app::trash::TrashDir;

/// What the operator decided to do with one presented group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Keep the entry at this index; trash every other member.
    Keep(usize),
    /// Leave the group alone this run; it will come back next run.
    Skip,
    /// Never show this group again.
    Ignore,
    /// Stop the whole session. Remaining groups are never presented.
    Quit,
}

/// Where decisions come from. The interactive prompt implements this for
/// a human; tests drive the workflow with a scripted implementation.
pub trait DecisionSource {
    fn decide(&mut self, group: &GroupView) -> Decision;
}

/// One group member as presented to the operator.
pub struct GroupEntry {
    pub path: PathBuf,
    pub file_size: u64,
    pub duration: f64,
    pub resolution: (u32, u32),
}

/// A duplicate group joined with the display facts a decision needs.
/// Entry 0 is always the group's seed.
pub struct GroupView {
    entries: Vec<GroupEntry>,
}

impl GroupView {
    pub fn of(
        group: &DuplicateGroup,
        fingerprints: &BTreeMap<PathBuf, VideoFingerprint>,
    ) -> Self {
        let entries = group
            .members()
            .filter_map(|path| fingerprints.get(path))
            .map(|fp| GroupEntry {
                path: fp.path().to_path_buf(),
                file_size: fp.file_size(),
                duration: fp.duration(),
                resolution: fp.resolution(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[GroupEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Totals for the whole session, reported once at the end.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub groups_presented: usize,
    pub groups_ignored: usize,
    pub groups_skipped: usize,
    pub files_trashed: usize,
    pub bytes_reclaimed: u64,
    pub trash_failures: usize,
    pub aborted: bool,
}

/// Drives the interactive resolution of duplicate groups.
///
/// Strictly sequential: one group at a time, blocking on its decision.
/// Every ignore decision hits disk before the next group is presented, so
/// quitting (or crashing) at any point loses nothing already decided.
pub struct ResolutionWorkflow<'a> {
    trash: &'a TrashDir,
    ignore_list: &'a IgnoreList,
}

impl<'a> ResolutionWorkflow<'a> {
    pub fn new(trash: &'a TrashDir, ignore_list: &'a IgnoreList) -> Self {
        Self { trash, ignore_list }
    }

    pub fn run(
        &self,
        groups: &[DuplicateGroup],
        fingerprints: &BTreeMap<PathBuf, VideoFingerprint>,
        decisions: &mut dyn DecisionSource,
    ) -> Result<RunSummary, vidsweep_cache::CacheError> {
        let mut summary = RunSummary::default();

        for group in groups {
            let view = GroupView::of(group, fingerprints);
            if view.len() < 2 {
                // A member vanished between grouping and presentation.
                continue;
            }

            summary.groups_presented += 1;

            match decisions.decide(&view) {
                Decision::Keep(kept_idx) if kept_idx < view.len() => {
                    self.trash_all_but(&view, kept_idx, &mut summary);
                }
                Decision::Keep(bad_idx) => {
                    warn!("no file numbered {bad_idx} in this group; skipping it");
                    summary.groups_skipped += 1;
                }
                Decision::Ignore => {
                    if let Some(seed_fp) = fingerprints.get(group.seed()) {
                        self.ignore_list.insert(IgnoreKey::of(seed_fp))?;
                        summary.groups_ignored += 1;
                    }
                }
                Decision::Skip => {
                    summary.groups_skipped += 1;
                }
                Decision::Quit => {
                    summary.aborted = true;
                    break;
                }
            }
        }

        Ok(summary)
    }

    // A failed trash leaves that file in place and moves on; the rest of
    // the group (and the rest of the run) is unaffected.
    fn trash_all_but(&self, view: &GroupView, kept_idx: usize, summary: &mut RunSummary) {
        for (idx, entry) in view.entries().iter().enumerate() {
            if idx == kept_idx {
                continue;
            }

            match self.trash.trash(&entry.path) {
                Ok(reclaimed) => {
                    info!("trashed {}", entry.path.display());
                    summary.files_trashed += 1;
                    summary.bytes_reclaimed += reclaimed;
                }
                Err(e) => {
                    error!("{e}");
                    summary.trash_failures += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::{BTreeMap, VecDeque};
    use std::path::PathBuf;

    use vidsweep_cache::IgnoreList;
    use vidsweep_core::{DuplicateGroup, IgnoreKey, VideoFingerprint};

    use super::{Decision, DecisionSource, GroupView, ResolutionWorkflow};
    use crate::app::trash::TrashDir;

    struct Scripted(VecDeque<Decision>);

    impl DecisionSource for Scripted {
        fn decide(&mut self, _group: &GroupView) -> Decision {
            self.0.pop_front().unwrap_or(Decision::Quit)
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        trash: TrashDir,
        ignore_list: IgnoreList,
        fingerprints: BTreeMap<PathBuf, VideoFingerprint>,
        groups: Vec<DuplicateGroup>,
    }

    // Two duplicate groups of two real files each, sized 10 and 20 bytes
    // per file.
    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();

        let mut fingerprints = BTreeMap::new();
        let mut groups = vec![];
        for (group_no, size) in [(0u8, 10usize), (1, 20)] {
            let mut members = vec![];
            for name in ["a", "b"] {
                let path = dir.path().join(format!("{group_no}_{name}.mp4"));
                std::fs::write(&path, vec![b'x'; size]).unwrap();
                fingerprints.insert(
                    path.clone(),
                    VideoFingerprint::fixture(&path, 100.0 + f64::from(group_no), size as u64),
                );
                members.push(path);
            }
            groups.push(DuplicateGroup::new(members).unwrap());
        }

        Fixture {
            trash: TrashDir::new(dir.path().join("trash")),
            ignore_list: IgnoreList::load(dir.path().join("ignored.json")).unwrap(),
            fingerprints,
            groups,
            _dir: dir,
        }
    }

    #[test]
    fn test_keep_trashes_the_rest_and_counts_bytes() {
        let fx = fixture();
        let workflow = ResolutionWorkflow::new(&fx.trash, &fx.ignore_list);

        let mut decisions = Scripted(VecDeque::from([Decision::Keep(0), Decision::Keep(1)]));
        let summary = workflow
            .run(&fx.groups, &fx.fingerprints, &mut decisions)
            .unwrap();

        assert_eq!(summary.files_trashed, 2);
        assert_eq!(summary.bytes_reclaimed, 10 + 20);
        assert_eq!(summary.trash_failures, 0);
        // Kept files stay; trashed ones are gone from their home.
        assert!(fx.groups[0].seed().exists());
        assert!(!fx.groups[1].seed().exists());
    }

    #[test]
    fn test_ignore_persists_before_the_next_group() {
        let fx = fixture();
        let workflow = ResolutionWorkflow::new(&fx.trash, &fx.ignore_list);

        let mut decisions = Scripted(VecDeque::from([Decision::Ignore, Decision::Quit]));
        let summary = workflow
            .run(&fx.groups, &fx.fingerprints, &mut decisions)
            .unwrap();

        assert_eq!(summary.groups_ignored, 1);
        assert!(summary.aborted);

        // A separate load sees the dismissal: it was written through.
        let reloaded = IgnoreList::load(fx._dir.path().join("ignored.json")).unwrap();
        let seed_key = IgnoreKey::of(&fx.fingerprints[&fx.groups[0].seed().to_path_buf()]);
        assert!(reloaded.contains(&seed_key));
    }

    #[test]
    fn test_quit_leaves_remaining_groups_untouched() {
        let fx = fixture();
        let workflow = ResolutionWorkflow::new(&fx.trash, &fx.ignore_list);

        let mut decisions = Scripted(VecDeque::from([Decision::Quit]));
        let summary = workflow
            .run(&fx.groups, &fx.fingerprints, &mut decisions)
            .unwrap();

        assert_eq!(summary.groups_presented, 1);
        assert_eq!(summary.files_trashed, 0);
        assert!(fx.groups[1].seed().exists());
    }

    #[test]
    fn test_skip_changes_nothing() {
        let fx = fixture();
        let workflow = ResolutionWorkflow::new(&fx.trash, &fx.ignore_list);

        let mut decisions = Scripted(VecDeque::from([Decision::Skip, Decision::Skip]));
        let summary = workflow
            .run(&fx.groups, &fx.fingerprints, &mut decisions)
            .unwrap();

        assert_eq!(summary.groups_skipped, 2);
        assert_eq!(fx.ignore_list.len(), 0);
        assert!(fx.groups[0].seed().exists());
    }

    #[test]
    fn test_failed_trash_is_counted_and_does_not_abort() {
        let fx = fixture();
        // Delete one victim out from under the workflow.
        let victim = fx.groups[0].duplicates().next().unwrap().to_path_buf();
        std::fs::remove_file(&victim).unwrap();

        let workflow = ResolutionWorkflow::new(&fx.trash, &fx.ignore_list);
        let mut decisions = Scripted(VecDeque::from([Decision::Keep(0), Decision::Keep(0)]));
        let summary = workflow
            .run(&fx.groups, &fx.fingerprints, &mut decisions)
            .unwrap();

        assert_eq!(summary.trash_failures, 1);
        // The second group was still processed normally.
        assert_eq!(summary.files_trashed, 1);
    }

    #[test]
    fn test_out_of_range_keep_is_a_skip() {
        let fx = fixture();
        let workflow = ResolutionWorkflow::new(&fx.trash, &fx.ignore_list);

        let mut decisions = Scripted(VecDeque::from([Decision::Keep(99), Decision::Quit]));
        let summary = workflow
            .run(&fx.groups, &fx.fingerprints, &mut decisions)
            .unwrap();

        assert_eq!(summary.groups_skipped, 1);
        assert_eq!(summary.files_trashed, 0);
    }
}
