use super::file::FileDiff;
use super::full::DiffResult;
use super::hunk::Hunk;

/// Staged and unstaged diffs merged into one addressable view.
///
/// Both halves are kept as parsed; hunks are only brought together (and
/// tagged with their origin) by [`CombinedDiffResult::all_hunks_combined`],
/// which is what selection UIs iterate over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedDiffResult {
    pub staged: Option<DiffResult>,
    pub unstaged: Option<DiffResult>,
}

impl CombinedDiffResult {
    pub fn new(staged: Option<DiffResult>, unstaged: Option<DiffResult>) -> Self {
        Self { staged, unstaged }
    }

    /// True when neither half contains any file.
    pub fn is_empty(&self) -> bool {
        let staged_empty = self.staged.as_ref().is_none_or(DiffResult::is_empty);
        let unstaged_empty = self.unstaged.as_ref().is_none_or(DiffResult::is_empty);
        staged_empty && unstaged_empty
    }

    pub fn total_hunks(&self) -> usize {
        self.staged.as_ref().map_or(0, DiffResult::total_hunks)
            + self.unstaged.as_ref().map_or(0, DiffResult::total_hunks)
    }

    /// Every hunk from both halves: staged hunks first (tagged
    /// `staged = true`), then unstaged, each half in file order then hunk
    /// order. Hunks are cloned so the tag never mutates the parsed diffs.
    pub fn all_hunks_combined(&self) -> Vec<Hunk> {
        let mut hunks = Vec::with_capacity(self.total_hunks());

        if let Some(staged) = &self.staged {
            for hunk in staged.all_hunks() {
                let mut hunk = hunk.clone();
                hunk.staged = true;
                hunks.push(hunk);
            }
        }
        if let Some(unstaged) = &self.unstaged {
            for hunk in unstaged.all_hunks() {
                hunks.push(hunk.clone());
            }
        }

        hunks
    }

    /// Resolve a hunk back to the file it was parsed from, using its staged
    /// tag to pick the half and its `file_index` to pick the file.
    pub fn get_file_diff(&self, hunk: &Hunk) -> Option<&FileDiff> {
        let half = if hunk.staged {
            self.staged.as_ref()?
        } else {
            self.unstaged.as_ref()?
        };
        half.files.get(hunk.file_index)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn single_file_diff(path: &str, old: &str, new: &str) -> DiffResult {
        let text = format!(
            "diff --git a/{path} b/{path}\n\
             index abc1234..def5678 100644\n\
             --- a/{path}\n\
             +++ b/{path}\n\
             @@ -1 +1 @@\n\
             -{old}\n\
             +{new}\n"
        );
        DiffResult::parse(&text).unwrap()
    }

    #[test]
    fn empty_when_both_halves_absent() {
        assert!(CombinedDiffResult::new(None, None).is_empty());
    }

    #[test]
    fn empty_when_both_halves_have_no_files() {
        let combined = CombinedDiffResult::new(
            Some(DiffResult::default()),
            Some(DiffResult::default()),
        );
        assert!(combined.is_empty());
        assert!(combined.all_hunks_combined().is_empty());
    }

    #[test]
    fn not_empty_with_only_staged_changes() {
        let combined =
            CombinedDiffResult::new(Some(single_file_diff("a.txt", "old", "new")), None);
        assert!(!combined.is_empty());
    }

    #[test]
    fn not_empty_with_only_unstaged_changes() {
        let combined =
            CombinedDiffResult::new(None, Some(single_file_diff("a.txt", "old", "new")));
        assert!(!combined.is_empty());
    }

    #[test]
    fn combined_hunks_put_staged_first() {
        let combined = CombinedDiffResult::new(
            Some(single_file_diff("staged.txt", "s1", "s2")),
            Some(single_file_diff("unstaged.txt", "u1", "u2")),
        );

        let hunks = combined.all_hunks_combined();
        assert_eq!(hunks.len(), 2);
        assert!(hunks[0].staged);
        assert_eq!(hunks[0].file_path, "staged.txt");
        assert!(!hunks[1].staged);
        assert_eq!(hunks[1].file_path, "unstaged.txt");
    }

    #[test]
    fn staged_tag_does_not_leak_into_parsed_diff() {
        let combined =
            CombinedDiffResult::new(Some(single_file_diff("a.txt", "old", "new")), None);

        let _ = combined.all_hunks_combined();
        let staged = combined.staged.as_ref().unwrap();
        assert!(!staged.files[0].hunks[0].staged);
    }

    #[test]
    fn resolves_hunk_to_its_file() {
        let combined = CombinedDiffResult::new(
            Some(single_file_diff("staged.txt", "s1", "s2")),
            Some(single_file_diff("unstaged.txt", "u1", "u2")),
        );

        let hunks = combined.all_hunks_combined();
        let staged_file = combined.get_file_diff(&hunks[0]).unwrap();
        assert_eq!(staged_file.path, "staged.txt");
        let unstaged_file = combined.get_file_diff(&hunks[1]).unwrap();
        assert_eq!(unstaged_file.path, "unstaged.txt");
    }

    #[test]
    fn resolution_fails_when_half_is_missing() {
        let with_unstaged =
            CombinedDiffResult::new(None, Some(single_file_diff("a.txt", "old", "new")));
        let hunks = with_unstaged.all_hunks_combined();

        // Pretend the hunk came from a staged diff that no longer exists.
        let mut orphan = hunks[0].clone();
        orphan.staged = true;
        assert!(with_unstaged.get_file_diff(&orphan).is_none());
    }

    #[test]
    fn same_file_in_both_halves_stays_distinct() {
        let combined = CombinedDiffResult::new(
            Some(single_file_diff("both.txt", "v1", "v2")),
            Some(single_file_diff("both.txt", "v2", "v3")),
        );

        let hunks = combined.all_hunks_combined();
        assert_eq!(hunks.len(), 2);
        assert_eq!(combined.total_hunks(), 2);
        assert!(hunks[0].staged && !hunks[1].staged);
        assert_eq!(hunks[0].file_path, hunks[1].file_path);
    }
}
