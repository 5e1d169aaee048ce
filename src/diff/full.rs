use super::DiffError;
use super::file::FileDiff;
use super::hunk::{Hunk, Line, LineKind};

/// A complete parsed diff covering any number of files.
///
/// Acts as the arena for `Hunk::file_index`/`hunk_index`: those offsets are
/// only valid against the `DiffResult` that produced them, never across
/// parses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub files: Vec<FileDiff>,
}

impl DiffResult {
    /// Parse complete `git diff` output.
    ///
    /// Strict: either the whole text parses or the call fails. Empty input
    /// yields an empty result (no files changed).
    pub fn parse(text: &str) -> Result<Self, DiffError> {
        let mut files = Vec::new();
        let mut section = String::new();

        for line in text.lines() {
            if line.starts_with("diff --git ") {
                if !section.is_empty() {
                    files.push(FileDiff::parse(&section, files.len())?);
                    section.clear();
                }
            } else if section.is_empty() {
                // Nothing may precede the first file marker.
                if !line.trim().is_empty() {
                    return Err(DiffError::UnexpectedLine {
                        line: line.to_string(),
                    });
                }
                continue;
            }
            section.push_str(line);
            section.push('\n');
        }

        if !section.is_empty() {
            files.push(FileDiff::parse(&section, files.len())?);
        }

        Ok(DiffResult { files })
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_hunks(&self) -> usize {
        self.files.iter().map(|f| f.hunks.len()).sum()
    }

    /// All hunks in file order then hunk order.
    pub fn all_hunks(&self) -> Vec<&Hunk> {
        self.files.iter().flat_map(|f| f.hunks.iter()).collect()
    }
}

/// Synthesize a diff for a file git knows nothing about yet.
///
/// Every content line becomes an addition in a single hunk starting at line
/// 1, so untracked files ride the same hunk/line selection machinery as
/// tracked changes.
pub fn untracked_file_diff(path: &str, content: &str) -> FileDiff {
    let header = vec![
        format!("diff --git a/{path} b/{path}"),
        "new file mode 100644".to_string(),
        "--- /dev/null".to_string(),
        format!("+++ b/{path}"),
    ];

    let mut lines: Vec<Line> = content
        .lines()
        .map(|l| Line::new(LineKind::Added, l))
        .collect();
    if !content.is_empty()
        && !content.ends_with('\n')
        && let Some(last) = lines.last_mut()
    {
        last.no_trailing_newline = true;
    }

    let hunks = if lines.is_empty() {
        Vec::new()
    } else {
        let count = lines.len();
        let header_line = if count == 1 {
            "@@ -0,0 +1 @@".to_string()
        } else {
            format!("@@ -0,0 +1,{count} @@")
        };
        vec![Hunk {
            header: header_line,
            start_old: 0,
            start_new: 1,
            lines,
            file_index: 0,
            hunk_index: 0,
            file_path: path.to_string(),
            staged: false,
        }]
    };

    FileDiff {
        path: path.to_string(),
        original_path: None,
        header,
        hunks,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    const TWO_FILE_DIFF: &str = "\
diff --git a/file1.txt b/file1.txt
index abc1234..def5678 100644
--- a/file1.txt
+++ b/file1.txt
@@ -1 +1 @@
-original1
+modified1
diff --git a/file2.txt b/file2.txt
index 1112223..4445556 100644
--- a/file2.txt
+++ b/file2.txt
@@ -1 +1 @@
-original2
+modified2
";

    #[test]
    fn parse_empty_input() {
        let diff = DiffResult::parse("").unwrap();
        assert!(diff.is_empty());
        assert_eq!(diff.total_hunks(), 0);
    }

    #[test]
    fn parse_single_modification() {
        let text = "\
diff --git a/test.txt b/test.txt
index abc1234..def5678 100644
--- a/test.txt
+++ b/test.txt
@@ -1,3 +1,3 @@
 line1
-line2
+modified
 line3
";
        let diff = DiffResult::parse(text).unwrap();

        assert_eq!(diff.files.len(), 1);
        assert_eq!(diff.files[0].path, "test.txt");
        assert_eq!(diff.files[0].hunks.len(), 1);

        let hunk = &diff.files[0].hunks[0];
        let removed: Vec<_> = hunk
            .lines
            .iter()
            .filter(|l| l.kind == LineKind::Removed)
            .collect();
        let added: Vec<_> = hunk
            .lines
            .iter()
            .filter(|l| l.kind == LineKind::Added)
            .collect();
        assert_eq!(removed.len(), 1);
        assert!(removed[0].content.contains("line2"));
        assert_eq!(added.len(), 1);
        assert!(added[0].content.contains("modified"));
    }

    #[test]
    fn parse_multiple_files_assigns_indices() {
        let diff = DiffResult::parse(TWO_FILE_DIFF).unwrap();

        assert_eq!(diff.files.len(), 2);
        assert_eq!(diff.files[0].path, "file1.txt");
        assert_eq!(diff.files[1].path, "file2.txt");
        assert_eq!(diff.files[0].hunks[0].file_index, 0);
        assert_eq!(diff.files[1].hunks[0].file_index, 1);
        assert_eq!(diff.total_hunks(), 2);
    }

    #[test]
    fn all_hunks_follow_file_then_hunk_order() {
        let diff = DiffResult::parse(TWO_FILE_DIFF).unwrap();
        let hunks = diff.all_hunks();

        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].file_path, "file1.txt");
        assert_eq!(hunks[1].file_path, "file2.txt");
    }

    #[test]
    fn parse_rejects_leading_garbage() {
        let text = "warning: something\ndiff --git a/x b/x\n";
        let result = DiffResult::parse(text);
        assert!(matches!(result, Err(DiffError::UnexpectedLine { .. })));
    }

    #[test]
    fn untracked_diff_is_all_additions() {
        let file = untracked_file_diff("new.txt", "a\nb\n");

        assert_eq!(file.path, "new.txt");
        assert_eq!(file.hunks.len(), 1);
        let hunk = &file.hunks[0];
        assert_eq!(hunk.start_new, 1);
        assert_eq!(hunk.header, "@@ -0,0 +1,2 @@");
        assert_eq!(hunk.lines.len(), 2);
        assert!(hunk.lines.iter().all(|l| l.kind == LineKind::Added));
        assert!(hunk.lines.iter().all(|l| l.kind != LineKind::Removed));
        assert_eq!(hunk.lines[0].content, "a");
        assert_eq!(hunk.lines[1].content, "b");
    }

    #[test]
    fn untracked_diff_headers_support_patching() {
        let file = untracked_file_diff("new.txt", "only\n");

        assert_eq!(file.header[0], "diff --git a/new.txt b/new.txt");
        assert!(file.header.iter().any(|h| h.contains("new file mode")));
        assert!(file.header.iter().any(|h| h == "--- /dev/null"));
        assert!(file.header.iter().any(|h| h == "+++ b/new.txt"));
        assert_eq!(file.hunks[0].header, "@@ -0,0 +1 @@");
    }

    #[test]
    fn untracked_diff_marks_missing_final_newline() {
        let file = untracked_file_diff("new.txt", "a\nb");
        let lines = &file.hunks[0].lines;
        assert!(!lines[0].no_trailing_newline);
        assert!(lines[1].no_trailing_newline);
    }

    #[test]
    fn untracked_diff_empty_content_has_no_hunks() {
        let file = untracked_file_diff("empty.txt", "");
        assert!(file.hunks.is_empty());
    }

    #[test]
    fn roundtrip_parse_of_untracked_diff() {
        let file = untracked_file_diff("new.txt", "a\nb\n");
        let mut text = file.header.join("\n");
        text.push('\n');
        text.push_str(&file.hunks[0].to_string());

        let reparsed = DiffResult::parse(&text).unwrap();
        assert_eq!(reparsed.files.len(), 1);
        assert_eq!(reparsed.files[0].path, "new.txt");
        assert_eq!(reparsed.files[0].hunks[0].lines.len(), 2);
    }
}
