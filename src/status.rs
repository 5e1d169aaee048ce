//! Working tree status, parsed from `git status --porcelain`.

use error_set::error_set;
use std::collections::HashSet;

error_set! {
    /// Errors from status parsing
    StatusError := {
        #[display("Malformed status entry: {line}")]
        MalformedEntry { line: String },
    }
}

/// One entry of porcelain status output.
///
/// `index_status` and `work_status` are the raw X/Y columns; a space means
/// no change on that side, `?` means untracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub path: String,
    /// Pre-rename path, present only for rename/copy entries.
    pub original_path: Option<String>,
    pub index_status: char,
    pub work_status: char,
}

impl FileStatus {
    pub fn is_untracked(&self) -> bool {
        self.index_status == '?' && self.work_status == '?'
    }

    pub fn is_staged(&self) -> bool {
        !matches!(self.index_status, ' ' | '?')
    }

    pub fn is_unstaged(&self) -> bool {
        !matches!(self.work_status, ' ' | '?')
    }

    /// Human-readable summary of both status columns, e.g.
    /// `staged: modified, modified` for a partially staged file.
    pub fn status_description(&self) -> String {
        if self.is_untracked() {
            return "untracked".to_string();
        }

        let mut parts = Vec::new();
        if self.is_staged() {
            parts.push(format!("staged: {}", status_word(self.index_status)));
        }
        if self.is_unstaged() {
            parts.push(status_word(self.work_status).to_string());
        }
        parts.join(", ")
    }
}

fn status_word(status: char) -> &'static str {
    match status {
        'M' => "modified",
        'A' => "added",
        'D' => "deleted",
        'R' => "renamed",
        'C' => "copied",
        'U' => "unmerged",
        'T' => "type changed",
        _ => "unknown",
    }
}

/// Parsed status, split by where each change lives.
///
/// A partially staged file appears in both `staged` and `unstaged`;
/// [`StatusResult::total_files`] still counts it once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusResult {
    pub staged: Vec<FileStatus>,
    pub unstaged: Vec<FileStatus>,
    pub untracked: Vec<FileStatus>,
}

impl StatusResult {
    /// Parse `git status --porcelain` output.
    pub fn parse(text: &str) -> Result<Self, StatusError> {
        let mut result = StatusResult::default();

        for line in text.lines() {
            if line.is_empty() {
                continue;
            }

            let mut chars = line.chars();
            let (Some(index_status), Some(work_status), Some(' ')) =
                (chars.next(), chars.next(), chars.next())
            else {
                return Err(StatusError::MalformedEntry {
                    line: line.to_string(),
                });
            };

            let spec = chars.as_str();
            if spec.is_empty() {
                return Err(StatusError::MalformedEntry {
                    line: line.to_string(),
                });
            }

            // Renames and copies carry both paths: "R  old -> new".
            let (path, original_path) = match spec.split_once(" -> ") {
                Some((old, new)) => (unquote(new), Some(unquote(old))),
                None => (unquote(spec), None),
            };

            let entry = FileStatus {
                path,
                original_path,
                index_status,
                work_status,
            };

            if entry.is_untracked() {
                result.untracked.push(entry);
            } else {
                if entry.is_staged() {
                    result.staged.push(entry.clone());
                }
                if entry.is_unstaged() {
                    result.unstaged.push(entry);
                }
            }
        }

        Ok(result)
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }

    /// Number of distinct paths across all three lists.
    pub fn total_files(&self) -> usize {
        self.staged
            .iter()
            .chain(&self.unstaged)
            .chain(&self.untracked)
            .map(|f| f.path.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Git quotes paths containing special characters.
fn unquote(path: &str) -> String {
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
        .to_string()
}
