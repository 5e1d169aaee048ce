//! Unified diff parsing.
//!
//! `git diff` output is parsed strictly: every line must be accounted for,
//! and each hunk body must match the line counts its header declares. A
//! partial parse is never returned.

use error_set::error_set;

pub mod combined;
pub mod file;
pub mod full;
pub mod hunk;

pub use combined::CombinedDiffResult;
pub use file::FileDiff;
pub use full::{DiffResult, untracked_file_diff};
pub use hunk::{Hunk, HunkRanges, Line, LineKind};

error_set! {
    /// Errors from diff parsing
    DiffError := {
        #[display("Malformed hunk header: {line}")]
        MalformedHunkHeader { line: String },
        #[display("Hunk body does not match declared counts: {header}")]
        HunkCountMismatch { header: String },
        #[display("Unexpected line in diff output: {line}")]
        UnexpectedLine { line: String },
        #[display("Could not determine file path for section: {section}")]
        MissingFilePath { section: String },
    }
}

/// Format a parsed diff for user display with explicit line numbers.
pub fn format_diff(diff: &DiffResult) -> String {
    let mut result = String::new();

    for file_diff in &diff.files {
        result.push_str(&file_diff.path);
        result.push_str(":\n");

        for hunk in &file_diff.hunks {
            let mut old_line = hunk.start_old;
            let mut new_line = hunk.start_new;

            for line in &hunk.lines {
                match line.kind {
                    LineKind::Context => {
                        old_line += 1;
                        new_line += 1;
                    }
                    LineKind::Removed => {
                        result.push_str(&format!("  -{}:\t{}\n", old_line, line.content));
                        old_line += 1;
                    }
                    LineKind::Added => {
                        result.push_str(&format!("  +{}:\t{}\n", new_line, line.content));
                        new_line += 1;
                    }
                }
            }

            result.push('\n');
        }
    }

    // Remove trailing newline if present
    if result.ends_with("\n\n") {
        result.pop();
    }

    result
}
