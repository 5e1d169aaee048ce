//! Partial patch regeneration.
//!
//! Rebuilds application-ready unified diffs from parsed hunks so a single
//! hunk (or a single line of one) can be fed back to `git apply`. Staging
//! uses a forward patch; unstaging and discarding use a reversed one, built
//! directly rather than relying on `apply -R`.

use error_set::error_set;

use crate::diff::file::FileDiff;
use crate::diff::hunk::{Hunk, Line, LineKind};

error_set! {
    /// Errors from patch construction
    PatchError := {
        #[display("Line index {index} out of range for hunk with {len} lines")]
        LineOutOfRange { index: usize, len: usize },
        #[display("Line {index} is a context line, not a change")]
        NotAChange { index: usize },
    }
}

/// Whether the patch applies the hunk's change or undoes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Build a patch containing the complete hunk.
pub fn build_hunk_patch(file: &FileDiff, hunk: &Hunk, direction: Direction) -> String {
    let (lines, start_old, start_new) = match direction {
        Direction::Forward => (hunk.lines.clone(), hunk.start_old, hunk.start_new),
        Direction::Reverse => (reverse_lines(&hunk.lines), hunk.start_new, hunk.start_old),
    };
    render_patch(file, direction, &lines, start_old, start_new)
}

/// Build a patch containing only one changed line of the hunk.
///
/// The selected line keeps its change; every other addition is dropped and
/// every other removal degrades to context, so the patch still applies
/// cleanly against the surrounding text.
pub fn build_line_patch(
    file: &FileDiff,
    hunk: &Hunk,
    line_index: usize,
    direction: Direction,
) -> Result<String, PatchError> {
    let selected = hunk
        .lines
        .get(line_index)
        .ok_or(PatchError::LineOutOfRange {
            index: line_index,
            len: hunk.lines.len(),
        })?;
    if selected.kind == LineKind::Context {
        return Err(PatchError::NotAChange { index: line_index });
    }

    let source = match direction {
        Direction::Forward => hunk.lines.clone(),
        Direction::Reverse => reverse_lines(&hunk.lines),
    };
    // Reversal preserves line count, so the index stays valid. It may move
    // within a changed run, so track the selected line by identity.
    let selected_pos = match direction {
        Direction::Forward => line_index,
        Direction::Reverse => {
            let target = invert_line(selected);
            source
                .iter()
                .position(|l| *l == target)
                .unwrap_or(line_index)
        }
    };

    let mut lines = Vec::with_capacity(source.len());
    for (i, line) in source.iter().enumerate() {
        if i == selected_pos {
            lines.push(line.clone());
        } else {
            match line.kind {
                LineKind::Context | LineKind::Removed => {
                    let mut kept = line.clone();
                    kept.kind = LineKind::Context;
                    lines.push(kept);
                }
                LineKind::Added => {}
            }
        }
    }

    let (start_old, start_new) = match direction {
        Direction::Forward => (hunk.start_old, hunk.start_new),
        Direction::Reverse => (hunk.start_new, hunk.start_old),
    };
    Ok(render_patch(file, direction, &lines, start_old, start_new))
}

fn render_patch(
    file: &FileDiff,
    direction: Direction,
    lines: &[Line],
    start_old: u32,
    start_new: u32,
) -> String {
    let mut patch = String::new();

    match direction {
        Direction::Forward => {
            for line in &file.header {
                patch.push_str(line);
                patch.push('\n');
            }
        }
        Direction::Reverse => {
            for line in reverse_header(&file.header) {
                patch.push_str(&line);
                patch.push('\n');
            }
        }
    }

    let old_count = lines
        .iter()
        .filter(|l| matches!(l.kind, LineKind::Context | LineKind::Removed))
        .count() as u32;
    let new_count = lines
        .iter()
        .filter(|l| matches!(l.kind, LineKind::Context | LineKind::Added))
        .count() as u32;
    patch.push_str(&build_hunk_header(
        start_old, old_count, start_new, new_count,
    ));
    patch.push('\n');

    for line in lines {
        let marker = match line.kind {
            LineKind::Context => ' ',
            LineKind::Added => '+',
            LineKind::Removed => '-',
        };
        patch.push(marker);
        patch.push_str(&line.content);
        patch.push('\n');
        if line.no_trailing_newline {
            patch.push_str("\\ No newline at end of file\n");
        }
    }

    patch
}

fn invert_line(line: &Line) -> Line {
    let mut inverted = line.clone();
    inverted.kind = match line.kind {
        LineKind::Context => LineKind::Context,
        LineKind::Added => LineKind::Removed,
        LineKind::Removed => LineKind::Added,
    };
    inverted
}

/// Invert every line and reorder each contiguous changed run so removals
/// precede additions, matching how git itself prints a reversed diff.
fn reverse_lines(lines: &[Line]) -> Vec<Line> {
    let mut result = Vec::with_capacity(lines.len());
    let mut run: Vec<Line> = Vec::new();

    let flush = |run: &mut Vec<Line>, result: &mut Vec<Line>| {
        result.extend(run.iter().filter(|l| l.kind == LineKind::Removed).cloned());
        result.extend(run.iter().filter(|l| l.kind == LineKind::Added).cloned());
        run.clear();
    };

    for line in lines {
        if line.kind == LineKind::Context {
            flush(&mut run, &mut result);
            result.push(line.clone());
        } else {
            run.push(invert_line(line));
        }
    }
    flush(&mut run, &mut result);

    result
}

/// Rewrite a file's preamble for the reversed patch: the new side becomes
/// the old side, creations become deletions, renames flip.
fn reverse_header(header: &[String]) -> Vec<String> {
    let old_spec = header
        .iter()
        .find_map(|l| l.strip_prefix("--- "))
        .unwrap_or("/dev/null");
    let new_spec = header
        .iter()
        .find_map(|l| l.strip_prefix("+++ "))
        .unwrap_or("/dev/null");

    header
        .iter()
        .map(|line| {
            if line.starts_with("--- ") {
                if new_spec == "/dev/null" {
                    "--- /dev/null".to_string()
                } else {
                    format!("--- a/{}", strip_spec_prefix(new_spec))
                }
            } else if line.starts_with("+++ ") {
                if old_spec == "/dev/null" {
                    "+++ /dev/null".to_string()
                } else {
                    format!("+++ b/{}", strip_spec_prefix(old_spec))
                }
            } else if let Some(mode) = line.strip_prefix("new file mode ") {
                format!("deleted file mode {mode}")
            } else if let Some(mode) = line.strip_prefix("deleted file mode ") {
                format!("new file mode {mode}")
            } else if let Some(mode) = line.strip_prefix("old mode ") {
                format!("new mode {mode}")
            } else if let Some(mode) = line.strip_prefix("new mode ") {
                format!("old mode {mode}")
            } else if let Some(path) = line.strip_prefix("rename from ") {
                format!("rename to {path}")
            } else if let Some(path) = line.strip_prefix("rename to ") {
                format!("rename from {path}")
            } else if let Some(blobs) = line.strip_prefix("index ")
                && let Some((pair, rest)) = split_index_line(blobs)
                && let Some((old, new)) = pair.split_once("..")
            {
                format!("index {new}..{old}{rest}")
            } else {
                line.clone()
            }
        })
        .collect()
}

fn split_index_line(blobs: &str) -> Option<(&str, &str)> {
    match blobs.find(' ') {
        Some(pos) => Some((&blobs[..pos], &blobs[pos..])),
        None => Some((blobs, "")),
    }
}

fn strip_spec_prefix(spec: &str) -> &str {
    spec.strip_prefix("a/")
        .or_else(|| spec.strip_prefix("b/"))
        .unwrap_or(spec)
}

/// Format: @@ -old_start,old_count +new_start,new_count @@
/// with the count omitted when 1, per unified diff convention.
fn build_hunk_header(old_start: u32, old_count: u32, new_start: u32, new_count: u32) -> String {
    let old_part = if old_count == 1 {
        format!("-{}", old_start)
    } else {
        format!("-{},{}", old_start, old_count)
    };

    let new_part = if new_count == 1 {
        format!("+{}", new_start)
    } else {
        format!("+{},{}", new_start, new_count)
    };

    format!("@@ {} {} @@", old_part, new_part)
}
