use super::DiffError;
use super::hunk::{Hunk, Line, LineKind};

/// A complete diff for a single file.
///
/// `header` preserves the raw preamble verbatim (the `diff --git` line, any
/// mode/index/rename lines, and the `---`/`+++` path lines) so patches can be
/// regenerated byte-exactly for `git apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Current path of the file.
    pub path: String,
    /// Pre-rename path, present only when the diff records a rename.
    pub original_path: Option<String>,
    /// Raw preamble lines, in input order.
    pub header: Vec<String>,
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Parse one file section (starting at its `diff --git` line).
    ///
    /// Strict: a malformed hunk header or a hunk whose body disagrees with
    /// its declared line counts fails the parse.
    pub(crate) fn parse(section: &str, file_index: usize) -> Result<Self, DiffError> {
        let mut header = Vec::new();
        let mut old_spec: Option<&str> = None;
        let mut new_spec: Option<&str> = None;
        let mut rename_from: Option<&str> = None;
        let mut rename_to: Option<&str> = None;

        // Header phase: accumulate everything until the first hunk header,
        // extracting path information along the way.
        let mut lines = section.lines().peekable();
        while let Some(&line) = lines.peek() {
            if line.starts_with("@@ ") {
                break;
            }
            if let Some(spec) = line.strip_prefix("--- ") {
                old_spec = Some(spec);
            } else if let Some(spec) = line.strip_prefix("+++ ") {
                new_spec = Some(spec);
            } else if let Some(from) = line.strip_prefix("rename from ") {
                rename_from = Some(from);
            } else if let Some(to) = line.strip_prefix("rename to ") {
                rename_to = Some(to);
            }
            header.push(line.to_string());
            lines.next();
        }

        let (path, original_path) = resolve_paths(
            &header,
            old_spec,
            new_spec,
            rename_from,
            rename_to,
        )?;

        // Hunk phase: each `@@` line starts a new hunk; body lines are
        // classified by their first byte.
        let mut hunks: Vec<Hunk> = Vec::new();
        for line in lines {
            if line.starts_with("@@ ") {
                let ranges = Hunk::parse_header(line)?;
                hunks.push(Hunk {
                    header: line.to_string(),
                    start_old: ranges.start_old,
                    start_new: ranges.start_new,
                    lines: Vec::new(),
                    file_index,
                    hunk_index: hunks.len(),
                    file_path: path.clone(),
                    staged: false,
                });
                continue;
            }

            let Some(hunk) = hunks.last_mut() else {
                return Err(DiffError::UnexpectedLine {
                    line: line.to_string(),
                });
            };

            if let Some(rest) = line.strip_prefix('+') {
                hunk.lines.push(Line::new(LineKind::Added, rest));
            } else if let Some(rest) = line.strip_prefix('-') {
                hunk.lines.push(Line::new(LineKind::Removed, rest));
            } else if line.starts_with('\\') {
                // `\ No newline at end of file` annotates the previous line.
                if let Some(last) = hunk.lines.last_mut() {
                    last.no_trailing_newline = true;
                }
            } else if let Some(rest) = line.strip_prefix(' ') {
                hunk.lines.push(Line::new(LineKind::Context, rest));
            } else {
                // Bare lines inside a hunk (e.g. empty context) count as context.
                hunk.lines.push(Line::new(LineKind::Context, line));
            }
        }

        // The declared counts must match what the body actually contains.
        for hunk in &hunks {
            let ranges = Hunk::parse_header(&hunk.header)?;
            if hunk.old_line_count() != ranges.count_old as usize
                || hunk.new_line_count() != ranges.count_new as usize
            {
                return Err(DiffError::HunkCountMismatch {
                    header: hunk.header.clone(),
                });
            }
        }

        Ok(FileDiff {
            path,
            original_path,
            header,
            hunks,
        })
    }
}

fn resolve_paths(
    header: &[String],
    old_spec: Option<&str>,
    new_spec: Option<&str>,
    rename_from: Option<&str>,
    rename_to: Option<&str>,
) -> Result<(String, Option<String>), DiffError> {
    if let (Some(from), Some(to)) = (rename_from, rename_to) {
        return Ok((to.to_string(), Some(from.to_string())));
    }

    if let Some(spec) = new_spec
        && spec != "/dev/null"
    {
        return Ok((strip_path_prefix(spec).to_string(), None));
    }

    // Deleted file: the old side carries the path.
    if let Some(spec) = old_spec
        && spec != "/dev/null"
    {
        return Ok((strip_path_prefix(spec).to_string(), None));
    }

    // Mode-change-only diffs have no ---/+++ lines; fall back to the
    // `diff --git a/<path> b/<path>` line.
    if let Some(first) = header.first()
        && let Some(rest) = first.strip_prefix("diff --git a/")
        && let Some(idx) = rest.rfind(" b/")
    {
        return Ok((rest[idx + 3..].to_string(), None));
    }

    Err(DiffError::MissingFilePath {
        section: header.first().cloned().unwrap_or_default(),
    })
}

fn strip_path_prefix(spec: &str) -> &str {
    spec.strip_prefix("a/")
        .or_else(|| spec.strip_prefix("b/"))
        .unwrap_or(spec)
}
