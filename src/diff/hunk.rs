use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, u32 as dec_u32},
    combinator::opt,
    sequence::preceded,
};
use std::fmt;

use super::DiffError;

/// Classification of one diff body line, decided once at parse time.
///
/// Downstream code (display, patch building) always consults this tag and
/// never re-derives it from raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

/// One body line of a hunk, without its leading marker character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub content: String,
    /// Set when the line was followed by `\ No newline at end of file`.
    pub no_trailing_newline: bool,
}

impl Line {
    pub fn new(kind: LineKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            no_trailing_newline: false,
        }
    }
}

/// The parsed ranges of a `@@ -a,b +c,d @@` header. Omitted counts default
/// to 1, per the unified diff format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRanges {
    pub start_old: u32,
    pub count_old: u32,
    pub start_new: u32,
    pub count_new: u32,
}

fn range(input: &str) -> IResult<&str, (u32, u32)> {
    let (input, start) = dec_u32(input)?;
    let (input, count) = opt(preceded(char(','), dec_u32)).parse(input)?;
    Ok((input, (start, count.unwrap_or(1))))
}

fn ranges(input: &str) -> IResult<&str, HunkRanges> {
    let (input, _) = tag("@@ -").parse(input)?;
    let (input, (start_old, count_old)) = range(input)?;
    let (input, _) = tag(" +").parse(input)?;
    let (input, (start_new, count_new)) = range(input)?;
    let (input, _) = tag(" @@").parse(input)?;
    Ok((
        input,
        HunkRanges {
            start_old,
            count_old,
            start_new,
            count_new,
        },
    ))
}

/// A single hunk from a unified diff.
///
/// `file_index` and `hunk_index` are offsets into the `DiffResult` this hunk
/// was parsed from; they are only meaningful against that same result.
/// `staged` is false at parse time and assigned when hunks are merged into a
/// combined staged/unstaged view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// The raw `@@ ... @@` header line.
    pub header: String,
    pub start_old: u32,
    pub start_new: u32,
    pub lines: Vec<Line>,
    pub file_index: usize,
    pub hunk_index: usize,
    pub file_path: String,
    pub staged: bool,
}

impl Hunk {
    /// Parse a hunk header line into its old/new ranges.
    pub fn parse_header(line: &str) -> Result<HunkRanges, DiffError> {
        match ranges(line) {
            Ok((_, parsed)) => Ok(parsed),
            Err(_) => Err(DiffError::MalformedHunkHeader {
                line: line.to_string(),
            }),
        }
    }

    /// Lines counted against the old file (context + removed).
    pub fn old_line_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l.kind, LineKind::Context | LineKind::Removed))
            .count()
    }

    /// Lines counted against the new file (context + added).
    pub fn new_line_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l.kind, LineKind::Context | LineKind::Added))
            .count()
    }
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        for line in &self.lines {
            let marker = match line.kind {
                LineKind::Context => ' ',
                LineKind::Added => '+',
                LineKind::Removed => '-',
            };
            writeln!(f, "{}{}", marker, line.content)?;
            if line.no_trailing_newline {
                writeln!(f, "\\ No newline at end of file")?;
            }
        }
        Ok(())
    }
}
