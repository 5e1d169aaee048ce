//! Stash listing, parsed from `git stash list`.

use error_set::error_set;
use nom::{IResult, Parser, bytes::complete::tag, character::complete::u32 as dec_u32};

error_set! {
    /// Errors from stash parsing
    StashError := {
        #[display("Malformed stash entry: {line}")]
        MalformedEntry { line: String },
    }
}

/// One stash entry. `index` is its position in `stash@{N}` notation;
/// entries list newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stash {
    pub index: usize,
    pub message: String,
    /// Branch the stash was created on, empty when git did not record one.
    pub branch: String,
}

fn entry_prefix(input: &str) -> IResult<&str, u32> {
    let (input, _) = tag("stash@{").parse(input)?;
    let (input, index) = dec_u32(input)?;
    let (input, _) = tag("}: ").parse(input)?;
    Ok((input, index))
}

/// Parse `git stash list` output.
///
/// Named stashes read `stash@{N}: On <branch>: <message>`; colons in the
/// message are preserved. Unnamed stashes read `stash@{N}: WIP on <branch>:
/// <sha> <subject>` and keep the whole remainder as their message.
pub fn parse_stashes(text: &str) -> Result<Vec<Stash>, StashError> {
    let mut stashes = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (rest, index) = entry_prefix(line).map_err(|_| StashError::MalformedEntry {
            line: line.to_string(),
        })?;

        let (branch, message) = if let Some(named) = rest.strip_prefix("On ") {
            let (branch, message) =
                named
                    .split_once(": ")
                    .ok_or_else(|| StashError::MalformedEntry {
                        line: line.to_string(),
                    })?;
            (branch.to_string(), message.to_string())
        } else if let Some(wip) = rest.strip_prefix("WIP on ") {
            let branch = wip.split(':').next().unwrap_or("").to_string();
            (branch, rest.to_string())
        } else {
            (String::new(), rest.to_string())
        };

        stashes.push(Stash {
            index: index as usize,
            message,
            branch,
        });
    }

    Ok(stashes)
}
