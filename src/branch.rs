//! Local branch listing, parsed from `git branch -vv`.

use error_set::error_set;

error_set! {
    /// Errors from branch listing
    BranchError := {
        #[display("Malformed branch entry: {line}")]
        MalformedEntry { line: String },
    }
}

/// One local branch with its tracking state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub is_current: bool,
    /// Always false here: only local branches are enumerated.
    pub is_remote: bool,
    pub sha: String,
    /// Upstream ref name, when the branch tracks one.
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
    /// The tracked upstream no longer exists.
    pub gone: bool,
    /// Subject line of the branch tip commit.
    pub last_commit: String,
}

/// Parse `git branch -vv --no-color` output.
///
/// Detached HEAD entries (`* (HEAD detached at ...)`) are skipped; they are
/// not branches. An empty repository lists nothing.
///
/// The `-vv` format does not quote the tip subject, so a subject starting
/// with `[` is ambiguous with the tracking section. A bracket is only read
/// as tracking when it carries ahead/behind/gone counters or names a
/// `remote/branch`-shaped ref; a local upstream without a `/` and without
/// counters is indistinguishable from subject text and is left in
/// `last_commit`.
pub fn parse_branches(text: &str) -> Result<Vec<Branch>, BranchError> {
    let mut branches = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        // The marker column is always exactly two characters.
        let Some((marker, rest)) = line.split_at_checked(2) else {
            return Err(BranchError::MalformedEntry {
                line: line.to_string(),
            });
        };
        if !matches!(marker, "* " | "+ " | "  ") {
            return Err(BranchError::MalformedEntry {
                line: line.to_string(),
            });
        }
        let is_current = marker.starts_with('*');

        if rest.starts_with('(') {
            continue;
        }

        let (name, rest) = split_token(rest).ok_or_else(|| BranchError::MalformedEntry {
            line: line.to_string(),
        })?;
        let (sha, rest) = split_token(rest).ok_or_else(|| BranchError::MalformedEntry {
            line: line.to_string(),
        })?;

        let mut branch = Branch {
            name: name.to_string(),
            is_current,
            sha: sha.to_string(),
            ..Default::default()
        };

        let mut remainder = rest;
        if let Some(inner) = remainder.strip_prefix('[')
            && let Some((tracking, after)) = inner.split_once(']')
            && is_tracking_section(tracking)
        {
            parse_tracking(tracking, &mut branch);
            remainder = after.trim_start();
        }
        branch.last_commit = remainder.to_string();

        branches.push(branch);
    }

    Ok(branches)
}

/// Decide whether a bracketed section is tracking info rather than the
/// opening of the tip subject. Counters anchor it unambiguously; without
/// them the upstream must look like `remote/branch`.
fn is_tracking_section(tracking: &str) -> bool {
    match tracking.split_once(": ") {
        Some((upstream, counters)) => {
            !upstream.contains(' ')
                && counters.split(", ").all(|part| {
                    part == "gone"
                        || part
                            .strip_prefix("ahead ")
                            .or_else(|| part.strip_prefix("behind "))
                            .is_some_and(|n| n.parse::<u32>().is_ok())
                })
        }
        None => tracking.contains('/') && !tracking.contains(' '),
    }
}

/// The bracketed tracking section: `origin/main: ahead 2, behind 1` or
/// `origin/main: gone` or just `origin/main`.
fn parse_tracking(tracking: &str, branch: &mut Branch) {
    let (upstream, counters) = match tracking.split_once(": ") {
        Some((upstream, counters)) => (upstream, Some(counters)),
        None => (tracking, None),
    };
    branch.upstream = Some(upstream.to_string());

    let Some(counters) = counters else { return };
    for part in counters.split(", ") {
        if let Some(n) = part.strip_prefix("ahead ") {
            branch.ahead = n.parse().unwrap_or(0);
        } else if let Some(n) = part.strip_prefix("behind ") {
            branch.behind = n.parse().unwrap_or(0);
        } else if part == "gone" {
            branch.gone = true;
        }
    }
}

fn split_token(input: &str) -> Option<(&str, &str)> {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.find(char::is_whitespace) {
        Some(pos) => Some((&trimmed[..pos], trimmed[pos..].trim_start())),
        None => Some((trimmed, "")),
    }
}

/// Check a proposed branch name against the ref-format rules git enforces,
/// so invalid names are rejected before any command is spawned.
pub fn is_valid_branch_name(name: &str) -> bool {
    if name.is_empty() || name == "@" {
        return false;
    }
    if name.starts_with('-') || name.starts_with('/') || name.ends_with('/') {
        return false;
    }
    if name.ends_with('.') || name.ends_with(".lock") {
        return false;
    }
    if name.contains("..") || name.contains("//") || name.contains("@{") {
        return false;
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c))
    {
        return false;
    }
    // No path component may start with a dot.
    !name.split('/').any(|component| component.starts_with('.'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn parse_single_current_branch() {
        let branches = parse_branches("* main abc1234 Initial commit\n").unwrap();

        assert_eq!(branches.len(), 1);
        let branch = &branches[0];
        assert!(branch.is_current);
        assert_eq!(branch.name, "main");
        assert_eq!(branch.sha, "abc1234");
        assert_eq!(branch.last_commit, "Initial commit");
        assert_eq!(branch.upstream, None);
    }

    #[test]
    fn parse_multiple_branches_single_current() {
        let text = concat!(
            "  feature-1 def5678 Add feature one\n",
            "* main      abc1234 Initial commit\n",
            "  feature-2 0a1b2c3 Add feature two\n",
        );
        let branches = parse_branches(text).unwrap();

        assert_eq!(branches.len(), 3);
        let current: Vec<_> = branches.iter().filter(|b| b.is_current).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].name, "main");

        let names: Vec<_> = branches.iter().map(|b| b.name.as_str()).collect();
        assert!(names.contains(&"feature-1"));
        assert!(names.contains(&"feature-2"));
    }

    #[test]
    fn parse_upstream_with_ahead_behind() {
        let text = "* main abc1234 [origin/main: ahead 2, behind 1] Local commit 2\n";
        let branches = parse_branches(text).unwrap();

        let branch = &branches[0];
        assert_eq!(branch.upstream, Some("origin/main".to_string()));
        assert_eq!(branch.ahead, 2);
        assert_eq!(branch.behind, 1);
        assert!(!branch.gone);
        assert_eq!(branch.last_commit, "Local commit 2");
    }

    #[test]
    fn parse_upstream_in_sync() {
        let text = "* main abc1234 [origin/main] Pushed commit\n";
        let branches = parse_branches(text).unwrap();

        let branch = &branches[0];
        assert_eq!(branch.upstream, Some("origin/main".to_string()));
        assert_eq!(branch.ahead, 0);
        assert_eq!(branch.behind, 0);
    }

    #[test]
    fn parse_gone_upstream() {
        let text = "  stale abc1234 [origin/stale: gone] Old work\n";
        let branches = parse_branches(text).unwrap();

        let branch = &branches[0];
        assert!(branch.gone);
        assert_eq!(branch.upstream, Some("origin/stale".to_string()));
        assert_eq!(branch.last_commit, "Old work");
    }

    #[test]
    fn parse_skips_detached_head() {
        let text = "\
* (HEAD detached at abc1234) abc1234 Some commit
  main                       def5678 Initial commit
";
        let branches = parse_branches(text).unwrap();

        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].name, "main");
        assert!(!branches[0].is_current);
    }

    #[test]
    fn parse_empty_repo_lists_nothing() {
        assert!(parse_branches("").unwrap().is_empty());
    }

    #[test]
    fn listed_branches_are_local() {
        let branches = parse_branches("* main abc1234 Initial commit\n").unwrap();
        assert!(branches.iter().all(|b| !b.is_remote));
    }

    #[test]
    fn parse_subject_may_contain_brackets() {
        let text = "  fix abc1234 [origin/fix] Revert \"[ci] skip\" change\n";
        let branches = parse_branches(text).unwrap();

        assert_eq!(branches[0].last_commit, "Revert \"[ci] skip\" change");
    }

    #[test]
    fn parse_rejects_missing_marker_column() {
        // A line starting directly with the branch name has lost its
        // two-character marker column; mangling it into "ature-1" would be
        // worse than failing.
        let result = parse_branches("feature-1 def5678 Add feature one\n");
        assert!(matches!(result, Err(BranchError::MalformedEntry { .. })));
    }

    #[test]
    fn parse_rejects_unknown_marker() {
        let result = parse_branches("x! main abc1234 Initial commit\n");
        assert!(matches!(result, Err(BranchError::MalformedEntry { .. })));
    }

    #[test]
    fn bracketed_subject_without_upstream_stays_in_subject() {
        let text = "* main abc1234 [ci] fix build\n";
        let branches = parse_branches(text).unwrap();

        assert_eq!(branches[0].upstream, None);
        assert_eq!(branches[0].last_commit, "[ci] fix build");
    }

    #[test]
    fn bracketed_counters_still_read_as_tracking() {
        let text = "  stale abc1234 [local-base: gone] Old work\n";
        let branches = parse_branches(text).unwrap();

        assert_eq!(branches[0].upstream, Some("local-base".to_string()));
        assert!(branches[0].gone);
        assert_eq!(branches[0].last_commit, "Old work");
    }

    #[test]
    fn valid_branch_names() {
        for name in ["main", "feature/parser", "v1.2.3", "fix_bug-42"] {
            assert!(is_valid_branch_name(name), "{name} should be valid");
        }
    }

    #[test]
    fn invalid_branch_names() {
        let cases = [
            "",
            "@",
            "invalid branch name",
            "-starts-with-dash",
            "double..dot",
            "ends.lock",
            "ends.",
            "/leading-slash",
            "trailing-slash/",
            "a//b",
            "with~tilde",
            "with^caret",
            "with:colon",
            "with?question",
            "with*star",
            "with[bracket",
            "with\\backslash",
            "ref@{0}",
            ".hidden",
            "feature/.hidden",
        ];
        for name in cases {
            assert!(!is_valid_branch_name(name), "{name} should be invalid");
        }
    }
}
