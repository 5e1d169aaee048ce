//! Repository data layer for an interactive git client.
//!
//! Everything goes through the `git` binary: commands produce text, the
//! parser modules turn that text into typed models, and the patch module
//! turns selections back into patch text for `git apply`. [`Repository`] ties
//! the pieces together over a [`CommandRunner`], so every operation can be
//! tested against canned output.

use error_set::error_set;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod branch;
pub mod command;
pub mod diff;
pub mod patch;
pub mod stash;
pub mod status;

pub use branch::{Branch, BranchError, is_valid_branch_name, parse_branches};
pub use command::{CommandError, CommandRunner, GitCommand};
pub use diff::{
    CombinedDiffResult, DiffError, DiffResult, FileDiff, Hunk, HunkRanges, Line, LineKind,
    format_diff,
};
pub use patch::{Direction, PatchError, build_hunk_patch, build_line_patch};
pub use stash::{Stash, StashError, parse_stashes};
pub use status::{FileStatus, StatusError, StatusResult};

error_set! {
    /// Top-level error for repository operations
    GitError := {
        #[display("Invalid branch name: {name}")]
        InvalidBranchName { name: String },
        #[display("Stash index {index} out of range: {count} stashes exist")]
        StashOutOfRange { index: usize, count: usize },
        #[display("Branch '{name}' is not fully merged")]
        UnmergedBranch { name: String },
        #[display("Stash operation produced merge conflicts")]
        StashConflict { paths: Vec<String> },
        #[display("Failed to read {path}: {message}")]
        FileRead { path: String, message: String },
        CommandError(CommandError),
        DiffError(DiffError),
        PatchError(PatchError),
        StatusError(StatusError),
        BranchError(BranchError),
        StashError(StashError),
    }
}

/// One git repository, addressed through a [`CommandRunner`].
pub struct Repository<R: CommandRunner = GitCommand> {
    runner: R,
    workdir: PathBuf,
}

impl Repository<GitCommand> {
    /// Open the repository whose working tree is at `path`.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let workdir = path.as_ref().to_path_buf();
        Self {
            runner: GitCommand::new(&workdir),
            workdir,
        }
    }
}

impl<R: CommandRunner> Repository<R> {
    /// Wire up an alternate runner, primarily for tests.
    pub fn with_runner(runner: R, workdir: impl AsRef<Path>) -> Self {
        Self {
            runner,
            workdir: workdir.as_ref().to_path_buf(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    // --- status ---

    pub fn status(&self) -> Result<StatusResult, GitError> {
        let output = self.runner.run(&["status", "--porcelain"])?;
        Ok(StatusResult::parse(&output)?)
    }

    // --- diffs ---

    /// Unstaged changes: working tree against the index.
    pub fn diff(&self) -> Result<DiffResult, GitError> {
        let output = self.runner.run(&["diff", "--no-ext-diff", "--no-color"])?;
        Ok(DiffResult::parse(&output)?)
    }

    /// Staged changes: index against HEAD.
    pub fn staged_diff(&self) -> Result<DiffResult, GitError> {
        let output = self
            .runner
            .run(&["diff", "--cached", "--no-ext-diff", "--no-color"])?;
        Ok(DiffResult::parse(&output)?)
    }

    /// Both diffs merged into one addressable view.
    pub fn combined_diff(&self) -> Result<CombinedDiffResult, GitError> {
        let staged = self.staged_diff()?;
        let unstaged = self.diff()?;
        Ok(CombinedDiffResult::new(Some(staged), Some(unstaged)))
    }

    /// Synthesized diff for an untracked file, read from the working tree.
    pub fn untracked_file_diff(&self, path: &str) -> Result<FileDiff, GitError> {
        let content =
            fs::read_to_string(self.workdir.join(path)).map_err(|e| GitError::FileRead {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        Ok(diff::untracked_file_diff(path, &content))
    }

    // --- selective staging ---

    /// Stage one hunk of an unstaged diff.
    pub fn stage_hunk(&self, file: &FileDiff, hunk: &Hunk) -> Result<(), GitError> {
        let patch = build_hunk_patch(file, hunk, Direction::Forward);
        self.apply_patch(&patch, true)
    }

    /// Unstage one hunk of a staged diff by applying it in reverse to the
    /// index only.
    pub fn unstage_hunk(&self, file: &FileDiff, hunk: &Hunk) -> Result<(), GitError> {
        let patch = build_hunk_patch(file, hunk, Direction::Reverse);
        self.apply_patch(&patch, true)
    }

    /// Discard one hunk from the working tree. Destructive.
    pub fn discard_hunk(&self, file: &FileDiff, hunk: &Hunk) -> Result<(), GitError> {
        let patch = build_hunk_patch(file, hunk, Direction::Reverse);
        self.apply_patch(&patch, false)
    }

    /// Stage a single changed line of a hunk.
    pub fn stage_line(
        &self,
        file: &FileDiff,
        hunk: &Hunk,
        line_index: usize,
    ) -> Result<(), GitError> {
        let patch = build_line_patch(file, hunk, line_index, Direction::Forward)?;
        self.apply_patch(&patch, true)
    }

    /// Unstage a single changed line of a staged hunk.
    pub fn unstage_line(
        &self,
        file: &FileDiff,
        hunk: &Hunk,
        line_index: usize,
    ) -> Result<(), GitError> {
        let patch = build_line_patch(file, hunk, line_index, Direction::Reverse)?;
        self.apply_patch(&patch, true)
    }

    fn apply_patch(&self, patch: &str, cached: bool) -> Result<(), GitError> {
        debug!(cached, patch_bytes = patch.len(), "applying patch");
        let args: &[&str] = if cached {
            &["apply", "--cached", "-"]
        } else {
            &["apply", "-"]
        };
        self.runner.run_with_input(args, patch)?;
        Ok(())
    }

    pub fn stage_file(&self, path: &str) -> Result<(), GitError> {
        self.runner.run(&["add", "--", path])?;
        Ok(())
    }

    pub fn unstage_file(&self, path: &str) -> Result<(), GitError> {
        self.runner.run(&["restore", "--staged", "--", path])?;
        Ok(())
    }

    // --- branches ---

    pub fn branches(&self) -> Result<Vec<Branch>, GitError> {
        let output = self.runner.run(&["branch", "-vv", "--no-color"])?;
        Ok(parse_branches(&output)?)
    }

    /// Name of the current branch, empty on a detached HEAD.
    pub fn current_branch(&self) -> Result<String, GitError> {
        let output = self.runner.run(&["branch", "--show-current"])?;
        Ok(output.trim().to_string())
    }

    /// Create a branch at HEAD and switch to it.
    pub fn create_branch(&self, name: &str) -> Result<(), GitError> {
        if !is_valid_branch_name(name) {
            return Err(GitError::InvalidBranchName {
                name: name.to_string(),
            });
        }
        self.runner.run(&["checkout", "-b", name])?;
        Ok(())
    }

    pub fn checkout_branch(&self, name: &str) -> Result<(), GitError> {
        self.runner.run(&["checkout", name])?;
        Ok(())
    }

    /// Delete a fully merged branch. Refusals by git (current branch,
    /// unmerged work) surface as [`GitError::UnmergedBranch`] or the raw
    /// command error respectively.
    pub fn delete_branch(&self, name: &str) -> Result<(), GitError> {
        match self.runner.run(&["branch", "-d", name]) {
            Ok(_) => Ok(()),
            Err(CommandError::ExitFailure { stderr, .. })
                if stderr.contains("not fully merged") =>
            {
                Err(GitError::UnmergedBranch {
                    name: name.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a branch regardless of merge state. Destructive.
    pub fn force_delete_branch(&self, name: &str) -> Result<(), GitError> {
        self.runner.run(&["branch", "-D", name])?;
        Ok(())
    }

    // --- stashes ---

    pub fn stashes(&self) -> Result<Vec<Stash>, GitError> {
        let output = self.runner.run(&["stash", "list"])?;
        Ok(parse_stashes(&output)?)
    }

    /// Changes a stash would reintroduce, presented as the unstaged half of
    /// a combined view.
    pub fn stash_diff(&self, index: usize) -> Result<CombinedDiffResult, GitError> {
        self.check_stash_index(index)?;
        let stash_ref = stash_ref(index);
        let output = self
            .runner
            .run(&["stash", "show", "-p", "--no-color", &stash_ref])?;
        let diff = DiffResult::parse(&output)?;
        Ok(CombinedDiffResult::new(None, Some(diff)))
    }

    /// Apply a stash to the working tree, keeping the stash entry.
    pub fn apply_stash(&self, index: usize) -> Result<(), GitError> {
        self.check_stash_index(index)?;
        let stash_ref = stash_ref(index);
        self.classify_stash_result(self.runner.run(&["stash", "apply", &stash_ref]))
    }

    /// Apply a stash and drop it on success.
    pub fn pop_stash(&self, index: usize) -> Result<(), GitError> {
        self.check_stash_index(index)?;
        let stash_ref = stash_ref(index);
        self.classify_stash_result(self.runner.run(&["stash", "pop", &stash_ref]))
    }

    /// Remove a stash entry without applying it. Destructive.
    pub fn drop_stash(&self, index: usize) -> Result<(), GitError> {
        self.check_stash_index(index)?;
        let stash_ref = stash_ref(index);
        self.runner.run(&["stash", "drop", &stash_ref])?;
        Ok(())
    }

    fn check_stash_index(&self, index: usize) -> Result<(), GitError> {
        let count = self.stashes()?.len();
        if index >= count {
            return Err(GitError::StashOutOfRange { index, count });
        }
        Ok(())
    }

    /// git reports stash merge conflicts on stdout and still exits non-zero;
    /// turn those into a typed error carrying the conflicted paths.
    fn classify_stash_result(
        &self,
        result: Result<String, CommandError>,
    ) -> Result<(), GitError> {
        match result {
            Ok(_) => Ok(()),
            Err(CommandError::ExitFailure {
                command,
                stdout,
                stderr,
            }) => {
                let paths: Vec<String> = stdout
                    .lines()
                    .chain(stderr.lines())
                    .filter_map(|l| l.split("Merge conflict in ").nth(1))
                    .map(|p| p.to_string())
                    .collect();
                if paths.is_empty() {
                    Err(CommandError::ExitFailure {
                        command,
                        stdout,
                        stderr,
                    }
                    .into())
                } else {
                    Err(GitError::StashConflict { paths })
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn stash_ref(index: usize) -> String {
    format!("stash@{{{index}}}")
}
