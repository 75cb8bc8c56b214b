//! History-mutating git commands.
//!
//! All of these run with `TORTILLA_INVOCATION=internal` so tortilla's own
//! hooks let them through.

use super::{GitRepo, Invocation, OutputMode};
use crate::error::Result;
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;

/// Where an interactive rebase starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseBase {
    /// Rebase onto this commit; it stays untouched
    Commit(String),
    /// Rebase every commit, the root included (`--root`)
    Root,
}

impl GitRepo {
    /// Stage paths (additions, modifications and removals)
    pub fn add(&self, paths: &[&Path]) -> Result<()> {
        let mut args = vec!["add".to_string(), "--all".to_string(), "--".to_string()];
        args.extend(paths.iter().map(|p| p.to_string_lossy().into_owned()));
        self.git_as(Invocation::Internal).run(args, &[]).map(|_| ())
    }

    /// Rename a tracked file in the working tree and the index
    pub fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        self.git_as(Invocation::Internal)
            .run(
                [OsStr::new("mv"), OsStr::new("--force"), from.as_os_str(), to.as_os_str()],
                &[],
            )
            .map(|_| ())
    }

    /// Put `path` back to its HEAD version in the index and working tree
    pub fn restore_file(&self, path: &Path) -> Result<()> {
        self.git_as(Invocation::Internal)
            .run(
                [OsStr::new("checkout"), OsStr::new("HEAD"), OsStr::new("--"), path.as_os_str()],
                &[],
            )
            .map(|_| ())
    }

    /// Record the index as a new commit
    pub fn commit(&self, message: &str, allow_empty: bool) -> Result<String> {
        let mut args = vec!["commit", "--quiet", "-m", message];
        if allow_empty {
            args.push("--allow-empty");
        }
        self.git_as(Invocation::Internal).run(args, &[])?;
        let head = self.head()?;
        info!(%head, subject = message.lines().next().unwrap_or_default(), "Committed");
        Ok(head)
    }

    /// Amend HEAD with the index, letting `envs` supply a scripted `GIT_EDITOR`
    pub fn amend(&self, envs: &[(&str, &str)]) -> Result<String> {
        self.git_as(Invocation::Internal).run(
            ["commit", "--amend", "--allow-empty", "--quiet"],
            envs,
        )?;
        self.head()
    }

    /// Move HEAD (and the working tree) to `rev`, discarding later commits
    pub fn reset_hard(&self, rev: &str) -> Result<()> {
        self.git_as(Invocation::Internal)
            .run(["reset", "--hard", "--quiet", rev], &[])
            .map(|_| ())
    }

    /// Point tag `name` at `hash`, replacing any existing tag of that name
    pub fn set_tag(&self, name: &str, hash: &str) -> Result<()> {
        self.git_as(Invocation::Internal)
            .run(["tag", "--force", name, hash], &[])?;
        info!(tag = name, %hash, "Tagged");
        Ok(())
    }

    /// Delete tag `name`
    pub fn delete_tag(&self, name: &str) -> Result<()> {
        self.git_as(Invocation::Internal)
            .run(["tag", "--delete", name], &[])?;
        info!(tag = name, "Deleted tag");
        Ok(())
    }

    /// Start `git rebase -i` from `base`.
    ///
    /// `envs` must provide `GIT_SEQUENCE_EDITOR` (and `GIT_EDITOR`) pointing at
    /// scripted editors. Returns once git stops or finishes; a stop is not an
    /// error, a failure to start is.
    pub fn rebase_interactive(&self, base: &RebaseBase, envs: &[(&str, &str)]) -> Result<()> {
        let base_arg = match base {
            RebaseBase::Commit(hash) => hash.as_str(),
            RebaseBase::Root => "--root",
        };
        info!(base = base_arg, "Starting rebase");
        self.rebase_step(&["rebase", "--interactive", "--empty=keep", base_arg], envs)
    }

    /// `git rebase --continue`
    pub fn rebase_continue(&self, envs: &[(&str, &str)]) -> Result<()> {
        self.rebase_step(&["rebase", "--continue"], envs)
    }

    /// `git rebase --abort`
    pub fn rebase_abort(&self) -> Result<()> {
        self.git_as(Invocation::Internal)
            .run_with(["rebase", "--abort"], &[], OutputMode::Captured)
    }

    fn rebase_step(&self, args: &[&str], envs: &[(&str, &str)]) -> Result<()> {
        let runner = self.git_as(Invocation::Internal);
        match runner.run(args, envs) {
            Ok(_) => Ok(()),
            // Stopping at an `edit` line exits zero; stopping on a conflict
            // exits non-zero but leaves the rebase in progress, which the
            // caller inspects.
            Err(_) if self.is_rebasing_dir() && !self.conflicted_files()?.is_empty() => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn is_rebasing_dir(&self) -> bool {
        self.git_dir().join("rebase-merge").exists()
    }
}
