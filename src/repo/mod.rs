//! Git repository access
//!
//! `GitRepo` wraps the git CLI for one working tree. Read-only queries the
//! step model needs are behind the [`History`] trait so numbering can be
//! tested against an in-memory history.

mod command;
mod history;
mod invocation;
mod ops;

pub use command::{CommandRunner, OutputMode};
pub use history::list_step_commits;
pub use invocation::{INVOCATION_ENV, Invocation};
pub use ops::RebaseBase;

use crate::error::{Error, Result};
use crate::types::StepCommit;
use std::fs;
use std::path::{Path, PathBuf};

/// Read-only view of history used by the step model and the hooks
pub trait History {
    /// Most recent commit reachable from `HEAD~offset`, optionally filtered by
    /// an extended-regex `grep` over the message, rendered with `format`.
    ///
    /// Returns an empty string when nothing matches or `HEAD~offset` does
    /// not exist.
    fn recent_commit(&self, grep: Option<&str>, format: &str, offset: usize) -> Result<String>;

    /// Step commits reachable from `HEAD~offset` whose message matches the
    /// extended-regex `grep`, newest first.
    ///
    /// Only the subject decides whether a commit is a step; a step line
    /// quoted in a commit body does not count.
    fn step_commits(&self, grep: &str, offset: usize) -> Result<Vec<StepCommit>>;

    /// Whether a rebase is in progress
    fn is_rebasing(&self) -> bool;

    /// Whether a cherry-pick is in progress
    fn is_cherry_picking(&self) -> bool;

    /// Whether tag `name` exists
    fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Added, modified and deleted paths in the index, optionally limited to
    /// a pathspec
    fn staged_files(&self, pattern: Option<&str>) -> Result<Vec<String>>;
}

/// A git working tree driven through the git CLI
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
    git_dir: PathBuf,
    git: CommandRunner,
}

impl GitRepo {
    /// Open the working tree containing `path`
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(Error::Git(format!("{} is not a directory", path.display())));
        }
        let root = CommandRunner::new("git", path).run(["rev-parse", "--show-toplevel"], &[])?;
        let root = PathBuf::from(root);
        let git_dir = resolve_git_dir(&root);
        Ok(Self {
            git: CommandRunner::new("git", &root),
            root,
            git_dir,
        })
    }

    /// Top of the working tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The repository's git directory (`.git`, or the target of a worktree pointer)
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Runner for read-only queries
    pub(crate) const fn git(&self) -> &CommandRunner {
        &self.git
    }

    /// Runner whose children carry the given invocation flag
    pub(crate) fn git_as(&self, invocation: Invocation) -> CommandRunner {
        self.git.with_env(INVOCATION_ENV, invocation.as_env_value())
    }
}

/// Resolve the git directory of the working tree at `root`.
///
/// In linked worktrees (`git worktree add`) and submodules, `.git` is a plain
/// file containing `gitdir: <path>`, relative to the working tree or
/// absolute. Falls back to `<root>/.git` if the pointer cannot be followed.
pub fn resolve_git_dir(root: &Path) -> PathBuf {
    let dot_git = root.join(".git");

    if dot_git.is_file() {
        if let Ok(contents) = fs::read_to_string(&dot_git) {
            if let Some(target) = contents.trim().strip_prefix("gitdir:") {
                let target = root.join(target.trim());
                if target.is_dir() {
                    return fs::canonicalize(&target).unwrap_or(target);
                }
            }
        }
        // Pointer file exists but is invalid/unreadable - return as-is to surface error
        return dot_git;
    }

    dot_git
}
