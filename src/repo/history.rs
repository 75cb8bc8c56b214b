//! History inspection: log, tag and in-progress state queries

use super::{GitRepo, History};
use crate::error::Result;
use crate::step::{STEP_GREP, parse_step};
use crate::types::StepCommit;

/// Separates commits in step log output
const RECORD_SEP: char = '\u{1e}';
/// Separates hash from message inside one record
const FIELD_SEP: char = '\u{1f}';

impl GitRepo {
    /// Resolve `rev` to a full hash, `None` if it does not exist
    pub fn rev_parse(&self, rev: &str) -> Result<Option<String>> {
        let spec = format!("{rev}^{{commit}}");
        if !self.git().succeeds(["rev-parse", "--verify", "--quiet", &spec], &[])? {
            return Ok(None);
        }
        self.git().run(["rev-parse", &spec], &[]).map(Some)
    }

    /// Hash of HEAD; fails on an unborn branch
    pub fn head(&self) -> Result<String> {
        self.git().run(["rev-parse", "HEAD"], &[])
    }

    /// Full message of `rev`
    pub fn message_of(&self, rev: &str) -> Result<String> {
        self.git().run(["log", "-1", "--format=%B", rev], &[])
    }

    /// Parent of `hash`, `None` for a root commit
    pub fn parent_of(&self, hash: &str) -> Result<Option<String>> {
        self.rev_parse(&format!("{hash}~1"))
    }

    /// Paths with unresolved merge conflicts
    pub fn conflicted_files(&self) -> Result<Vec<String>> {
        let out = self
            .git()
            .run(["diff", "--name-only", "--diff-filter=U"], &[])?;
        Ok(lines(&out))
    }

    /// Names of every `step*` tag
    pub fn step_tags(&self) -> Result<Vec<String>> {
        let out = self.git().run(["tag", "--list", "step*"], &[])?;
        Ok(lines(&out))
    }

    /// Commit a tag points at
    pub fn tag_target(&self, name: &str) -> Result<Option<String>> {
        self.rev_parse(&format!("refs/tags/{name}"))
    }

    /// Unified diff introduced by `hash`
    pub fn show_diff(&self, hash: &str) -> Result<String> {
        self.git().run(["show", "--format=", "--no-color", hash], &[])
    }

    /// Commit the rebase is stopped at, as recorded in its to-do `done` list.
    ///
    /// This is the hash *before* the rebase rewrote it, which is what the
    /// persisted state refers to.
    pub fn rebase_stopped_commit(&self) -> Result<Option<String>> {
        let done = self.git_dir().join("rebase-merge").join("done");
        let Ok(contents) = std::fs::read_to_string(&done) else {
            return Ok(None);
        };
        let Some(abbrev) = contents
            .lines()
            .rev()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .find_map(|l| {
                let mut parts = l.split_whitespace();
                let verb = parts.next()?;
                matches!(verb, "pick" | "p" | "edit" | "e" | "reword" | "r")
                    .then(|| parts.next())
                    .flatten()
            })
        else {
            return Ok(None);
        };
        self.rev_parse(abbrev)
    }
}

fn offset_rev(offset: usize) -> String {
    if offset == 0 {
        "HEAD".to_string()
    } else {
        format!("HEAD~{offset}")
    }
}

impl History for GitRepo {
    fn recent_commit(&self, grep: Option<&str>, format: &str, offset: usize) -> Result<String> {
        let rev = offset_rev(offset);
        if self.rev_parse(&rev)?.is_none() {
            return Ok(String::new());
        }
        let format_arg = format!("--format={format}");
        let mut args = vec!["log", "-1", format_arg.as_str()];
        let grep_arg;
        if let Some(pattern) = grep {
            grep_arg = format!("--grep={pattern}");
            args.push("--extended-regexp");
            args.push(&grep_arg);
        }
        args.push(&rev);
        self.git().run(args, &[])
    }

    fn step_commits(&self, grep: &str, offset: usize) -> Result<Vec<StepCommit>> {
        let rev = offset_rev(offset);
        if self.rev_parse(&rev)?.is_none() {
            return Ok(Vec::new());
        }
        log_step_commits(self, grep, &rev, false)
    }

    fn is_rebasing(&self) -> bool {
        self.git_dir().join("rebase-merge").exists() || self.git_dir().join("rebase-apply").exists()
    }

    fn is_cherry_picking(&self) -> bool {
        self.git_dir().join("CHERRY_PICK_HEAD").exists()
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        let spec = format!("refs/tags/{name}");
        self.git()
            .succeeds(["rev-parse", "--verify", "--quiet", &spec], &[])
    }

    fn staged_files(&self, pattern: Option<&str>) -> Result<Vec<String>> {
        let mut args = vec![
            "diff",
            "--cached",
            "--name-only",
            "--no-renames",
            "--diff-filter=AMD",
        ];
        if let Some(pattern) = pattern {
            args.push("--");
            args.push(pattern);
        }
        let out = self.git().run(args, &[])?;
        Ok(lines(&out))
    }
}

/// Every step commit reachable from HEAD, oldest first
pub fn list_step_commits(repo: &GitRepo) -> Result<Vec<StepCommit>> {
    if repo.rev_parse("HEAD")?.is_none() {
        return Ok(Vec::new());
    }
    log_step_commits(repo, STEP_GREP, "HEAD", true)
}

/// `git log` records matching `grep` whose subject parses as a step
fn log_step_commits(
    repo: &GitRepo,
    grep: &str,
    rev: &str,
    oldest_first: bool,
) -> Result<Vec<StepCommit>> {
    let format = format!("--format=%H{FIELD_SEP}%B{RECORD_SEP}");
    let grep = format!("--grep={grep}");
    let mut args = vec!["log", "--extended-regexp", grep.as_str(), format.as_str()];
    if oldest_first {
        args.insert(1, "--reverse");
    }
    args.push(rev);
    let out = repo.git().run(args, &[])?;

    Ok(out
        .split(RECORD_SEP)
        .filter_map(|record| {
            let (hash, message) = record.trim().split_once(FIELD_SEP)?;
            let descriptor = parse_step(message.trim_end())?;
            Some(StepCommit {
                hash: hash.to_string(),
                descriptor,
            })
        })
        .collect())
}

fn lines(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
