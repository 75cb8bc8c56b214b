//! In-memory history for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use regex::Regex;
use std::collections::HashSet;
use std::sync::Mutex;
use tortilla::error::{Error, Result};
use tortilla::repo::History;
use tortilla::step::parse_step;
use tortilla::types::StepCommit;

/// Call record for `recent_commit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentCommitCall {
    pub grep: Option<String>,
    pub format: String,
    pub offset: usize,
}

/// Call record for `step_commits`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCommitsCall {
    pub grep: String,
    pub offset: usize,
}

/// A commit in the mock history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCommit {
    pub hash: String,
    pub message: String,
}

/// Simple mock history for testing
///
/// Features:
/// - Linear history, oldest first, HEAD last
/// - `%H` and `%B` formats for `recent_commit`
/// - `step_commits` matching the grep over whole messages like `git log`
/// - Configurable rebase/cherry-pick state, tags and staged files
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockHistory {
    commits: Mutex<Vec<MockCommit>>,
    tags: Mutex<HashSet<String>>,
    staged: Mutex<Vec<String>>,
    rebasing: Mutex<bool>,
    cherry_picking: Mutex<bool>,
    recent_commit_calls: Mutex<Vec<RecentCommitCall>>,
    step_commits_calls: Mutex<Vec<StepCommitsCall>>,
    error_on_log: Mutex<Option<String>>,
}

impl Default for MockHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHistory {
    pub fn new() -> Self {
        Self {
            commits: Mutex::new(Vec::new()),
            tags: Mutex::new(HashSet::new()),
            staged: Mutex::new(Vec::new()),
            rebasing: Mutex::new(false),
            cherry_picking: Mutex::new(false),
            recent_commit_calls: Mutex::new(Vec::new()),
            step_commits_calls: Mutex::new(Vec::new()),
            error_on_log: Mutex::new(None),
        }
    }

    /// History built from messages, oldest first
    pub fn with_messages(messages: &[&str]) -> Self {
        let history = Self::new();
        for message in messages {
            history.commit(message);
        }
        history
    }

    /// Append a commit; returns its fake hash
    pub fn commit(&self, message: &str) -> String {
        let mut commits = self.commits.lock().unwrap();
        let hash = format!("{:040x}", commits.len() + 1);
        commits.push(MockCommit {
            hash: hash.clone(),
            message: message.to_string(),
        });
        hash
    }

    /// Drop HEAD
    pub fn pop(&self) -> Option<MockCommit> {
        self.commits.lock().unwrap().pop()
    }

    pub fn set_rebasing(&self, rebasing: bool) {
        *self.rebasing.lock().unwrap() = rebasing;
    }

    pub fn set_cherry_picking(&self, cherry_picking: bool) {
        *self.cherry_picking.lock().unwrap() = cherry_picking;
    }

    pub fn add_tag(&self, name: &str) {
        self.tags.lock().unwrap().insert(name.to_string());
    }

    pub fn set_staged(&self, files: &[&str]) {
        *self.staged.lock().unwrap() = files.iter().map(|f| (*f).to_string()).collect();
    }

    /// Make every log query fail with `message`
    pub fn fail_log(&self, message: &str) {
        *self.error_on_log.lock().unwrap() = Some(message.to_string());
    }

    pub fn recent_commit_calls(&self) -> Vec<RecentCommitCall> {
        self.recent_commit_calls.lock().unwrap().clone()
    }

    pub fn step_commits_calls(&self) -> Vec<StepCommitsCall> {
        self.step_commits_calls.lock().unwrap().clone()
    }

    fn injected_error(&self) -> Result<()> {
        match self.error_on_log.lock().unwrap().clone() {
            Some(message) => Err(Error::Git(message)),
            None => Ok(()),
        }
    }

    /// Commits reachable from `HEAD~offset` matching `grep`, newest first
    fn grep_reachable(&self, grep: Option<&str>, offset: usize) -> Result<Vec<MockCommit>> {
        let pattern = grep
            .map(|g| Regex::new(&format!("(?m){g}")))
            .transpose()
            .map_err(|e| Error::Internal(e.to_string()))?;

        let commits = self.commits.lock().unwrap();
        if offset >= commits.len() {
            return Ok(Vec::new());
        }
        Ok(commits[..commits.len() - offset]
            .iter()
            .rev()
            .filter(|c| pattern.as_ref().is_none_or(|re| re.is_match(&c.message)))
            .cloned()
            .collect())
    }

    pub fn messages(&self) -> Vec<String> {
        self.commits
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.message.clone())
            .collect()
    }
}

impl History for MockHistory {
    fn recent_commit(&self, grep: Option<&str>, format: &str, offset: usize) -> Result<String> {
        self.recent_commit_calls
            .lock()
            .unwrap()
            .push(RecentCommitCall {
                grep: grep.map(String::from),
                format: format.to_string(),
                offset,
            });
        self.injected_error()?;

        let found = self.grep_reachable(grep, offset)?.into_iter().next();
        Ok(match (found, format) {
            (Some(c), "%H") => c.hash,
            (Some(c), _) => c.message,
            (None, _) => String::new(),
        })
    }

    fn step_commits(&self, grep: &str, offset: usize) -> Result<Vec<StepCommit>> {
        self.step_commits_calls
            .lock()
            .unwrap()
            .push(StepCommitsCall {
                grep: grep.to_string(),
                offset,
            });
        self.injected_error()?;

        Ok(self
            .grep_reachable(Some(grep), offset)?
            .into_iter()
            .filter_map(|c| {
                Some(StepCommit {
                    descriptor: parse_step(&c.message)?,
                    hash: c.hash,
                })
            })
            .collect())
    }

    fn is_rebasing(&self) -> bool {
        *self.rebasing.lock().unwrap()
    }

    fn is_cherry_picking(&self) -> bool {
        *self.cherry_picking.lock().unwrap()
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.tags.lock().unwrap().contains(name))
    }

    fn staged_files(&self, pattern: Option<&str>) -> Result<Vec<String>> {
        Ok(self
            .staged
            .lock()
            .unwrap()
            .iter()
            .filter(|f| pattern.is_none_or(|p| f.starts_with(p)))
            .cloned()
            .collect())
    }
}
