//! Temporary git repositories for testing

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tortilla::editor::ScriptedEditor;
use tortilla::repo::GitRepo;

/// A throwaway git repository with a root commit
///
/// The directory is removed when the value is dropped.
pub struct TempGitRepo {
    dir: TempDir,
    repo: GitRepo,
}

impl TempGitRepo {
    /// `git init` with a fixed identity and one unstepped root commit
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let root = dir.path();
        git(root, &["init", "--quiet", "--initial-branch=main"]);
        git(root, &["config", "user.name", "Tortilla Test"]);
        git(root, &["config", "user.email", "test@example.com"]);
        git(root, &["config", "commit.gpgsign", "false"]);
        git(root, &["config", "tag.gpgsign", "false"]);
        fs::write(root.join("README.md"), "# Tutorial\n").expect("write README");
        git(root, &["add", "README.md"]);
        git(root, &["commit", "--quiet", "-m", "Initial commit"]);

        let repo = GitRepo::open(root).expect("open temp repo");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn repo(&self) -> &GitRepo {
        &self.repo
    }

    /// Write a file relative to the root and stage it
    pub fn stage(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, content).expect("write file");
        git(self.path(), &["add", name]);
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(name)).expect("read file")
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path().join(name).exists()
    }

    /// Subjects from HEAD back to the root, oldest first
    pub fn subjects(&self) -> Vec<String> {
        git(self.path(), &["log", "--reverse", "--format=%s"])
            .lines()
            .map(String::from)
            .collect()
    }

    /// Tag names, sorted
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = git(self.path(), &["tag", "--list"])
            .lines()
            .map(String::from)
            .collect();
        tags.sort();
        tags
    }

    /// Commit a tag points at
    pub fn tag_target(&self, name: &str) -> String {
        git(self.path(), &["rev-list", "-n", "1", name])
    }

    /// Subject of a revision
    pub fn subject_of(&self, rev: &str) -> String {
        git(self.path(), &["log", "-1", "--format=%s", rev])
    }

    /// Run git in the repository and return trimmed stdout
    pub fn git(&self, args: &[&str]) -> String {
        git(self.path(), args)
    }
}

impl Default for TempGitRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// Scripted editors backed by the built binary
#[allow(deprecated)]
pub fn test_editor() -> ScriptedEditor {
    ScriptedEditor::new(assert_cmd::cargo::cargo_bin("tortilla"))
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
