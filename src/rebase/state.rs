//! Persistence for orchestrator state in `<git-dir>/tortilla/`.
//!
//! A rebase driven by tortilla can span several processes (the user stops
//! at a step, edits, then runs `tortilla continue`), so what the loop needs
//! to remember lives on disk next to git's own rebase state.

use super::plan::SequenceEdit;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current state file format version
pub const STATE_VERSION: u32 = 1;

/// Directory name for tortilla metadata within the git directory.
const TORTILLA_DIR: &str = "tortilla";

/// Filename for rebase state.
const STATE_FILE: &str = "rebase.toml";

/// A tag to bind once the rebase finishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTag {
    /// Tag name (`stepN`)
    pub name: String,
    /// Commit hash the tag will point at
    pub hash: String,
}

/// What the rebase loop needs to carry between invocations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebaseState {
    /// File format version
    pub version: u32,
    /// The sequence edit that started the rebase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<SequenceEdit>,
    /// Original hash of the commit where control goes back to the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_stop: Option<String>,
    /// Whether the user already got control at `user_stop`
    #[serde(default)]
    pub handed_over: bool,
    /// Replacement text for a reword
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_message: Option<String>,
    /// The loop stopped on a conflict the user has to resolve by hand
    #[serde(default)]
    pub conflicted: bool,
    /// Super step whose production manual was switched to development
    /// format for the user's edit session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_manual: Option<u32>,
    /// Tags recorded during the loop, applied when the rebase finishes
    #[serde(default)]
    pub pending_tags: Vec<PendingTag>,
}

impl Default for RebaseState {
    fn default() -> Self {
        Self::new()
    }
}

impl RebaseState {
    /// Empty state at the current version
    pub const fn new() -> Self {
        Self {
            version: STATE_VERSION,
            operation: None,
            user_stop: None,
            handed_over: false,
            new_message: None,
            conflicted: false,
            dev_manual: None,
            pending_tags: Vec::new(),
        }
    }

    /// State for a freshly started operation
    pub fn for_operation(operation: SequenceEdit) -> Self {
        let mut state = Self::new();
        state.operation = Some(operation);
        state
    }

    /// Record (or replace) the binding for tag `name`
    pub fn defer_tag(&mut self, name: &str, hash: &str) {
        self.pending_tags.retain(|t| t.name != name);
        self.pending_tags.push(PendingTag {
            name: name.to_string(),
            hash: hash.to_string(),
        });
    }
}

/// Get path to the tortilla metadata directory.
fn tortilla_dir(git_dir: &Path) -> PathBuf {
    git_dir.join(TORTILLA_DIR)
}

/// Get path to the rebase state file.
pub fn state_path(git_dir: &Path) -> PathBuf {
    tortilla_dir(git_dir).join(STATE_FILE)
}

/// Load rebase state from disk.
///
/// Returns an empty `RebaseState` if the file doesn't exist.
pub fn load_state(git_dir: &Path) -> Result<RebaseState> {
    let path = state_path(git_dir);

    if !path.exists() {
        return Ok(RebaseState::new());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::State(format!("failed to read {}: {e}", path.display())))?;

    let state: RebaseState = toml::from_str(&content)
        .map_err(|e| Error::State(format!("failed to parse {}: {e}", path.display())))?;

    Ok(state)
}

/// Save rebase state to disk.
///
/// Creates the `<git-dir>/tortilla/` directory if it doesn't exist.
pub fn save_state(git_dir: &Path, state: &RebaseState) -> Result<()> {
    let dir = tortilla_dir(git_dir);
    let path = dir.join(STATE_FILE);

    if !dir.exists() {
        fs::create_dir_all(&dir)
            .map_err(|e| Error::State(format!("failed to create {}: {e}", dir.display())))?;
    }

    let mut state_to_save = state.clone();
    state_to_save.version = STATE_VERSION;

    let content = toml::to_string_pretty(&state_to_save)
        .map_err(|e| Error::State(format!("failed to serialize rebase state: {e}")))?;

    let content_with_header = format!(
        "# tortilla rebase state\n# Auto-generated - removed when the rebase finishes or aborts\n\n{content}"
    );

    fs::write(&path, content_with_header)
        .map_err(|e| Error::State(format!("failed to write {}: {e}", path.display())))?;

    Ok(())
}

/// Remove the state file, if any.
pub fn clear_state(git_dir: &Path) -> Result<()> {
    let path = state_path(git_dir);
    if path.exists() {
        fs::remove_file(&path)
            .map_err(|e| Error::State(format!("failed to remove {}: {e}", path.display())))?;
    }
    Ok(())
}
