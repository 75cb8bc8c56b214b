//! Scripted editors substituted for human interaction during a rebase.
//!
//! Git runs `GIT_SEQUENCE_EDITOR` / `GIT_EDITOR` through the shell with the
//! path of a temp file appended. Tortilla points both at its own binary
//! (`tortilla editor sequence|message`) and passes the instructions through
//! environment variables. An error here exits non-zero, which makes git
//! abort the rebase (or the commit) cleanly.

use crate::error::{Error, Result};
use crate::rebase::{RebasePlan, SequenceEdit};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// JSON-encoded [`SequenceEdit`] for the sequence editor
pub const SEQUENCE_EDIT_ENV: &str = "TORTILLA_SEQUENCE_EDIT";

/// Replacement commit message for the message editor
pub const MESSAGE_ENV: &str = "TORTILLA_MESSAGE";

/// Builds the editor commands and environment handed to git
#[derive(Debug, Clone)]
pub struct ScriptedEditor {
    program: PathBuf,
}

impl ScriptedEditor {
    /// Editors backed by the `tortilla` executable at `program`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Editors backed by the running executable
    pub fn current() -> Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }

    /// Path of the backing executable
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, kind: &str) -> String {
        format!("{} editor {kind}", shell_quote(&self.program.to_string_lossy()))
    }

    /// Environment for an interactive rebase applying `edit`
    pub fn rebase_envs(&self, edit: &SequenceEdit) -> Result<Vec<(String, String)>> {
        let json = serde_json::to_string(edit)
            .map_err(|e| Error::Internal(format!("failed to encode sequence edit: {e}")))?;
        Ok(vec![
            ("GIT_SEQUENCE_EDITOR".to_string(), self.command("sequence")),
            (SEQUENCE_EDIT_ENV.to_string(), json),
            ("GIT_EDITOR".to_string(), self.command("message")),
        ])
    }

    /// Environment for a commit whose message editor writes `message`, or
    /// keeps git's proposed message when `None`
    pub fn message_envs(&self, message: Option<&str>) -> Vec<(String, String)> {
        let mut envs = vec![("GIT_EDITOR".to_string(), self.command("message"))];
        if let Some(message) = message {
            envs.push((MESSAGE_ENV.to_string(), message.to_string()));
        }
        envs
    }
}

/// Borrow an owned environment list in the shape the runner takes
pub fn env_refs(envs: &[(String, String)]) -> Vec<(&str, &str)> {
    envs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

/// Sequence editor entry point: rewrite the to-do file in place
pub fn edit_sequence(file: &Path, edit_json: Option<&str>) -> Result<()> {
    let edit_json = edit_json.ok_or(Error::MissingArgument(SEQUENCE_EDIT_ENV))?;
    let edit: SequenceEdit = serde_json::from_str(edit_json)
        .map_err(|e| Error::InvalidRebasePlan(format!("bad {SEQUENCE_EDIT_ENV}: {e}")))?;

    let text = fs::read_to_string(file)?;
    let mut plan = RebasePlan::parse(&text)?;
    plan.apply(&edit)?;
    debug!(?edit, "Rewrote rebase plan");
    fs::write(file, plan.render())?;
    Ok(())
}

/// Message editor entry point: replace the message file's content, or leave
/// it as git proposed it
pub fn edit_message(file: &Path, message: Option<&str>) -> Result<()> {
    if let Some(message) = message {
        let mut content = message.trim_end().to_string();
        content.push('\n');
        fs::write(file, content)?;
    }
    Ok(())
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
