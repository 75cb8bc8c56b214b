//! Git hooks guarding step history
//!
//! `tortilla hooks install` writes thin shell scripts into the repository's
//! hooks directory; each one calls back into `tortilla hook <name>`, which
//! lands in [`run_hook`].

mod policy;

pub use policy::{check_pre_commit, check_pre_rebase, finalize_message, prepare_message};

use crate::error::{Error, Result};
use crate::repo::{GitRepo, Invocation};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Hooks tortilla installs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookName {
    /// `pre-commit`
    PreCommit,
    /// `prepare-commit-msg`
    PrepareCommitMsg,
    /// `commit-msg`
    CommitMsg,
    /// `pre-rebase`
    PreRebase,
}

impl HookName {
    /// Every hook, in installation order
    pub const ALL: [Self; 4] = [
        Self::PreCommit,
        Self::PrepareCommitMsg,
        Self::CommitMsg,
        Self::PreRebase,
    ];

    /// File name git looks up
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreCommit => "pre-commit",
            Self::PrepareCommitMsg => "prepare-commit-msg",
            Self::CommitMsg => "commit-msg",
            Self::PreRebase => "pre-rebase",
        }
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| Error::Internal(format!("unknown hook '{s}'")))
    }
}

/// Run hook `name` with git's arguments
pub fn run_hook(
    repo: &GitRepo,
    name: HookName,
    args: &[String],
    invocation: Invocation,
    steps_dir: &Path,
) -> Result<()> {
    debug!(hook = %name, ?args, %invocation, "Running hook");
    match name {
        HookName::PreCommit => check_pre_commit(repo, invocation, steps_dir),
        HookName::PrepareCommitMsg => {
            let file = message_file(repo, args)?;
            let message = fs::read_to_string(&file)?;
            if let Some(stripped) = prepare_message(repo, invocation, &message) {
                fs::write(&file, stripped)?;
            }
            Ok(())
        }
        HookName::CommitMsg => {
            let file = message_file(repo, args)?;
            let message = fs::read_to_string(&file)?;
            if let Some(full) = finalize_message(repo, invocation, &message)? {
                fs::write(&file, full)?;
            }
            Ok(())
        }
        HookName::PreRebase => check_pre_rebase(invocation),
    }
}

fn message_file(repo: &GitRepo, args: &[String]) -> Result<PathBuf> {
    let file = args.first().ok_or(Error::MissingArgument("message file"))?;
    Ok(repo.root().join(file))
}

/// Script body delegating hook `name` to `program`
pub fn hook_script(program: &Path, name: HookName) -> String {
    let program = program.to_string_lossy().replace('\'', r"'\''");
    format!("#!/bin/sh\n# Installed by tortilla\nexec '{program}' hook {name} \"$@\"\n")
}

/// Write every hook script into the repository's hooks directory
pub fn install_hooks(repo: &GitRepo, program: &Path) -> Result<Vec<PathBuf>> {
    let dir = repo.git_dir().join("hooks");
    fs::create_dir_all(&dir)?;

    let mut written = Vec::new();
    for name in HookName::ALL {
        let path = dir.join(name.as_str());
        fs::write(&path, hook_script(program, name))?;
        make_executable(&path)?;
        written.push(path);
    }
    info!(dir = %dir.display(), "Installed hooks");
    Ok(written)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_name_round_trip() {
        for name in HookName::ALL {
            assert_eq!(name.as_str().parse::<HookName>().unwrap(), name);
        }
        assert!("post-commit".parse::<HookName>().is_err());
    }

    #[test]
    fn test_hook_script_quotes_program() {
        let script = hook_script(Path::new("/opt/my tools/tortilla"), HookName::CommitMsg);
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("exec '/opt/my tools/tortilla' hook commit-msg \"$@\""));
    }
}
