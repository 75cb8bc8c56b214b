//! Synchronous process invocation.
//!
//! Every VCS call goes through here so the argument vector, working
//! directory and environment overrides are logged in one place.

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// How a child process's stdio is wired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Capture stdout/stderr; stdout is returned trimmed
    Captured,
    /// Child shares the terminal (editors, long-running rebases)
    Inherited,
}

/// Runs one program in a fixed working directory
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    cwd: PathBuf,
    envs: Vec<(String, String)>,
}

impl CommandRunner {
    /// Runner for `program` executed in `cwd`
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            cwd: cwd.into(),
            envs: Vec::new(),
        }
    }

    /// Working directory of every invocation
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Copy of this runner with an extra environment variable on every call
    pub fn with_env(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut runner = self.clone();
        runner.envs.push((key.into(), value.into()));
        runner
    }

    fn command<I, S>(&self, args: I, envs: &[(&str, &str)]) -> (Command, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.as_ref().to_string_lossy().into_owned())
            .collect();
        let mut cmd = Command::new(&self.program);
        cmd.args(&args).current_dir(&self.cwd);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        for (key, value) in envs {
            cmd.env(key, value);
        }
        debug!(program = %self.program, ?args, cwd = ?self.cwd, "Running command");
        (cmd, args)
    }

    /// Run and return trimmed stdout; non-zero exit is an error
    pub fn run<I, S>(&self, args: I, envs: &[(&str, &str)]) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (mut cmd, args) = self.command(args, envs);
        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::Git(format!("failed to execute {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(Error::Git(format!(
                "{} {} failed: {detail}",
                self.program,
                args.first().map_or("", String::as_str)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run and report only whether the exit status was zero
    pub fn succeeds<I, S>(&self, args: I, envs: &[(&str, &str)]) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (mut cmd, _) = self.command(args, envs);
        let status = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| Error::Git(format!("failed to execute {}: {e}", self.program)))?;
        Ok(status.success())
    }

    /// Run with the given stdio wiring, failing on non-zero exit
    pub fn run_with<I, S>(&self, args: I, envs: &[(&str, &str)], mode: OutputMode) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        match mode {
            OutputMode::Captured => self.run(args, envs).map(|_| ()),
            OutputMode::Inherited => {
                let (mut cmd, args) = self.command(args, envs);
                let status = cmd
                    .status()
                    .map_err(|e| Error::Git(format!("failed to execute {}: {e}", self.program)))?;
                if status.success() {
                    Ok(())
                } else {
                    Err(Error::Git(format!(
                        "{} {} exited with {status}",
                        self.program,
                        args.first().map_or("", String::as_str)
                    )))
                }
            }
        }
    }
}
