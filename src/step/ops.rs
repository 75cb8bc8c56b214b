//! Step operations on a repository (EFFECTFUL)
//!
//! Appending operations (push, tag, pop, amend) act on HEAD directly. Every
//! operation that touches earlier history goes through the rebase engine.

use super::numbering::{next_step, next_super_step};
use super::parse::{parse_step, strip_step_prefix};
use crate::config::TortillaConfig;
use crate::editor::ScriptedEditor;
use crate::error::{Error, Result};
use crate::rebase::{
    ProgressCallback, RebaseOptions, RebaseOutcome, SequenceEdit, defer_tag, start_rebase,
};
use crate::repo::{GitRepo, History, Invocation, OutputMode};
use crate::types::{StepCommit, StepId};
use std::fs;
use tracing::info;

fn require_message(message: &str) -> Result<&str> {
    let message = message.trim();
    if message.is_empty() {
        return Err(Error::MissingArgument("message"));
    }
    Ok(message)
}

fn head_commit(repo: &GitRepo) -> Result<StepCommit> {
    let hash = repo.head()?;
    let descriptor = parse_step(&repo.message_of(&hash)?)
        .ok_or_else(|| Error::StepNotFound("HEAD is not a step commit".to_string()))?;
    Ok(StepCommit { hash, descriptor })
}

/// Commit the index as the next sub step
pub fn push_step(repo: &GitRepo, message: &str, allow_empty: bool) -> Result<StepCommit> {
    let message = require_message(message)?;
    let step = next_step(repo, 0)?;
    let full = format!("{}{message}", step.prefix());
    repo.commit(&full, allow_empty)?;
    info!(%step, "Pushed step");
    head_commit(repo)
}

/// Close the current super step: create its instruction file, commit it and
/// tag the commit. While a rebase is running the tag waits for its end.
pub fn tag_step(repo: &GitRepo, config: &TortillaConfig, message: &str) -> Result<StepCommit> {
    let message = require_message(message)?;
    let number = next_super_step(repo, 0)?;
    let step = StepId::super_step(number);

    let path = config.instruction_path(repo.root(), number);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    if !path.exists() {
        fs::write(&path, "")?;
    }
    repo.add(&[path.as_path()])?;

    let hash = repo.commit(&format!("{}{message}", step.prefix()), false)?;
    let tag = step.tag_name();
    if repo.is_rebasing() {
        defer_tag(repo, &tag, &hash)?;
        info!(%tag, "Deferred tag until the rebase finishes");
    } else {
        repo.set_tag(&tag, &hash)?;
    }
    head_commit(repo)
}

/// Drop HEAD's step commit, along with its tag if it closed a super step
pub fn pop_step(repo: &GitRepo) -> Result<StepCommit> {
    let popped = head_commit(repo)?;
    let parent = repo.parent_of(&popped.hash)?.ok_or_else(|| {
        Error::PolicyViolation("cannot pop the root commit".to_string())
    })?;

    repo.reset_hard(&parent)?;

    let step = popped.descriptor.step;
    // Mid-rebase the finishing pass prunes tags of vanished steps
    if step.is_super() && !repo.is_rebasing() && repo.tag_exists(&step.tag_name())? {
        repo.delete_tag(&step.tag_name())?;
    }
    info!(%step, "Popped step");
    Ok(popped)
}

/// `git commit --amend` flagged for the hooks as a user amend.
///
/// With a message, HEAD keeps its step prefix and the subject is replaced;
/// without one, the user's editor opens.
pub fn amend_step(repo: &GitRepo, message: Option<&str>) -> Result<String> {
    let mut args = vec!["commit".to_string(), "--amend".to_string()];
    if let Some(message) = message {
        let message = require_message(message)?;
        let full = match parse_step(&repo.message_of("HEAD")?) {
            Some(descriptor) => format!("{}{message}", descriptor.step.prefix()),
            None => message.to_string(),
        };
        args.push("-m".to_string());
        args.push(full);
    }
    repo.git_as(Invocation::Amend)
        .run_with(args, &[], OutputMode::Inherited)?;
    repo.head()
}

/// Options for rebase-backed operations built from configuration
pub fn rebase_options(config: &TortillaConfig, editor: ScriptedEditor) -> RebaseOptions {
    RebaseOptions {
        editor,
        steps_dir: config.steps_dir.clone(),
        manifests: config.manifests.clone(),
        manual: config.manual.clone(),
    }
}

/// Stop at `step` so the user can change it
pub fn edit_step(
    repo: &GitRepo,
    step: StepId,
    options: &RebaseOptions,
    progress: &dyn ProgressCallback,
) -> Result<RebaseOutcome> {
    start_rebase(repo, &SequenceEdit::Edit { target: step }, None, options, progress)
}

/// Replace the message of `step`
pub fn reword_step(
    repo: &GitRepo,
    step: StepId,
    message: &str,
    options: &RebaseOptions,
    progress: &dyn ProgressCallback,
) -> Result<RebaseOutcome> {
    let message = strip_step_prefix(require_message(message)?);
    start_rebase(
        repo,
        &SequenceEdit::Reword { target: step },
        Some(message),
        options,
        progress,
    )
}

/// Drop `step` (a super step with its sub steps) and renumber what follows
pub fn remove_step(
    repo: &GitRepo,
    step: StepId,
    options: &RebaseOptions,
    progress: &dyn ProgressCallback,
) -> Result<RebaseOutcome> {
    start_rebase(repo, &SequenceEdit::Remove { target: step }, None, options, progress)
}

/// Re-derive every step number and tag from history
pub fn renumber_steps(
    repo: &GitRepo,
    options: &RebaseOptions,
    progress: &dyn ProgressCallback,
) -> Result<RebaseOutcome> {
    start_rebase(repo, &SequenceEdit::Renumber, None, options, progress)
}
