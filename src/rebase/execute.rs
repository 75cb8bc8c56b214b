//! Rebase execution - effectful operations
//!
//! Drives `git rebase -i` with the scripted editors and then walks every
//! stop: resolving manifest conflicts, renumbering the stopped commit,
//! renaming its instruction file and recording tags. Control returns to the
//! user only at the commit they asked to edit, or at a conflict they have
//! to resolve themselves.
//!
//! Production manuals follow their step: they are re-rendered whenever the
//! step is renumbered or reworded, and the manual of the step the user
//! edits is switched to development format until `tortilla continue`.

use super::conflict::resolve_manifest;
use super::plan::SequenceEdit;
use super::state::{RebaseState, clear_state, load_state, save_state};
use crate::config::ManualConfig;
use crate::editor::{ScriptedEditor, env_refs};
use crate::error::{Error, Result};
use crate::manual::{ManualContext, ManualRenderer, is_production_format, repo_renderer};
use crate::repo::{GitRepo, History, RebaseBase, list_step_commits};
use crate::step::{find_step, parse_step, recent_step, renumbered};
use crate::types::{StepId, instruction_file_name, parse_tag_name, tag_name};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Receives human-readable progress lines while a rebase runs
pub trait ProgressCallback {
    /// Report one line of progress
    fn on_message(&self, message: &str);
}

/// Progress sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_message(&self, _message: &str) {}
}

/// What the rebase loop needs besides the repository
#[derive(Debug, Clone)]
pub struct RebaseOptions {
    /// Scripted editors handed to git
    pub editor: ScriptedEditor,
    /// Instruction file directory, relative to the repository root
    pub steps_dir: PathBuf,
    /// Manifest files whose conflicts are reconciled automatically
    pub manifests: Vec<String>,
    /// Templates for re-rendering production manuals
    pub manual: ManualConfig,
}

/// How a rebase invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseOutcome {
    /// Git stopped at the user's commit; `tortilla continue` resumes
    Paused {
        /// Step being edited
        step: Option<StepId>,
        /// Hash of HEAD at the stop
        head: String,
    },
    /// The rebase completed
    Finished {
        /// Tags that were (re)bound
        tagged: Vec<String>,
        /// Tags removed because their super step no longer exists
        pruned: Vec<String>,
    },
}

impl RebaseOutcome {
    /// Check if control went back to the user mid-rebase
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        matches!(self, Self::Paused { .. })
    }
}

/// Start a step-history rebase (EFFECTFUL)
///
/// For `Reword`, `new_message` is the replacement message without the step
/// prefix. Fails with `StepNotFound` before touching anything when the
/// target step does not exist.
#[instrument(skip(repo, options, progress))]
pub fn start_rebase(
    repo: &GitRepo,
    edit: &SequenceEdit,
    new_message: Option<&str>,
    options: &RebaseOptions,
    progress: &dyn ProgressCallback,
) -> Result<RebaseOutcome> {
    if repo.is_rebasing() {
        return Err(Error::PolicyViolation(
            "a rebase is already in progress; run `tortilla continue` or `tortilla abort`"
                .to_string(),
        ));
    }
    if matches!(edit, SequenceEdit::Reword { .. }) && new_message.is_none_or(str::is_empty) {
        return Err(Error::MissingArgument("message"));
    }

    let first = first_affected_commit(repo, edit)?;
    let base = match repo.parent_of(&first)? {
        Some(parent) => RebaseBase::Commit(parent),
        None => RebaseBase::Root,
    };

    let mut state = RebaseState::for_operation(edit.clone());
    if let SequenceEdit::Edit { target } = edit {
        state.user_stop = Some(find_step(repo, *target)?.hash);
    }
    state.new_message = new_message.map(str::to_string);
    save_state(repo.git_dir(), &state)?;

    let envs = options.editor.rebase_envs(edit)?;
    if let Err(e) = repo.rebase_interactive(&base, &env_refs(&envs)) {
        clear_state(repo.git_dir())?;
        return Err(e);
    }

    drive(repo, &mut state, options, progress)
}

/// Resume after the user finished editing (EFFECTFUL)
#[instrument(skip_all)]
pub fn continue_rebase(
    repo: &GitRepo,
    options: &RebaseOptions,
    progress: &dyn ProgressCallback,
) -> Result<RebaseOutcome> {
    if !repo.is_rebasing() {
        return Err(Error::PolicyViolation("no rebase in progress".to_string()));
    }
    let mut state = load_state(repo.git_dir())?;
    drive(repo, &mut state, options, progress)
}

/// Abandon the rebase and restore the original history (EFFECTFUL)
pub fn abort_rebase(repo: &GitRepo) -> Result<()> {
    if repo.is_rebasing() {
        repo.rebase_abort()?;
    }
    clear_state(repo.git_dir())?;
    info!("Rebase aborted");
    Ok(())
}

/// Record a tag binding for when the current rebase finishes
pub fn defer_tag(repo: &GitRepo, name: &str, hash: &str) -> Result<()> {
    let mut state = load_state(repo.git_dir())?;
    state.defer_tag(name, hash);
    save_state(repo.git_dir(), &state)
}

/// Oldest commit the rebase has to rewrite
fn first_affected_commit(repo: &GitRepo, edit: &SequenceEdit) -> Result<String> {
    match edit {
        SequenceEdit::Remove { target } if target.is_super() => {
            find_step(repo, *target)?;
            list_step_commits(repo)?
                .into_iter()
                .find(|c| c.descriptor.step.super_number == target.super_number)
                .map(|c| c.hash)
                .ok_or_else(|| Error::StepNotFound(target.to_string()))
        }
        SequenceEdit::Edit { target }
        | SequenceEdit::Reword { target }
        | SequenceEdit::Remove { target } => Ok(find_step(repo, *target)?.hash),
        SequenceEdit::Renumber => list_step_commits(repo)?
            .into_iter()
            .next()
            .map(|c| c.hash)
            .ok_or_else(|| Error::StepNotFound("no step commits in history".to_string())),
    }
}

/// Walk every stop until the rebase finishes or reaches the user's commit
fn drive(
    repo: &GitRepo,
    state: &mut RebaseState,
    options: &RebaseOptions,
    progress: &dyn ProgressCallback,
) -> Result<RebaseOutcome> {
    let renderer = repo_renderer(repo, &options.manual)?;
    loop {
        if !repo.is_rebasing() {
            return finish(repo, state, progress);
        }

        let stopped = repo.rebase_stopped_commit()?;
        let conflicts = repo.conflicted_files()?;
        let resumed = std::mem::take(&mut state.conflicted);
        if !conflicts.is_empty()
            && let Err(e) = resolve_conflicts(repo, &conflicts, options, progress)
        {
            state.conflicted = true;
            save_state(repo.git_dir(), state)?;
            return Err(e);
        }
        // A conflicted pick leaves its resolution in the index, uncommitted
        if resumed || !conflicts.is_empty() {
            commit_resolution(repo, stopped.as_deref())?;
        }

        let at_user_stop = stopped.is_some() && stopped == state.user_stop;
        if at_user_stop && !state.handed_over {
            state.handed_over = true;
            state.dev_manual = manual_to_development(repo, options, &renderer, progress)?;
            save_state(repo.git_dir(), state)?;
            let head = repo.head()?;
            let step = parse_step(&repo.message_of(&head)?).map(|d| d.step);
            info!(?step, %head, "Stopped for editing");
            return Ok(RebaseOutcome::Paused { step, head });
        }

        // The user's commit keeps whatever they made of it
        if at_user_stop {
            if let Some(number) = state.dev_manual.take() {
                manual_to_production(repo, options, &renderer, number, progress)?;
            }
        } else {
            renumber_head(repo, state, options, &renderer, progress)?;
        }
        save_state(repo.git_dir(), state)?;

        let envs = options.editor.message_envs(None);
        repo.rebase_continue(&env_refs(&envs))?;
    }
}

/// Commit the index under the message of the pick that stopped on a
/// conflict, unless that commit already exists
fn commit_resolution(repo: &GitRepo, stopped: Option<&str>) -> Result<()> {
    let message = repo.message_of(stopped.unwrap_or("REBASE_HEAD"))?;
    if repo.message_of("HEAD")?.trim_end() == message.trim_end() {
        debug!("Conflict resolution already committed");
        return Ok(());
    }
    repo.commit(&message, true)?;
    Ok(())
}

/// Hand conflicted manifests to the reconciler; anything else stops the loop
fn resolve_conflicts(
    repo: &GitRepo,
    conflicts: &[String],
    options: &RebaseOptions,
    progress: &dyn ProgressCallback,
) -> Result<()> {
    let (manifests, others): (Vec<&String>, Vec<&String>) = conflicts
        .iter()
        .partition(|path| is_manifest(path, &options.manifests));

    if !others.is_empty() {
        let list = others
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        warn!(files = %list, "Unresolvable conflict");
        return Err(Error::RebaseConflict(format!(
            "resolve {list}, stage the result and run `tortilla continue`"
        )));
    }

    let paths: Vec<PathBuf> = manifests.iter().map(|p| repo.root().join(p)).collect();
    for path in &paths {
        resolve_manifest(path)?;
        progress.on_message(&format!("Reconciled {}", path.display()));
    }
    let refs: Vec<&Path> = paths.iter().map(PathBuf::as_path).collect();
    repo.add(&refs)
}

fn is_manifest(path: &str, manifests: &[String]) -> bool {
    let file_name = Path::new(path).file_name().and_then(|n| n.to_str());
    manifests
        .iter()
        .any(|m| m == path || Some(m.as_str()) == file_name)
}

/// Give HEAD the number its position calls for
fn renumber_head(
    repo: &GitRepo,
    state: &mut RebaseState,
    options: &RebaseOptions,
    renderer: &ManualRenderer,
    progress: &dyn ProgressCallback,
) -> Result<()> {
    let head_message = repo.message_of("HEAD")?;
    let Some(descriptor) = parse_step(&head_message) else {
        debug!("HEAD is not a step commit; leaving it");
        return Ok(());
    };

    let previous = recent_step(repo, 1)?.map(|d| d.step);
    let old = descriptor.step;
    let new = renumbered(previous, old.kind())?;

    let body = match (&state.operation, &state.new_message) {
        (Some(SequenceEdit::Reword { target }), Some(message)) if *target == old => {
            message.clone()
        }
        _ => descriptor.message.clone(),
    };
    let message = format!("{}{body}", new.prefix());

    let mut manual_changed = false;
    if new.is_super() {
        let dir = repo.root().join(&options.steps_dir);
        let to = dir.join(instruction_file_name(new.super_number));
        if new != old {
            let from = dir.join(instruction_file_name(old.super_number));
            if from.exists() {
                repo.move_file(&from, &to)?;
            }
        }
        let context = ManualContext {
            step: new.super_number,
            title: body.lines().next().unwrap_or_default().to_string(),
        };
        manual_changed = refresh_manual(repo, renderer, &to, &context)?;
    }

    let head = if message.trim_end() == head_message.trim_end() && new == old && !manual_changed {
        repo.head()?
    } else {
        let envs = options.editor.message_envs(Some(&message));
        let head = repo.amend(&env_refs(&envs))?;
        if new == old {
            progress.on_message(&format!("Updated Step {new}"));
        } else {
            progress.on_message(&format!("Step {old} is now Step {new}"));
        }
        head
    };

    if new.is_super() {
        state.defer_tag(&new.tag_name(), &head);
    }
    Ok(())
}

/// Re-render a production manual for the step it belongs to now and stage
/// it; returns whether the file changed
fn refresh_manual(
    repo: &GitRepo,
    renderer: &ManualRenderer,
    path: &Path,
    context: &ManualContext,
) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    let markdown = fs::read_to_string(path)?;
    if !is_production_format(&markdown)? {
        return Ok(false);
    }
    let rendered = renderer.to_production_format(&markdown, context)?;
    if rendered == markdown {
        return Ok(false);
    }
    fs::write(path, rendered)?;
    repo.add(&[path])?;
    debug!(path = %path.display(), step = context.step, "Re-rendered manual");
    Ok(true)
}

/// Switch HEAD's production manual to development format for the user's
/// edit session; returns the super step number when it did
fn manual_to_development(
    repo: &GitRepo,
    options: &RebaseOptions,
    renderer: &ManualRenderer,
    progress: &dyn ProgressCallback,
) -> Result<Option<u32>> {
    let Some(descriptor) = parse_step(&repo.message_of("HEAD")?) else {
        return Ok(None);
    };
    if !descriptor.step.is_super() {
        return Ok(None);
    }
    let number = descriptor.step.super_number;
    let relative = options.steps_dir.join(instruction_file_name(number));
    let path = repo.root().join(&relative);
    if !path.is_file() {
        return Ok(None);
    }
    let markdown = fs::read_to_string(&path)?;
    if !is_production_format(&markdown)? {
        return Ok(None);
    }
    fs::write(&path, renderer.to_development_format(&markdown)?)?;
    progress.on_message(&format!(
        "{} is in development format until `tortilla continue`",
        relative.display()
    ));
    Ok(Some(number))
}

/// Render the manual switched by [`manual_to_development`] back to
/// production format and fold it into its step's commit
fn manual_to_production(
    repo: &GitRepo,
    options: &RebaseOptions,
    renderer: &ManualRenderer,
    number: u32,
    progress: &dyn ProgressCallback,
) -> Result<()> {
    let relative = options.steps_dir.join(instruction_file_name(number));
    let path = repo.root().join(&relative);
    if !path.is_file() {
        return Ok(());
    }

    let commit = find_step(repo, StepId::super_step(number))?;
    if commit.hash != repo.head()? {
        // Later commits were pushed on top; only the step's own commit may
        // carry its manual
        warn!(step = number, "HEAD moved past the step; manual left as committed");
        progress.on_message(&format!(
            "{} restored; amend Step {number} to change its manual",
            relative.display()
        ));
        return repo.restore_file(&path);
    }

    let context = ManualContext {
        step: number,
        title: commit.descriptor.subject().to_string(),
    };
    let markdown = fs::read_to_string(&path)?;
    fs::write(&path, renderer.to_production_format(&markdown, &context)?)?;
    repo.add(&[path.as_path()])?;
    if repo.staged_files(Some(&relative.to_string_lossy()))?.is_empty() {
        return Ok(());
    }
    let envs = options.editor.message_envs(None);
    repo.amend(&env_refs(&envs))?;
    progress.on_message(&format!("Updated the Step {number} manual"));
    Ok(())
}

/// Bind recorded tags, drop tags of vanished super steps, forget the state
fn finish(
    repo: &GitRepo,
    state: &RebaseState,
    progress: &dyn ProgressCallback,
) -> Result<RebaseOutcome> {
    let supers: BTreeMap<u32, String> = list_step_commits(repo)?
        .into_iter()
        .filter(|c| c.descriptor.step.is_super())
        .map(|c| (c.descriptor.step.super_number, c.hash))
        .collect();

    let mut tagged = Vec::new();
    for tag in &state.pending_tags {
        if parse_tag_name(&tag.name).is_some_and(|n| supers.contains_key(&n)) {
            repo.set_tag(&tag.name, &tag.hash)?;
            tagged.push(tag.name.clone());
        }
    }

    // Super steps git replayed without stopping got new hashes too
    for (number, hash) in &supers {
        let name = tag_name(*number);
        if tagged.contains(&name) || repo.tag_target(&name)?.as_deref() == Some(hash.as_str()) {
            continue;
        }
        repo.set_tag(&name, hash)?;
        tagged.push(name);
    }

    let mut pruned = Vec::new();
    for name in repo.step_tags()? {
        if parse_tag_name(&name).is_some_and(|n| !supers.contains_key(&n)) {
            repo.delete_tag(&name)?;
            progress.on_message(&format!("Removed tag {name}"));
            pruned.push(name);
        }
    }

    clear_state(repo.git_dir())?;
    info!(tagged = tagged.len(), pruned = pruned.len(), "Rebase finished");
    Ok(RebaseOutcome::Finished { tagged, pruned })
}
