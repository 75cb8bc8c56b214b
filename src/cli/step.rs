//! Step commands - push, tag, pop, edit, reword, remove, renumber, list

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, arrow, check, spinner_style};
use anstream::println;
use dialoguer::Confirm;
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;
use tortilla::error::{Error, Result};
use tortilla::rebase::RebaseOutcome;
use tortilla::repo::list_step_commits;
use tortilla::step;
use tortilla::types::{StepCommit, StepId};

/// Run `step push`
pub fn run_push(path: &Path, message: &str, allow_empty: bool) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let commit = step::push_step(&ctx.repo, message, allow_empty)?;
    print_commit("Pushed", &commit);
    Ok(())
}

/// Run `step tag`
pub fn run_tag(path: &Path, message: &str) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let commit = step::tag_step(&ctx.repo, &ctx.config, message)?;
    print_commit("Tagged", &commit);
    println!(
        "  {} {}",
        arrow(),
        commit.descriptor.step.tag_name().accent()
    );
    Ok(())
}

/// Run `step pop`
pub fn run_pop(path: &Path, yes: bool) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let head = ctx.repo.head()?;
    let message = ctx.repo.message_of(&head)?;

    if !yes {
        println!("{} {}", "HEAD:".muted(), message.lines().next().unwrap_or_default());
        if !Confirm::new()
            .with_prompt("Discard this step and its changes?")
            .default(false)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?
        {
            println!("{}", "Aborted".muted());
            return Ok(());
        }
    }

    let commit = step::pop_step(&ctx.repo)?;
    print_commit("Popped", &commit);
    Ok(())
}

/// Run `step edit`
pub fn run_edit(path: &Path, step_id: &str) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let target: StepId = step_id.parse()?;
    let options = ctx.rebase_options();
    let outcome = with_spinner(&format!("Rewinding to Step {target}"), || {
        step::edit_step(&ctx.repo, target, &options, &CliProgress::compact())
    })?;
    report_outcome(&outcome);
    Ok(())
}

/// Run `step reword`
pub fn run_reword(path: &Path, step_id: &str, message: &str) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let target: StepId = step_id.parse()?;
    let options = ctx.rebase_options();
    let outcome = with_spinner(&format!("Rewording Step {target}"), || {
        step::reword_step(&ctx.repo, target, message, &options, &CliProgress::compact())
    })?;
    report_outcome(&outcome);
    Ok(())
}

/// Run `step remove`
pub fn run_remove(path: &Path, step_id: &str, yes: bool) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let target: StepId = step_id.parse()?;

    if !yes
        && !Confirm::new()
            .with_prompt(format!("Remove Step {target} and renumber the steps after it?"))
            .default(false)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?
    {
        println!("{}", "Aborted".muted());
        return Ok(());
    }

    let options = ctx.rebase_options();
    let outcome = with_spinner(&format!("Removing Step {target}"), || {
        step::remove_step(&ctx.repo, target, &options, &CliProgress::compact())
    })?;
    report_outcome(&outcome);
    Ok(())
}

/// Run `step renumber`
pub fn run_renumber(path: &Path) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let options = ctx.rebase_options();
    let outcome = with_spinner("Renumbering steps", || {
        step::renumber_steps(&ctx.repo, &options, &CliProgress::compact())
    })?;
    report_outcome(&outcome);
    Ok(())
}

/// Run `step list`
pub fn run_list(path: &Path) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let commits = list_step_commits(&ctx.repo)?;
    if commits.is_empty() {
        println!("{}", "No steps yet. Run 'tortilla step push' to create one.".muted());
        return Ok(());
    }

    for commit in &commits {
        let id = commit.descriptor.step;
        let short = commit.hash.get(..7).unwrap_or(&commit.hash);
        if id.is_super() {
            println!(
                "{} {} {} {}",
                short.muted(),
                format!("Step {id}:").emphasis(),
                commit.descriptor.subject(),
                format!("({})", id.tag_name()).accent()
            );
        } else {
            println!(
                "{}   {} {}",
                short.muted(),
                format!("Step {id}:").accent(),
                commit.descriptor.subject()
            );
        }
    }
    Ok(())
}

pub(crate) fn with_spinner<T>(message: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(format!("{message}..."));
    spinner.enable_steady_tick(Duration::from_millis(80));
    let result = f();
    spinner.finish_and_clear();
    result
}

fn print_commit(verb: &str, commit: &StepCommit) {
    println!(
        "{} {} {} {}",
        check(),
        verb,
        format!("Step {}:", commit.descriptor.step).emphasis(),
        commit.descriptor.subject()
    );
}

pub(crate) fn report_outcome(outcome: &RebaseOutcome) {
    match outcome {
        RebaseOutcome::Paused { step, head } => {
            let label = step.map_or_else(|| "HEAD".to_string(), |s| format!("Step {s}"));
            println!(
                "{} Stopped at {} {}",
                check(),
                label.emphasis(),
                head.get(..7).unwrap_or(head).muted()
            );
            println!(
                "  {}",
                "Make your changes, run 'tortilla amend', then 'tortilla continue'.".muted()
            );
        }
        RebaseOutcome::Finished { tagged, pruned } => {
            println!("{} {}", check(), "History rewritten".success());
            if !tagged.is_empty() {
                println!("  {} tagged {}", arrow(), tagged.join(", ").accent());
            }
            if !pruned.is_empty() {
                println!("  {} removed {}", arrow(), pruned.join(", ").warn());
            }
        }
    }
}
