//! Rebase session commands - continue, abort, amend

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::step::{report_outcome, with_spinner};
use crate::cli::style::{Stylize, check};
use anstream::println;
use std::path::Path;
use tortilla::error::Result;
use tortilla::rebase::{abort_rebase, continue_rebase};
use tortilla::step::amend_step;

/// Run `continue`
pub fn run_continue(path: &Path) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let options = ctx.rebase_options();
    let outcome = with_spinner("Continuing", || {
        continue_rebase(&ctx.repo, &options, &CliProgress::compact())
    })?;
    report_outcome(&outcome);
    Ok(())
}

/// Run `abort`
pub fn run_abort(path: &Path) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    abort_rebase(&ctx.repo)?;
    println!("{} {}", check(), "Rebase aborted; history and tags restored".muted());
    Ok(())
}

/// Run `amend`
pub fn run_amend(path: &Path, message: Option<&str>) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let head = amend_step(&ctx.repo, message)?;
    println!(
        "{} Amended {}",
        check(),
        head.get(..7).unwrap_or(&head).emphasis()
    );
    Ok(())
}
