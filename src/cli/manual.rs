//! Manual command - toggle instruction files between formats

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check};
use anstream::println;
use std::path::Path;
use tortilla::error::{Error, Result};
use tortilla::manual::{ManualFormat, render_manual, repo_renderer};
use tortilla::repo::list_step_commits;

/// Which instruction files to convert
#[derive(Debug, Clone, Copy)]
pub enum ManualSelection {
    /// One super step
    Step(u32),
    /// Every super step in history
    All,
    /// The most recent super step
    Current,
}

/// Run `manual render`
pub fn run_render(path: &Path, format: ManualFormat, selection: ManualSelection) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let renderer = repo_renderer(&ctx.repo, &ctx.config.manual)?;

    let numbers: Vec<u32> = match selection {
        ManualSelection::Step(n) => vec![n],
        ManualSelection::All | ManualSelection::Current => {
            let supers = list_step_commits(&ctx.repo)?
                .into_iter()
                .map(|c| c.descriptor.step)
                .filter(|s| s.is_super())
                .map(|s| s.super_number);
            if matches!(selection, ManualSelection::All) {
                supers.collect()
            } else {
                supers.last().into_iter().collect()
            }
        }
    };

    let mut converted = 0;
    for number in numbers {
        match render_manual(&ctx.repo, &ctx.config, &renderer, number, format)? {
            Some(file) => {
                converted += 1;
                println!("{} {}", check(), file.display().to_string().emphasis());
            }
            None if matches!(selection, ManualSelection::Step(_)) => {
                return Err(Error::StepNotFound(format!(
                    "no instruction file for step {number}"
                )));
            }
            None => {}
        }
    }

    if converted == 0 {
        println!("{}", "No instruction files to render".muted());
    }
    Ok(())
}
