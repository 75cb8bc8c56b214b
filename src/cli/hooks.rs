//! Entry points git calls back into - hooks and scripted editors

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check};
use anstream::println;
use std::path::Path;
use tortilla::editor::{MESSAGE_ENV, SEQUENCE_EDIT_ENV, edit_message, edit_sequence};
use tortilla::error::Result;
use tortilla::hooks::{HookName, install_hooks, run_hook};
use tortilla::repo::Invocation;

/// Run `hooks install`
pub fn run_install(path: &Path) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let written = install_hooks(&ctx.repo, ctx.editor.program())?;
    for file in &written {
        println!("{} {}", check(), file.display().to_string().emphasis());
    }
    Ok(())
}

/// Run hidden `hook <name>`
pub fn run_hook_command(path: &Path, name: &str, args: &[String]) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let name: HookName = name.parse()?;
    run_hook(
        &ctx.repo,
        name,
        args,
        Invocation::from_env(),
        &ctx.config.steps_dir,
    )
}

/// Which scripted editor git is invoking
#[derive(Debug, Clone, Copy)]
pub enum EditorKind {
    /// Rebase to-do list
    Sequence,
    /// Commit message
    Message,
}

/// Run hidden `editor sequence|message FILE`
pub fn run_editor(kind: EditorKind, file: &Path) -> Result<()> {
    match kind {
        EditorKind::Sequence => {
            edit_sequence(file, std::env::var(SEQUENCE_EDIT_ENV).ok().as_deref())
        }
        EditorKind::Message => edit_message(file, std::env::var(MESSAGE_ENV).ok().as_deref()),
    }
}
