//! tortilla - author tutorials as git history
//!
//! Every step of a tutorial is a commit whose message starts with
//! `Step N: ` (a super step, closed by tag `stepN` and its instruction file
//! `steps/stepN.md`) or `Step N.M: ` (a sub step). The commit message is the
//! only record of a step's number; this crate derives numbers from history,
//! rewrites history through scripted interactive rebases when steps are
//! edited or removed, and converts the instruction files' manuals between
//! template source and rendered output.
//!
//! # Modules
//!
//! - [`step`] - step parsing, numbering and operations
//! - [`repo`] - git access through the CLI
//! - [`rebase`] - to-do list planning and the rebase loop
//! - [`editor`] - scripted sequence and message editors
//! - [`hooks`] - commit and rebase policies enforced through git hooks
//! - [`manual`] - manual block notation and format conversion
//! - [`config`] - project configuration

pub mod config;
pub mod editor;
pub mod error;
pub mod hooks;
pub mod manual;
pub mod rebase;
pub mod repo;
pub mod step;
pub mod types;
