//! Step model
//!
//! Parsing of `Step N[.M]: ...` commit messages and derivation of the next
//! step number from history. Parsing is pure; numbering reads history
//! through the [`History`](crate::repo::History) trait only. `ops` applies
//! step operations to a repository.

mod numbering;
mod ops;
mod parse;

pub use numbering::{
    find_step, next_step, next_super_step, recent_step, renumbered, step_grep, successor,
};
pub use ops::{
    amend_step, edit_step, pop_step, push_step, rebase_options, remove_step, renumber_steps,
    reword_step, tag_step,
};
pub use parse::{STEP_GREP, parse_step, parse_sub_step, parse_super_step, strip_step_prefix};
