//! History rewriting for step edits
//!
//! Same split as the rest of the crate:
//! 1. Plan - rewrite git's to-do list for a `SequenceEdit` (pure, testable)
//! 2. Execute - run the rebase and renumber every stop (effectful)
//!
//! State that must survive between `tortilla step edit` and
//! `tortilla continue` is persisted by the `state` module.

mod conflict;
mod execute;
mod plan;
mod state;

pub use conflict::{ConflictSides, merge_values, reconcile_json, resolve_manifest, split_conflict};
pub use execute::{
    ProgressCallback, RebaseOptions, RebaseOutcome, SilentProgress, abort_rebase,
    continue_rebase, defer_tag, start_rebase,
};
pub use plan::{PlanEntry, PlanLine, RebaseAction, RebasePlan, SequenceEdit};
pub use state::{PendingTag, RebaseState, STATE_VERSION, clear_state, load_state, save_state, state_path};
