//! Step numbering derived from history
//!
//! The commit message is the only record of a step's number, so every
//! computation here starts from the most recent step commit reachable from
//! `HEAD~offset`. The pure successor rules are split out so they can be
//! tested without a repository.

use super::parse::{STEP_GREP, parse_step};
use crate::error::{Error, Result};
use crate::repo::History;
use crate::types::{CommitDescriptor, StepCommit, StepId, StepKind};

/// Most recent step commit reachable from `HEAD~offset`
pub fn recent_step(history: &dyn History, offset: usize) -> Result<Option<CommitDescriptor>> {
    let commits = history.step_commits(STEP_GREP, offset)?;
    Ok(commits.into_iter().next().map(|c| c.descriptor))
}

/// Sub step that follows `previous` in a fresh push
pub fn successor(previous: Option<StepId>) -> Result<StepId> {
    let overflow = || Error::InvalidStep(format!("no step follows {}", display(previous)));
    match previous {
        None => Ok(StepId::sub_step(1, 1)),
        Some(prev) if prev.is_super() => prev
            .super_number
            .checked_add(1)
            .map(|n| StepId::sub_step(n, 1))
            .ok_or_else(overflow),
        Some(prev) => prev
            .sub_number
            .checked_add(1)
            .map(|n| StepId::sub_step(prev.super_number, n))
            .ok_or_else(overflow),
    }
}

fn display(step: Option<StepId>) -> String {
    step.map_or_else(|| "the root".to_string(), |s| format!("step {s}"))
}

/// Number a commit of the given kind should carry when it follows `previous`
pub fn renumbered(previous: Option<StepId>, kind: StepKind) -> Result<StepId> {
    let next = successor(previous)?;
    Ok(match kind {
        StepKind::Sub => next,
        StepKind::Super => StepId::super_step(next.super_number),
    })
}

/// Next sub step id, looking at history from `HEAD~offset`
pub fn next_step(history: &dyn History, offset: usize) -> Result<StepId> {
    let previous = recent_step(history, offset)?.map(|d| d.step);
    successor(previous)
}

/// Next super step number, looking at history from `HEAD~offset`
pub fn next_super_step(history: &dyn History, offset: usize) -> Result<u32> {
    Ok(next_step(history, offset)?.super_number)
}

/// Grep pattern matching exactly one step id
pub fn step_grep(step: StepId) -> String {
    if step.is_super() {
        format!("^Step {}: ", step.super_number)
    } else {
        format!("^Step {}\\.{}: ", step.super_number, step.sub_number)
    }
}

/// Locate the commit carrying `step`; fails with `StepNotFound` when absent
pub fn find_step(history: &dyn History, step: StepId) -> Result<StepCommit> {
    history
        .step_commits(&step_grep(step), 0)?
        .into_iter()
        .find(|c| c.descriptor.step == step)
        .ok_or_else(|| Error::StepNotFound(step.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successor_table() {
        assert_eq!(successor(None).unwrap(), StepId::sub_step(1, 1));
        assert_eq!(successor(Some(StepId::super_step(2))).unwrap(), StepId::sub_step(3, 1));
        assert_eq!(successor(Some(StepId::sub_step(2, 4))).unwrap(), StepId::sub_step(2, 5));
    }

    #[test]
    fn test_successor_overflow_is_an_error() {
        let last_super = StepId::super_step(u32::MAX);
        assert!(matches!(successor(Some(last_super)), Err(Error::InvalidStep(_))));
        let last_sub = StepId::sub_step(1, u32::MAX);
        assert!(matches!(successor(Some(last_sub)), Err(Error::InvalidStep(_))));
        assert!(renumbered(Some(last_super), StepKind::Super).is_err());
    }

    #[test]
    fn test_renumbered_super_closes_current_step() {
        assert_eq!(renumbered(None, StepKind::Super).unwrap(), StepId::super_step(1));
        assert_eq!(
            renumbered(Some(StepId::sub_step(1, 1)), StepKind::Super).unwrap(),
            StepId::super_step(1)
        );
        assert_eq!(
            renumbered(Some(StepId::super_step(1)), StepKind::Super).unwrap(),
            StepId::super_step(2)
        );
    }

    #[test]
    fn test_renumbered_sub_follows_successor() {
        assert_eq!(
            renumbered(Some(StepId::super_step(1)), StepKind::Sub).unwrap(),
            StepId::sub_step(2, 1)
        );
        assert_eq!(
            renumbered(Some(StepId::sub_step(3, 2)), StepKind::Sub).unwrap(),
            StepId::sub_step(3, 3)
        );
    }

    #[test]
    fn test_step_grep_escapes_dot() {
        assert_eq!(step_grep(StepId::super_step(2)), "^Step 2: ");
        assert_eq!(step_grep(StepId::sub_step(2, 1)), "^Step 2\\.1: ");
    }
}
