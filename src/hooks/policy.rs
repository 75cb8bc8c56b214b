//! Hook policies (pure, testable)
//!
//! Every function takes the invocation flag and a [`History`] so the rules
//! can be checked without spawning git.

use crate::error::{Error, Result};
use crate::repo::{History, Invocation};
use crate::step::{parse_step, strip_step_prefix};
use crate::types::instruction_file_name;
use std::path::Path;

/// Pre-commit: only amends during a rebase are allowed, and a closed super
/// step's commit may change nothing but its own instruction file
pub fn check_pre_commit(
    history: &dyn History,
    invocation: Invocation,
    steps_dir: &Path,
) -> Result<()> {
    if invocation.is_internal() {
        return Ok(());
    }
    if !(history.is_rebasing() && invocation.gonna_amend()) {
        return Err(Error::PolicyViolation(
            "new commits are not allowed; use `tortilla step push`, or `tortilla step edit` \
             and `tortilla amend` to change a step"
                .to_string(),
        ));
    }

    let head = history.recent_commit(None, "%B", 0)?;
    let Some(descriptor) = parse_step(&head) else {
        return Ok(());
    };
    if !descriptor.step.is_super() {
        return Ok(());
    }

    let allowed = steps_dir
        .join(instruction_file_name(descriptor.step.super_number))
        .to_string_lossy()
        .replace('\\', "/");
    let foreign: Vec<String> = history
        .staged_files(None)?
        .into_iter()
        .filter(|f| *f != allowed)
        .collect();
    if foreign.is_empty() {
        Ok(())
    } else {
        Err(Error::PolicyViolation(format!(
            "Step {} is closed; only {allowed} may change (staged: {})",
            descriptor.step,
            foreign.join(", ")
        )))
    }
}

/// Prepare-commit-msg: the user edits the message without its prefix.
///
/// A cherry-picked message keeps its own prefix untouched.
pub fn prepare_message(
    history: &dyn History,
    invocation: Invocation,
    message: &str,
) -> Option<String> {
    if invocation.is_internal() || history.is_cherry_picking() {
        return None;
    }
    let stripped = strip_step_prefix(message);
    (stripped.len() != message.len()).then(|| stripped.to_string())
}

/// Commit-msg: put HEAD's prefix back in front of the edited message.
///
/// Unstepped commits (the root commit included) are left alone, and so is
/// a cherry-picked message, which carries the prefix of the commit it
/// came from rather than HEAD's.
pub fn finalize_message(
    history: &dyn History,
    invocation: Invocation,
    message: &str,
) -> Result<Option<String>> {
    if invocation.is_internal() || history.is_cherry_picking() || message.trim().is_empty() {
        return Ok(None);
    }
    let head = history.recent_commit(None, "%B", 0)?;
    let Some(descriptor) = parse_step(&head) else {
        return Ok(None);
    };
    let full = format!("{}{}", descriptor.step.prefix(), strip_step_prefix(message));
    Ok((full != message).then_some(full))
}

/// Pre-rebase: only tortilla rewrites history
pub fn check_pre_rebase(invocation: Invocation) -> Result<()> {
    if invocation.is_internal() {
        Ok(())
    } else {
        Err(Error::PolicyViolation(
            "rebasing step history directly is not allowed; use `tortilla step edit`, \
             `tortilla step remove` or `tortilla step renumber`"
                .to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StepCommit;

    struct FakeHistory {
        rebasing: bool,
        cherry_picking: bool,
        head: &'static str,
        staged: Vec<&'static str>,
    }

    impl History for FakeHistory {
        fn recent_commit(&self, _: Option<&str>, _: &str, _: usize) -> Result<String> {
            Ok(self.head.to_string())
        }
        fn step_commits(&self, _: &str, _: usize) -> Result<Vec<StepCommit>> {
            Ok(Vec::new())
        }
        fn is_rebasing(&self) -> bool {
            self.rebasing
        }
        fn is_cherry_picking(&self) -> bool {
            self.cherry_picking
        }
        fn tag_exists(&self, _: &str) -> Result<bool> {
            Ok(false)
        }
        fn staged_files(&self, _: Option<&str>) -> Result<Vec<String>> {
            Ok(self.staged.iter().map(|s| (*s).to_string()).collect())
        }
    }

    fn history(rebasing: bool, head: &'static str, staged: Vec<&'static str>) -> FakeHistory {
        FakeHistory {
            rebasing,
            cherry_picking: false,
            head,
            staged,
        }
    }

    #[test]
    fn test_pre_commit_rejects_plain_commit() {
        let h = history(false, "Step 1.1: a", vec!["a.txt"]);
        let err = check_pre_commit(&h, Invocation::External, Path::new("steps")).unwrap_err();
        assert!(matches!(err, Error::PolicyViolation(_)));
    }

    #[test]
    fn test_pre_commit_rejects_new_commit_while_rebasing() {
        let h = history(true, "Step 1.1: a", vec!["a.txt"]);
        assert!(check_pre_commit(&h, Invocation::External, Path::new("steps")).is_err());
    }

    #[test]
    fn test_pre_commit_allows_amend_while_rebasing() {
        let h = history(true, "Step 1.1: a", vec!["a.txt"]);
        check_pre_commit(&h, Invocation::Amend, Path::new("steps")).unwrap();
    }

    #[test]
    fn test_pre_commit_amend_outside_rebase_rejected() {
        let h = history(false, "Step 1.1: a", vec![]);
        assert!(check_pre_commit(&h, Invocation::Amend, Path::new("steps")).is_err());
    }

    #[test]
    fn test_pre_commit_internal_always_allowed() {
        let h = history(false, "Step 2: closed", vec!["src/x.rs"]);
        check_pre_commit(&h, Invocation::Internal, Path::new("steps")).unwrap();
    }

    #[test]
    fn test_closed_super_step_only_accepts_its_instruction_file() {
        let ok = history(true, "Step 2: closed", vec!["steps/step2.md"]);
        check_pre_commit(&ok, Invocation::Amend, Path::new("steps")).unwrap();

        let bad = history(true, "Step 2: closed", vec!["steps/step2.md", "src/x.rs"]);
        let err = check_pre_commit(&bad, Invocation::Amend, Path::new("steps")).unwrap_err();
        assert!(matches!(err, Error::PolicyViolation(ref m) if m.contains("src/x.rs")));
    }

    #[test]
    fn test_prepare_strips_prefix() {
        let h = history(true, "Step 1.2: Add b", vec![]);
        assert_eq!(
            prepare_message(&h, Invocation::Amend, "Step 1.2: Add b\n\nbody\n").as_deref(),
            Some("Add b\n\nbody\n")
        );
        assert_eq!(prepare_message(&h, Invocation::Amend, "Add b\n"), None);
        assert_eq!(prepare_message(&h, Invocation::Internal, "Step 1.2: Add b"), None);
    }

    #[test]
    fn test_cherry_picked_message_keeps_its_prefix() {
        let mut h = history(true, "Step 3.4: head", vec![]);
        h.cherry_picking = true;
        assert_eq!(prepare_message(&h, Invocation::Amend, "Step 1.2: picked\n"), None);
        assert_eq!(
            finalize_message(&h, Invocation::Amend, "Step 1.2: picked\n").unwrap(),
            None
        );
        assert_eq!(finalize_message(&h, Invocation::Amend, "picked\n").unwrap(), None);
    }

    #[test]
    fn test_finalize_restores_head_prefix() {
        let h = history(true, "Step 3.4: old subject", vec![]);
        assert_eq!(
            finalize_message(&h, Invocation::Amend, "new subject\n")
                .unwrap()
                .as_deref(),
            Some("Step 3.4: new subject\n")
        );
        assert_eq!(
            finalize_message(&h, Invocation::Amend, "Step 3.4: new subject\n").unwrap(),
            None
        );
    }

    #[test]
    fn test_finalize_leaves_root_commit() {
        let h = history(false, "Initial commit", vec![]);
        assert_eq!(
            finalize_message(&h, Invocation::External, "Initial commit").unwrap(),
            None
        );
    }

    #[test]
    fn test_pre_rebase() {
        check_pre_rebase(Invocation::Internal).unwrap();
        assert!(check_pre_rebase(Invocation::External).is_err());
        assert!(check_pre_rebase(Invocation::Amend).is_err());
    }
}
