//! Rebase planning - pure functions over the sequence editor buffer
//!
//! This module contains the pure, testable logic that rewrites the to-do
//! list git hands to the sequence editor. No I/O happens here: the editor
//! entry point reads the file, calls [`RebasePlan::apply`], and writes the
//! result back.

use crate::error::{Error, Result};
use crate::step::parse_step;
use crate::types::StepId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verb of a to-do line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebaseAction {
    /// Replay the commit unchanged
    Pick,
    /// Replay and stop so the commit can be amended
    Edit,
    /// Replay and open the message editor
    Reword,
    /// Skip the commit
    Drop,
}

impl RebaseAction {
    fn parse(verb: &str) -> Option<Self> {
        match verb {
            "pick" | "p" => Some(Self::Pick),
            "edit" | "e" => Some(Self::Edit),
            "reword" | "r" => Some(Self::Reword),
            "drop" | "d" => Some(Self::Drop),
            _ => None,
        }
    }
}

impl fmt::Display for RebaseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pick => write!(f, "pick"),
            Self::Edit => write!(f, "edit"),
            Self::Reword => write!(f, "reword"),
            Self::Drop => write!(f, "drop"),
        }
    }
}

/// Verbs git accepts that tortilla passes through untouched
const PASSTHROUGH_VERBS: &[&str] = &[
    "exec", "x", "break", "b", "fixup", "f", "squash", "s", "label", "l", "reset", "t", "merge",
    "m", "update-ref", "u", "noop",
];

/// One line of the sequence editor buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanLine {
    /// A commit line tortilla may rewrite
    Commit(PlanEntry),
    /// Comments, blank lines and verbs tortilla does not rewrite, kept verbatim
    Verbatim(String),
}

/// A `pick`/`edit`/`reword`/`drop` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    /// What git will do with the commit
    pub action: RebaseAction,
    /// Abbreviated or full commit hash, as git wrote it
    pub commit_hash: String,
    /// Subject line as git wrote it
    pub original_message: String,
}

impl PlanEntry {
    /// Step carried by the subject, if any
    pub fn step(&self) -> Option<StepId> {
        // Newer git writes `pick <hash> # <subject>`
        let subject = self
            .original_message
            .strip_prefix("# ")
            .unwrap_or(&self.original_message);
        parse_step(subject).map(|d| d.step)
    }
}

impl fmt::Display for PlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.original_message.is_empty() {
            write!(f, "{} {}", self.action, self.commit_hash)
        } else {
            write!(
                f,
                "{} {} {}",
                self.action, self.commit_hash, self.original_message
            )
        }
    }
}

/// What the scripted sequence editor should do to the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SequenceEdit {
    /// Stop at `target` for the user; every later step stops for renumbering
    Edit {
        /// Step to hand to the user
        target: StepId,
    },
    /// Stop at `target` only, so its message can be replaced
    Reword {
        /// Step whose message changes
        target: StepId,
    },
    /// Drop `target` (a super step takes its sub steps with it); every later
    /// step stops for renumbering
    Remove {
        /// Step to remove
        target: StepId,
    },
    /// Stop at every step commit for renumbering
    Renumber,
}

impl SequenceEdit {
    /// The step this edit is anchored on, if any
    pub const fn target(&self) -> Option<StepId> {
        match self {
            Self::Edit { target } | Self::Reword { target } | Self::Remove { target } => {
                Some(*target)
            }
            Self::Renumber => None,
        }
    }
}

/// The parsed sequence editor buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebasePlan {
    /// Lines in file order
    pub lines: Vec<PlanLine>,
}

impl RebasePlan {
    /// Parse a to-do buffer.
    ///
    /// Unknown verbs are an error: silently keeping or dropping such a line
    /// could lose a commit.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                lines.push(PlanLine::Verbatim(raw.to_string()));
                continue;
            }

            let (verb, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
            if let Some(action) = RebaseAction::parse(verb) {
                let rest = rest.trim_start();
                let (hash, message) = rest.split_once(' ').unwrap_or((rest, ""));
                if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(Error::InvalidRebasePlan(format!(
                        "line {}: expected a commit hash after '{verb}': {raw}",
                        index + 1
                    )));
                }
                lines.push(PlanLine::Commit(PlanEntry {
                    action,
                    commit_hash: hash.to_string(),
                    original_message: message.to_string(),
                }));
            } else if PASSTHROUGH_VERBS.contains(&verb) {
                lines.push(PlanLine::Verbatim(raw.to_string()));
            } else {
                return Err(Error::InvalidRebasePlan(format!(
                    "line {}: unknown command '{verb}'",
                    index + 1
                )));
            }
        }
        Ok(Self { lines })
    }

    /// Commit lines in order
    pub fn entries(&self) -> impl Iterator<Item = &PlanEntry> {
        self.lines.iter().filter_map(|line| match line {
            PlanLine::Commit(entry) => Some(entry),
            PlanLine::Verbatim(_) => None,
        })
    }

    fn entries_mut(&mut self) -> impl Iterator<Item = &mut PlanEntry> {
        self.lines.iter_mut().filter_map(|line| match line {
            PlanLine::Commit(entry) => Some(entry),
            PlanLine::Verbatim(_) => None,
        })
    }

    /// Set `action` on every entry matching `predicate`; returns how many changed
    pub fn flip<F>(&mut self, action: RebaseAction, mut predicate: F) -> usize
    where
        F: FnMut(&PlanEntry) -> bool,
    {
        let mut count = 0;
        for entry in self.entries_mut() {
            if predicate(entry) {
                entry.action = action;
                count += 1;
            }
        }
        count
    }

    /// Delete every entry matching `predicate`; returns how many were removed
    pub fn remove<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&PlanEntry) -> bool,
    {
        let before = self.lines.len();
        self.lines.retain(|line| match line {
            PlanLine::Commit(entry) => !predicate(entry),
            PlanLine::Verbatim(_) => true,
        });
        before - self.lines.len()
    }

    /// Apply a sequence edit.
    ///
    /// Fails with `StepNotFound` when the edit's target has no line in the
    /// plan, before anything is changed.
    pub fn apply(&mut self, edit: &SequenceEdit) -> Result<()> {
        if let Some(target) = edit.target() {
            if !self.entries().any(|e| e.step() == Some(target)) {
                return Err(Error::StepNotFound(target.to_string()));
            }
        }

        match edit {
            SequenceEdit::Edit { target } => {
                let mut seen = false;
                self.flip(RebaseAction::Edit, |entry| {
                    seen |= entry.step() == Some(*target);
                    seen && entry.step().is_some()
                });
            }
            SequenceEdit::Reword { target } => {
                self.flip(RebaseAction::Edit, |entry| entry.step() == Some(*target));
            }
            SequenceEdit::Remove { target } => {
                let target = *target;
                self.remove(|entry| {
                    entry.step().is_some_and(|step| {
                        step == target
                            || (target.is_super() && step.super_number == target.super_number)
                    })
                });
                // Everything after the removed range is renumbered; anything
                // before it keeps its number.
                let mut after = false;
                self.flip(RebaseAction::Edit, |entry| {
                    let Some(step) = entry.step() else {
                        return false;
                    };
                    after |= step.super_number > target.super_number
                        || (!target.is_super()
                            && step.super_number == target.super_number
                            && (step.is_super() || step.sub_number > target.sub_number));
                    after
                });
            }
            SequenceEdit::Renumber => {
                self.flip(RebaseAction::Edit, |entry| entry.step().is_some());
            }
        }
        Ok(())
    }

    /// Serialize back to the buffer format
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                PlanLine::Commit(entry) => out.push_str(&entry.to_string()),
                PlanLine::Verbatim(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TODO: &str = "\
pick 1111111 Step 1.1: Add a
pick 2222222 Step 1: Close one
pick 3333333 Step 2.1: Add b
pick 4444444 Step 2.2: Add c
pick 5555555 Step 2: Close two

# Rebase 0000000..5555555 onto 0000000 (5 commands)
#
# Commands:
# p, pick <commit> = use commit
";

    fn actions(plan: &RebasePlan) -> Vec<RebaseAction> {
        plan.entries().map(|e| e.action).collect()
    }

    #[test]
    fn test_parse_and_render_preserves_unknown_lines() {
        let plan = RebasePlan::parse(TODO).unwrap();
        assert_eq!(plan.entries().count(), 5);
        assert_eq!(plan.render(), TODO);
    }

    #[test]
    fn test_parse_rejects_unknown_verb() {
        let err = RebasePlan::parse("pick 1111111 ok\nfrobnicate 2222222 nope\n").unwrap_err();
        assert!(matches!(err, Error::InvalidRebasePlan(msg) if msg.contains("frobnicate")));
    }

    #[test]
    fn test_parse_rejects_missing_hash() {
        assert!(RebasePlan::parse("pick\n").is_err());
        assert!(RebasePlan::parse("pick not-a-hash subject\n").is_err());
    }

    #[test]
    fn test_parse_keeps_exec_lines() {
        let text = "pick 1111111 Step 1.1: a\nexec make test\n";
        let plan = RebasePlan::parse(text).unwrap();
        assert_eq!(plan.render(), text);
    }

    #[test]
    fn test_edit_stops_at_target_and_everything_after() {
        let mut plan = RebasePlan::parse(TODO).unwrap();
        plan.apply(&SequenceEdit::Edit {
            target: StepId::sub_step(2, 1),
        })
        .unwrap();
        assert_eq!(
            actions(&plan),
            vec![
                RebaseAction::Pick,
                RebaseAction::Pick,
                RebaseAction::Edit,
                RebaseAction::Edit,
                RebaseAction::Edit,
            ]
        );
        assert!(plan.render().starts_with("pick 1111111 Step 1.1: Add a\n"));
        assert!(plan.render().contains("edit 3333333 Step 2.1: Add b\n"));
    }

    #[test]
    fn test_reword_only_touches_target() {
        let mut plan = RebasePlan::parse(TODO).unwrap();
        plan.apply(&SequenceEdit::Reword {
            target: StepId::super_step(1),
        })
        .unwrap();
        assert_eq!(
            actions(&plan),
            vec![
                RebaseAction::Pick,
                RebaseAction::Edit,
                RebaseAction::Pick,
                RebaseAction::Pick,
                RebaseAction::Pick,
            ]
        );
    }

    #[test]
    fn test_remove_super_step_drops_its_sub_steps() {
        let mut plan = RebasePlan::parse(TODO).unwrap();
        plan.apply(&SequenceEdit::Remove {
            target: StepId::super_step(1),
        })
        .unwrap();
        let hashes: Vec<&str> = plan.entries().map(|e| e.commit_hash.as_str()).collect();
        assert_eq!(hashes, vec!["3333333", "4444444", "5555555"]);
        assert_eq!(actions(&plan), vec![RebaseAction::Edit; 3]);
    }

    #[test]
    fn test_remove_sub_step_renumbers_following_siblings_only() {
        let mut plan = RebasePlan::parse(TODO).unwrap();
        plan.apply(&SequenceEdit::Remove {
            target: StepId::sub_step(2, 1),
        })
        .unwrap();
        let hashes: Vec<&str> = plan.entries().map(|e| e.commit_hash.as_str()).collect();
        assert_eq!(hashes, vec!["1111111", "2222222", "4444444", "5555555"]);
        assert_eq!(
            actions(&plan),
            vec![
                RebaseAction::Pick,
                RebaseAction::Pick,
                RebaseAction::Edit,
                RebaseAction::Edit,
            ]
        );
    }

    #[test]
    fn test_renumber_marks_every_step() {
        let text = "pick 0000000 Initial commit\npick 1111111 Step 1.1: a\n";
        let mut plan = RebasePlan::parse(text).unwrap();
        plan.apply(&SequenceEdit::Renumber).unwrap();
        assert_eq!(
            plan.render(),
            "pick 0000000 Initial commit\nedit 1111111 Step 1.1: a\n"
        );
    }

    #[test]
    fn test_missing_target_is_step_not_found_and_leaves_plan_untouched() {
        let mut plan = RebasePlan::parse(TODO).unwrap();
        let err = plan
            .apply(&SequenceEdit::Edit {
                target: StepId::super_step(9),
            })
            .unwrap_err();
        assert!(matches!(err, Error::StepNotFound(s) if s == "9"));
        assert_eq!(plan.render(), TODO);
    }

    #[test]
    fn test_sequence_edit_json_shape() {
        let edit = SequenceEdit::Reword {
            target: StepId::sub_step(1, 2),
        };
        let json = serde_json::to_string(&edit).unwrap();
        assert!(json.contains("\"kind\":\"reword\""));
        let back: SequenceEdit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, edit);
    }
}
