//! Commit message parsing - pure functions, no I/O

use crate::types::{CommitDescriptor, StepId, SubStepDescriptor, SuperStepDescriptor};
use regex::Regex;
use std::sync::LazyLock;

/// Any step prefix. `(?s)` lets the message group run over the body lines.
static STEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\AStep (\d+)(?:\.(\d+))?: (.*)\z").expect("valid step regex")
});

/// Super step prefix only; the colon right after the digits excludes `N.M`
static SUPER_STEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\AStep (\d+): (.*)\z").expect("valid super step regex"));

/// Sub step prefix only
static SUB_STEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\AStep (\d+)\.(\d+): (.*)\z").expect("valid sub step regex")
});

/// Extended regex handed to `git log --grep` to find step commits
pub const STEP_GREP: &str = r"^Step [0-9]+(\.[0-9]+)?: ";

/// Parse a commit message carrying any step prefix.
///
/// Returns `None` for unstepped commits (root commit or pre-tutorial history).
pub fn parse_step(message: &str) -> Option<CommitDescriptor> {
    let caps = STEP_RE.captures(message)?;
    let super_number = positive(caps.get(1)?.as_str())?;
    let sub_number = match caps.get(2) {
        Some(sub) => positive(sub.as_str())?,
        None => 0,
    };
    Some(CommitDescriptor {
        step: StepId::sub_step(super_number, sub_number),
        message: caps.get(3)?.as_str().to_string(),
    })
}

/// Parse a `Step N: ...` message; sub step messages yield `None`
pub fn parse_super_step(message: &str) -> Option<SuperStepDescriptor> {
    let caps = SUPER_STEP_RE.captures(message)?;
    Some(SuperStepDescriptor {
        number: positive(caps.get(1)?.as_str())?,
        message: caps.get(2)?.as_str().to_string(),
    })
}

/// Parse a `Step N.M: ...` message; super step messages yield `None`
pub fn parse_sub_step(message: &str) -> Option<SubStepDescriptor> {
    let caps = SUB_STEP_RE.captures(message)?;
    let super_number = positive(caps.get(1)?.as_str())?;
    let sub_number = positive(caps.get(2)?.as_str())?;
    Some(SubStepDescriptor {
        number: StepId::sub_step(super_number, sub_number),
        super_number,
        sub_number,
        message: caps.get(3)?.as_str().to_string(),
    })
}

/// Remove a leading step prefix, leaving the human-written text.
///
/// Messages without a prefix are returned unchanged.
pub fn strip_step_prefix(message: &str) -> &str {
    STEP_RE
        .captures(message)
        .and_then(|caps| caps.get(3))
        .map_or(message, |m| &message[m.start()..])
}

fn positive(digits: &str) -> Option<u32> {
    digits.parse().ok().filter(|n| *n > 0)
}
