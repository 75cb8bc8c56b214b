//! Core types for tortilla

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix of every step tag (`step1`, `step2`, ...)
pub const TAG_PREFIX: &str = "step";

/// A step identifier: `N` for a super step, `N.M` for a sub step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId {
    /// Super step number, starting at 1
    pub super_number: u32,
    /// Sub step number; 0 marks the super step itself
    pub sub_number: u32,
}

impl StepId {
    /// A super step (milestone) identifier
    pub const fn super_step(number: u32) -> Self {
        Self {
            super_number: number,
            sub_number: 0,
        }
    }

    /// A sub step identifier within super step `super_number`
    pub const fn sub_step(super_number: u32, sub_number: u32) -> Self {
        Self {
            super_number,
            sub_number,
        }
    }

    /// Whether this identifies a super step
    pub const fn is_super(&self) -> bool {
        self.sub_number == 0
    }

    /// Kind of step this identifier denotes
    pub const fn kind(&self) -> StepKind {
        if self.is_super() {
            StepKind::Super
        } else {
            StepKind::Sub
        }
    }

    /// Tag bound to the commit closing this step's super step
    pub fn tag_name(&self) -> String {
        tag_name(self.super_number)
    }

    /// Commit message prefix, including the trailing space
    pub fn prefix(&self) -> String {
        format!("Step {self}: ")
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_super() {
            write!(f, "{}", self.super_number)
        } else {
            write!(f, "{}.{}", self.super_number, self.sub_number)
        }
    }
}

impl FromStr for StepId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidStep(s.to_string());
        let (super_part, sub_part) = match s.trim().split_once('.') {
            Some((sup, sub)) => (sup, Some(sub)),
            None => (s.trim(), None),
        };
        let super_number: u32 = super_part.parse().map_err(|_| invalid())?;
        if super_number == 0 {
            return Err(invalid());
        }
        let sub_number = match sub_part {
            Some(sub) => {
                let n: u32 = sub.parse().map_err(|_| invalid())?;
                if n == 0 {
                    return Err(invalid());
                }
                n
            }
            None => 0,
        };
        Ok(Self {
            super_number,
            sub_number,
        })
    }
}

/// Whether a step is a milestone or an incremental commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    /// Tagged milestone with its own instruction file
    Super,
    /// Incremental commit inside a super step
    Sub,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Super => write!(f, "super step"),
            Self::Sub => write!(f, "sub step"),
        }
    }
}

/// A commit message split into its step identifier and the remaining text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDescriptor {
    /// Step the commit carries
    pub step: StepId,
    /// Everything after the `Step <id>: ` prefix, body lines included
    pub message: String,
}

impl CommitDescriptor {
    /// Render back into a full commit message
    pub fn to_message(&self) -> String {
        format!("{}{}", self.step.prefix(), self.message)
    }

    /// First line of the message, without the prefix
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

/// Result of parsing a `Step N: ...` message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperStepDescriptor {
    /// Super step number
    pub number: u32,
    /// Text after the prefix
    pub message: String,
}

/// Result of parsing a `Step N.M: ...` message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubStepDescriptor {
    /// The full `N.M` identifier
    pub number: StepId,
    /// Super step component
    pub super_number: u32,
    /// Sub step component
    pub sub_number: u32,
    /// Text after the prefix
    pub message: String,
}

/// A step commit as it appears in history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCommit {
    /// Full commit hash
    pub hash: String,
    /// Parsed message
    pub descriptor: CommitDescriptor,
}

/// Name of the tag closing super step `number`
pub fn tag_name(number: u32) -> String {
    format!("{TAG_PREFIX}{number}")
}

/// Parse `stepN` back into `N`
pub fn parse_tag_name(name: &str) -> Option<u32> {
    name.strip_prefix(TAG_PREFIX)?.parse().ok().filter(|n| *n > 0)
}

/// File name of the instruction file for super step `number`
pub fn instruction_file_name(number: u32) -> String {
    format!("step{number}.md")
}
