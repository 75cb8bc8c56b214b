//! Marks child processes spawned by tortilla so hooks can tell them apart
//! from commands typed by the user.

use std::fmt;

/// Environment variable carrying the invocation flag into git hooks
pub const INVOCATION_ENV: &str = "TORTILLA_INVOCATION";

/// Who started the git command a hook is running under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Invocation {
    /// Typed by the user, or run by some other tool
    #[default]
    External,
    /// `tortilla amend`: the user amending the commit a rebase stopped at
    Amend,
    /// tortilla's own commits, amends and rebases
    Internal,
}

impl Invocation {
    /// Parse the flag value; unknown values count as external
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("amend") => Self::Amend,
            Some("internal") => Self::Internal,
            _ => Self::External,
        }
    }

    /// Read the flag from this process's environment
    pub fn from_env() -> Self {
        Self::parse(std::env::var(INVOCATION_ENV).ok().as_deref())
    }

    /// Whether the running commit rewrites HEAD rather than adding a commit
    pub const fn gonna_amend(self) -> bool {
        matches!(self, Self::Amend | Self::Internal)
    }

    /// Whether tortilla itself spawned the command
    pub const fn is_internal(self) -> bool {
        matches!(self, Self::Internal)
    }

    /// Value to export in a child's environment
    pub const fn as_env_value(self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Amend => "amend",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_env_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_env_values() {
        for inv in [Invocation::External, Invocation::Amend, Invocation::Internal] {
            assert_eq!(Invocation::parse(Some(inv.as_env_value())), inv);
        }
        assert_eq!(Invocation::parse(None), Invocation::External);
        assert_eq!(Invocation::parse(Some("bogus")), Invocation::External);
    }

    #[test]
    fn test_gonna_amend() {
        assert!(!Invocation::External.gonna_amend());
        assert!(Invocation::Amend.gonna_amend());
        assert!(Invocation::Internal.gonna_amend());
    }
}
