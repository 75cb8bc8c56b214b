//! Error types for tortilla

use thiserror::Error;

/// Errors raised by the step engine, the rebase orchestrator and the manual parser
#[derive(Debug, Error)]
pub enum Error {
    /// No commit carries the requested step
    #[error("step not found: {0}")]
    StepNotFound(String),

    /// A block open marker never met its close marker
    #[error("unbalanced block: open marker at byte {offset} is never closed")]
    UnbalancedBlock {
        /// Byte offset of the unmatched open marker
        offset: usize,
    },

    /// A required argument was empty or absent
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// An automated merge during a history edit could not be reconciled
    #[error("rebase conflict: {0}")]
    RebaseConflict(String),

    /// A hook refused a commit or rebase
    #[error("{0}")]
    PolicyViolation(String),

    /// The sequence editor received a line it cannot interpret
    #[error("invalid rebase plan: {0}")]
    InvalidRebasePlan(String),

    /// A step identifier could not be parsed
    #[error("invalid step: {0}")]
    InvalidStep(String),

    /// A git command exited unsuccessfully
    #[error("git error: {0}")]
    Git(String),

    /// Configuration could not be read or parsed
    #[error("config error: {0}")]
    Config(String),

    /// Persisted rebase state could not be read or written
    #[error("state error: {0}")]
    State(String),

    /// Template registration or rendering failed
    #[error("template error: {0}")]
    Template(String),

    /// A structured manifest could not be parsed or written
    #[error("manifest error: {0}")]
    Manifest(String),

    /// I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Internal invariant violated
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
