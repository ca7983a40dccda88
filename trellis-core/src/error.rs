//! Error types.
//!
//! Reactive reads and writes never fail. The errors here cover the edges of
//! the runtime: a reconciler driven against a surface that is not in the
//! expected shape, a scheduler that never settles, and malformed
//! configuration.

use thiserror::Error;

/// Errors raised while reconciling a node tree against a surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// An old node reached the reconciler without a mounted primitive.
    #[error("node <{tag}> has no mounted primitive; it was never built by the reconciler")]
    Unmounted {
        /// Tag of the offending node (`#text` for text nodes).
        tag: String,
    },

    /// A primitive that must be replaced or used as an insertion point has
    /// no parent on the surface.
    #[error("primitive is detached from the surface; cannot {operation} it")]
    Detached {
        /// What the reconciler was trying to do.
        operation: &'static str,
    },
}

/// Errors raised by the update scheduler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Watchers kept re-scheduling each other past the configured limit.
    #[error("scheduler did not settle after {rounds} flush rounds; possible infinite update loop")]
    FlushLimitExceeded {
        /// Number of rounds executed before giving up.
        rounds: usize,
    },
}

/// Errors raised while loading runtime configuration.
#[derive(Debug, Error, Clone)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("invalid runtime configuration: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
