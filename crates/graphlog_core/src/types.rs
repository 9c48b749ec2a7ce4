//! Core type definitions shared across the log, writer and replay code.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Id assigned to a transaction when it commits.
///
/// Committed transaction ids are monotonically increasing and define the
/// order transactions are replayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a transaction id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The id the next committed transaction would get.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx:{}", self.0)
    }
}

/// Whether a commit completed in one phase or after a prepare.
///
/// Carried on the log as the commit entry's kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitPhase {
    /// Committed without a preceding prepare vote.
    OnePhase,
    /// Committed after a prepare entry.
    TwoPhase,
}

impl CommitPhase {
    /// Maps the writer's `two_phase` flag onto a phase.
    #[must_use]
    pub const fn from_two_phase(two_phase: bool) -> Self {
        if two_phase {
            Self::TwoPhase
        } else {
            Self::OnePhase
        }
    }

    /// Returns `true` for [`CommitPhase::TwoPhase`].
    #[must_use]
    pub const fn is_two_phase(self) -> bool {
        matches!(self, Self::TwoPhase)
    }
}

impl fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnePhase => f.write_str("1PC"),
            Self::TwoPhase => f.write_str("2PC"),
        }
    }
}

/// Milliseconds since the Unix epoch, as stamped on log entries.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
