//! Error types for graphlog core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while writing, reading or replaying the log.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The log buffer failed.
    #[error("storage error: {0}")]
    Storage(#[from] graphlog_storage::StorageError),

    /// I/O error outside a log buffer (store copies, directories).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A token name was given no dynamic block ids to live in.
    #[error("no dynamic records for storing the name")]
    NoNameBlocks,

    /// A token name needs more blocks than were allocated.
    #[error("[{name}] is too long to fit in {blocks} blocks")]
    NameTooLong {
        /// The name being encoded.
        name: String,
        /// Number of blocks supplied.
        blocks: usize,
    },

    /// A token name fits in fewer blocks than were allocated.
    #[error("[{name}] is too short to fill {blocks} blocks")]
    NameTooShort {
        /// The name being encoded.
        name: String,
        /// Number of blocks supplied.
        blocks: usize,
    },

    /// A name block id does not fit the signed record pointer it is stored in.
    #[error("name block id {id} is out of range for a record pointer")]
    BlockIdOutOfRange {
        /// The offending block id.
        id: u64,
    },

    /// A command payload starts with a kind byte nothing maps to.
    #[error("unknown command kind {0}")]
    UnknownCommandKind(u8),

    /// A log entry starts with a tag byte nothing maps to.
    #[error("unknown log entry kind {kind} at offset {offset}")]
    UnknownEntryKind {
        /// The tag byte read.
        kind: u8,
        /// Offset of the entry in the log.
        offset: u64,
    },

    /// The log is malformed.
    #[error("log corruption: {message}")]
    LogCorruption {
        /// Description of the corruption.
        message: String,
    },

    /// An online write tried to create a record over a slot still in use.
    #[error("{store} record {id} is already in use")]
    RecordInUse {
        /// Store that rejected the write.
        store: &'static str,
        /// Slot id.
        id: u64,
    },

    /// An online write tried to update a slot that was never created.
    #[error("{store} record {id} does not exist")]
    RecordNotFound {
        /// Store that rejected the write.
        store: &'static str,
        /// Slot id.
        id: u64,
    },

    /// Entries for one transaction arrived out of protocol order.
    #[error("transaction {identifier}: expected {expected}, got {found}")]
    SequenceViolation {
        /// Identifier of the offending transaction.
        identifier: i32,
        /// What the protocol allowed next.
        expected: &'static str,
        /// The entry kind that arrived.
        found: &'static str,
    },

    /// Checksum of copied data does not match.
    #[error("checksum mismatch for {file}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// File being verified.
        file: String,
        /// Recorded checksum.
        expected: u32,
        /// Computed checksum.
        actual: u32,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a log corruption error.
    pub fn log_corruption(message: impl Into<String>) -> Self {
        Self::LogCorruption {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns `true` for caller/allocator mistakes that must not be retried.
    #[must_use]
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::NoNameBlocks
                | Self::NameTooLong { .. }
                | Self::NameTooShort { .. }
                | Self::BlockIdOutOfRange { .. }
                | Self::UnknownCommandKind(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_errors_read_like_messages() {
        let err = CoreError::NameTooShort {
            name: "age".into(),
            blocks: 2,
        };
        assert_eq!(err.to_string(), "[age] is too short to fill 2 blocks");
        assert!(err.is_construction_error());
    }

    #[test]
    fn storage_errors_convert() {
        let err: CoreError = graphlog_storage::StorageError::Closed.into();
        assert!(matches!(err, CoreError::Storage(_)));
        assert!(!err.is_construction_error());
    }
}
