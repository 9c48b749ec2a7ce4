//! Error types for log buffers.

use std::io;
use thiserror::Error;

/// Result type for buffer operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by a [`crate::LogBuffer`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying file or device failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read asked for bytes past the current end of the buffer.
    #[error("read beyond end of buffer: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// Requested offset.
        offset: u64,
        /// Requested length.
        len: usize,
        /// Buffer size at the time of the read.
        size: u64,
    },

    /// A truncate asked to grow the buffer.
    #[error("cannot truncate buffer of {size} bytes to {requested} bytes")]
    TruncateBeyondEnd {
        /// Requested size.
        requested: u64,
        /// Current size.
        size: u64,
    },

    /// The buffer was closed and refuses further appends.
    #[error("buffer is closed")]
    Closed,
}
