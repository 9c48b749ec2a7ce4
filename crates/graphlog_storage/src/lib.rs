//! # graphlog storage
//!
//! Byte sinks that the transaction log is appended to.
//!
//! A log buffer is an **opaque, append-only byte store**. It knows nothing
//! about log entries, commands or records; `graphlog_core` owns all format
//! interpretation. Buffers are also used as the unit of a full store copy,
//! where each store file is exposed as one buffer.
//!
//! ## Available Buffers
//!
//! - [`MemoryBuffer`] - For tests, collecting replicas and tooling
//! - [`FileBuffer`] - For durable logs and store files on disk
//!
//! ## Example
//!
//! ```rust
//! use graphlog_storage::{LogBuffer, MemoryBuffer};
//!
//! let mut buffer = MemoryBuffer::new();
//! let offset = buffer.append(b"entry").unwrap();
//! assert_eq!(buffer.read_at(offset, 5).unwrap(), b"entry");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod error;
mod file;
mod memory;

pub use buffer::LogBuffer;
pub use error::{StorageError, StorageResult};
pub use file::FileBuffer;
pub use memory::MemoryBuffer;
