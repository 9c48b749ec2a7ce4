//! The durable transaction log.
//!
//! ## Entry Format
//!
//! ```text
//! | kind (1) | body length (4) | body | crc32 (4) |
//! ```
//!
//! The CRC32 covers the tag, the length and the body.
//!
//! | kind | tag | body |
//! |---|---|---|
//! | Start | 1 | format id, global/branch id lengths and bytes, identifier, master id, my id, master committed tx (-1), start timestamp, last committed tx |
//! | Prepare | 2 | identifier, timestamp |
//! | Command | 3 | identifier, command payload |
//! | Done | 4 | identifier |
//! | Commit, one-phase | 5 | identifier, tx id, timestamp |
//! | Commit, two-phase | 6 | identifier, tx id, timestamp |
//!
//! Integers are little-endian. The body of each kind has a fixed shape, with
//! explicit lengths for its variable parts, and must fill the framed length
//! exactly.
//!
//! ## Reading Policy
//!
//! A frame that runs past the end of the log is a write torn by a crash and
//! ends the log cleanly. Inside a complete frame, a checksum mismatch, an
//! unknown tag or a malformed body is corruption and stops iteration with an
//! error; the entries after it are never silently dropped.

mod entry;
mod iterator;
mod manager;

pub use entry::{
    EntryKind, LogEntry, ENTRY_HEADER_LEN, ENTRY_TRAILER_LEN, MASTER_COMMITTED_TX_PLACEHOLDER,
};
pub use iterator::LogEntryIterator;
pub use manager::LogManager;
