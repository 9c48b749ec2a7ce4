//! # graphlog core
//!
//! Transaction logging and replay for a fixed-slot graph record store.
//!
//! This crate provides:
//! - Record snapshots and the closed [`Command`] family built from them
//! - [`TransactionWriter`], translating record changes into log entries
//! - [`Output`] destinations: the log, direct replay, in-memory collection
//! - The log format, [`LogManager`] and its streaming reader
//! - Replay under a scoped recovery flag, crash recovery and backup support
//!
//! ## Example
//!
//! ```rust
//! use graphlog_core::{CommandCollector, NodeRecord, TransactionId, TransactionWriter};
//!
//! let mut writer = TransactionWriter::new(CommandCollector::new(), 1, 0);
//! writer.start(1, 2, TransactionId::new(41)).unwrap();
//! writer.create_node(NodeRecord::new(7)).unwrap();
//! writer.commit(false, TransactionId::new(42)).unwrap();
//! writer.done().unwrap();
//! assert_eq!(writer.output().len(), 4);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backup;
pub mod command;
mod config;
mod error;
pub mod log;
pub mod name_block;
pub mod output;
pub mod record;
pub mod recovery;
mod replay;
pub mod store;
mod types;
mod writer;
pub mod xid;

pub use command::{Command, CommandKind};
pub use config::LogConfig;
pub use error::{CoreError, CoreResult};
pub use log::{EntryKind, LogEntry, LogEntryIterator, LogManager};
pub use name_block::{NameBlockEncoder, NAME_STORE_BLOCK_SIZE};
pub use output::{
    CommandCollector, LogBufferOutput, Output, RecordOutput, SequenceValidatingOutput, TxStart,
};
pub use record::{
    DynamicRecord, NodeRecord, PropertyBlock, PropertyKeyTokenRecord, PropertyOwner,
    PropertyRecord, RelationshipGroupRecord, RelationshipRecord, StoreHeaderRecord, StoreRecord,
    TokenRecord, NULL_REFERENCE,
};
pub use recovery::{recover, Recovery, RecoveryStats};
pub use replay::ReplayVisitor;
pub use store::{ApplyMode, InMemoryRecordStore, RecordStore, RecoveryFlag, RecoveryGuard, StoreSet};
pub use types::{now_millis, CommitPhase, TransactionId};
pub use writer::TransactionWriter;
pub use xid::Xid;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
