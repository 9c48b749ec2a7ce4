//! Destinations for the entries a transaction writer produces.
//!
//! The same writer calls can be serialized to the log
//! ([`LogBufferOutput`]), applied straight to stores ([`RecordOutput`]), or
//! collected in memory ([`CommandCollector`]). [`SequenceValidatingOutput`]
//! wraps any of them to check the entry order of each transaction.
//!
//! Entries of one transaction are expected in the order
//! Start, Command*, Prepare?, Commit, Done. The outputs themselves do not
//! check this.

mod collector;
mod log_buffer;
mod record;
mod validating;

pub use collector::CommandCollector;
pub use log_buffer::LogBufferOutput;
pub use record::RecordOutput;
pub use validating::SequenceValidatingOutput;

use crate::command::Command;
use crate::error::CoreResult;
use crate::log::{LogEntry, MASTER_COMMITTED_TX_PLACEHOLDER};
use crate::types::{CommitPhase, TransactionId};
use crate::xid::Xid;

/// Fields of a transaction's Start entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxStart {
    /// Global transaction id.
    pub xid: Xid,
    /// Local identifier of the transaction.
    pub identifier: i32,
    /// Coordinating instance.
    pub master_id: i32,
    /// Originating instance.
    pub my_id: i32,
    /// Millis since the epoch.
    pub start_timestamp: u64,
    /// Last transaction known committed at start.
    pub last_committed_tx: TransactionId,
}

impl TxStart {
    /// The log entry for this start.
    #[must_use]
    pub fn to_entry(&self) -> LogEntry {
        LogEntry::Start {
            xid: self.xid.clone(),
            identifier: self.identifier,
            master_id: self.master_id,
            my_id: self.my_id,
            master_committed_tx: MASTER_COMMITTED_TX_PLACEHOLDER,
            start_timestamp: self.start_timestamp,
            last_committed_tx: self.last_committed_tx,
        }
    }
}

/// Receives the entries of transactions, one operation per entry kind.
pub trait Output {
    /// A transaction started.
    fn write_start(&mut self, start: &TxStart) -> CoreResult<()>;

    /// A transaction produced a command.
    fn write_command(&mut self, identifier: i32, command: Command) -> CoreResult<()>;

    /// A transaction voted to commit.
    fn write_prepare(&mut self, identifier: i32, timestamp: u64) -> CoreResult<()>;

    /// A transaction committed as `tx_id`.
    fn write_commit(
        &mut self,
        identifier: i32,
        phase: CommitPhase,
        tx_id: TransactionId,
        timestamp: u64,
    ) -> CoreResult<()>;

    /// All entries of a transaction have been written.
    fn write_done(&mut self, identifier: i32) -> CoreResult<()>;

    /// Feeds an already-decoded log entry to the matching operation.
    fn write_entry(&mut self, entry: LogEntry) -> CoreResult<()> {
        match entry {
            LogEntry::Start {
                xid,
                identifier,
                master_id,
                my_id,
                start_timestamp,
                last_committed_tx,
                ..
            } => self.write_start(&TxStart {
                xid,
                identifier,
                master_id,
                my_id,
                start_timestamp,
                last_committed_tx,
            }),
            LogEntry::Command {
                identifier,
                command,
            } => self.write_command(identifier, command),
            LogEntry::Prepare {
                identifier,
                timestamp,
            } => self.write_prepare(identifier, timestamp),
            LogEntry::Commit {
                identifier,
                phase,
                tx_id,
                timestamp,
            } => self.write_commit(identifier, phase, tx_id, timestamp),
            LogEntry::Done { identifier } => self.write_done(identifier),
        }
    }
}

impl<O: Output + ?Sized> Output for &mut O {
    fn write_start(&mut self, start: &TxStart) -> CoreResult<()> {
        (**self).write_start(start)
    }

    fn write_command(&mut self, identifier: i32, command: Command) -> CoreResult<()> {
        (**self).write_command(identifier, command)
    }

    fn write_prepare(&mut self, identifier: i32, timestamp: u64) -> CoreResult<()> {
        (**self).write_prepare(identifier, timestamp)
    }

    fn write_commit(
        &mut self,
        identifier: i32,
        phase: CommitPhase,
        tx_id: TransactionId,
        timestamp: u64,
    ) -> CoreResult<()> {
        (**self).write_commit(identifier, phase, tx_id, timestamp)
    }

    fn write_done(&mut self, identifier: i32) -> CoreResult<()> {
        (**self).write_done(identifier)
    }
}
