//! Output that appends each entry to the transaction log.

use super::{Output, TxStart};
use crate::command::Command;
use crate::error::CoreResult;
use crate::log::{LogEntry, LogManager};
use crate::types::{CommitPhase, TransactionId};
use tracing::debug;

/// Serializes entries onto the transaction log.
#[derive(Debug)]
pub struct LogBufferOutput<'l> {
    log: &'l LogManager,
    last_offset: Option<u64>,
}

impl<'l> LogBufferOutput<'l> {
    /// Creates an output appending to `log`.
    pub fn new(log: &'l LogManager) -> Self {
        Self {
            log,
            last_offset: None,
        }
    }

    /// Offset of the most recently appended entry.
    pub fn last_offset(&self) -> Option<u64> {
        self.last_offset
    }

    fn append(&mut self, entry: &LogEntry) -> CoreResult<()> {
        self.last_offset = Some(self.log.append(entry)?);
        Ok(())
    }
}

impl Output for LogBufferOutput<'_> {
    fn write_start(&mut self, start: &TxStart) -> CoreResult<()> {
        debug!(identifier = start.identifier, xid = %start.xid, "logging start");
        self.append(&start.to_entry())
    }

    fn write_command(&mut self, identifier: i32, command: Command) -> CoreResult<()> {
        self.append(&LogEntry::Command {
            identifier,
            command,
        })
    }

    fn write_prepare(&mut self, identifier: i32, timestamp: u64) -> CoreResult<()> {
        debug!(identifier, "logging prepare");
        self.append(&LogEntry::Prepare {
            identifier,
            timestamp,
        })
    }

    fn write_commit(
        &mut self,
        identifier: i32,
        phase: CommitPhase,
        tx_id: TransactionId,
        timestamp: u64,
    ) -> CoreResult<()> {
        debug!(identifier, %phase, %tx_id, "logging commit");
        self.append(&LogEntry::Commit {
            identifier,
            phase,
            tx_id,
            timestamp,
        })
    }

    fn write_done(&mut self, identifier: i32) -> CoreResult<()> {
        debug!(identifier, "logging done");
        self.append(&LogEntry::Done { identifier })
    }
}
