//! Output that keeps entries in memory.

use super::{Output, TxStart};
use crate::command::Command;
use crate::error::CoreResult;
use crate::log::LogEntry;
use crate::types::{CommitPhase, TransactionId};

/// Records every entry, in order, in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandCollector {
    entries: Vec<LogEntry>,
}

impl CommandCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries recorded so far.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Takes the recorded entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    /// Commands recorded so far, without their boundaries.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.entries.iter().filter_map(|entry| match entry {
            LogEntry::Command { command, .. } => Some(command),
            _ => None,
        })
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets every recorded entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Output for CommandCollector {
    fn write_start(&mut self, start: &TxStart) -> CoreResult<()> {
        self.entries.push(start.to_entry());
        Ok(())
    }

    fn write_command(&mut self, identifier: i32, command: Command) -> CoreResult<()> {
        self.entries.push(LogEntry::Command {
            identifier,
            command,
        });
        Ok(())
    }

    fn write_prepare(&mut self, identifier: i32, timestamp: u64) -> CoreResult<()> {
        self.entries.push(LogEntry::Prepare {
            identifier,
            timestamp,
        });
        Ok(())
    }

    fn write_commit(
        &mut self,
        identifier: i32,
        phase: CommitPhase,
        tx_id: TransactionId,
        timestamp: u64,
    ) -> CoreResult<()> {
        self.entries.push(LogEntry::Commit {
            identifier,
            phase,
            tx_id,
            timestamp,
        });
        Ok(())
    }

    fn write_done(&mut self, identifier: i32) -> CoreResult<()> {
        self.entries.push(LogEntry::Done { identifier });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::StoreHeaderRecord;

    #[test]
    fn records_verbatim_in_order() {
        let mut collector = CommandCollector::new();
        collector.write_prepare(2, 5).unwrap();
        collector
            .write_command(2, Command::StoreHeader(StoreHeaderRecord::new()))
            .unwrap();
        collector.write_done(2).unwrap();

        assert_eq!(collector.len(), 3);
        assert_eq!(collector.commands().count(), 1);
        assert_eq!(
            collector.entries()[0],
            LogEntry::Prepare {
                identifier: 2,
                timestamp: 5
            }
        );

        collector.clear();
        assert!(collector.is_empty());
    }
}
