//! Crash recovery and incremental replay from a log.
//!
//! Commands are buffered per transaction identifier from its Start entry and
//! applied, through [`RecordOutput`], only when the transaction's Commit is
//! read. Transactions committed at or before the replay position are
//! skipped; transactions that never committed are discarded.

use crate::command::Command;
use crate::error::{CoreError, CoreResult};
use crate::log::{LogEntry, LogManager};
use crate::output::{Output, RecordOutput};
use crate::store::StoreSet;
use crate::types::TransactionId;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Summary of one recovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Transactions whose commands were applied.
    pub transactions_applied: u64,
    /// Commands applied.
    pub commands_applied: u64,
    /// Committed transactions at or before the replay position.
    pub transactions_skipped: u64,
    /// Transactions that ended or were cut off without a Commit entry.
    pub incomplete_discarded: u64,
    /// Highest committed transaction id seen.
    pub last_tx_id: Option<TransactionId>,
}

/// Replays log entries into a store set.
///
/// Feed entries in log order, then call [`Recovery::finish`].
pub struct Recovery<'s> {
    output: RecordOutput<'s>,
    after_tx: TransactionId,
    pending: HashMap<i32, Vec<Command>>,
    committed: HashSet<i32>,
    stats: RecoveryStats,
}

impl<'s> Recovery<'s> {
    /// Creates a replay applying transactions committed after `after_tx`.
    pub fn new(stores: &'s mut StoreSet, after_tx: TransactionId) -> Self {
        Self {
            output: RecordOutput::new(stores),
            after_tx,
            pending: HashMap::new(),
            committed: HashSet::new(),
            stats: RecoveryStats::default(),
        }
    }

    /// Processes one entry read at `offset`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::LogCorruption`] for an entry of a transaction that was
    ///   never started
    /// - any store error raised while applying a committed transaction
    pub fn feed(&mut self, offset: u64, entry: LogEntry) -> CoreResult<()> {
        match entry {
            LogEntry::Start { identifier, .. } => {
                if let Some(dropped) = self.pending.insert(identifier, Vec::new()) {
                    warn!(
                        identifier,
                        offset,
                        commands = dropped.len(),
                        "identifier restarted before commit, discarding earlier transaction"
                    );
                    self.stats.incomplete_discarded += 1;
                }
                self.committed.remove(&identifier);
            }
            LogEntry::Command {
                identifier,
                command,
            } => self
                .pending
                .get_mut(&identifier)
                .ok_or_else(|| without_start("command", identifier, offset))?
                .push(command),
            LogEntry::Prepare { identifier, .. } => {
                if !self.pending.contains_key(&identifier) {
                    return Err(without_start("prepare", identifier, offset));
                }
            }
            LogEntry::Commit {
                identifier, tx_id, ..
            } => {
                let commands = self
                    .pending
                    .remove(&identifier)
                    .ok_or_else(|| without_start("commit", identifier, offset))?;
                self.committed.insert(identifier);
                self.commit(identifier, tx_id, commands)?;
            }
            LogEntry::Done { identifier } => {
                if self.committed.remove(&identifier) {
                    return Ok(());
                }
                let Some(commands) = self.pending.remove(&identifier) else {
                    return Err(without_start("done", identifier, offset));
                };
                debug!(
                    identifier,
                    commands = commands.len(),
                    "transaction done without commit, discarding"
                );
                self.stats.incomplete_discarded += 1;
            }
        }
        Ok(())
    }

    fn commit(
        &mut self,
        identifier: i32,
        tx_id: TransactionId,
        commands: Vec<Command>,
    ) -> CoreResult<()> {
        self.stats.last_tx_id = self.stats.last_tx_id.max(Some(tx_id));

        if tx_id <= self.after_tx {
            self.stats.transactions_skipped += 1;
            return Ok(());
        }

        let count = commands.len();
        for command in commands {
            self.output.write_command(identifier, command)?;
        }
        self.stats.transactions_applied += 1;
        debug!(identifier, %tx_id, commands = count, "replayed transaction");
        Ok(())
    }

    /// Ends the replay, discarding transactions that never committed.
    pub fn finish(mut self) -> RecoveryStats {
        for (identifier, commands) in self.pending.drain() {
            warn!(
                identifier,
                commands = commands.len(),
                "discarding transaction without commit"
            );
            self.stats.incomplete_discarded += 1;
        }
        self.stats.commands_applied = self.output.applied();
        self.stats
    }
}

fn without_start(kind: &str, identifier: i32, offset: u64) -> CoreError {
    CoreError::log_corruption(format!(
        "{kind} for transaction {identifier} at offset {offset} without start"
    ))
}

/// Replays every transaction in `log` committed after `after_tx` into
/// `stores`.
///
/// # Errors
///
/// Fails on log corruption or a store error. Stores may hold a prefix of
/// the replay when that happens; replaying again from the same position
/// converges, since replay writes are upserts of after-states.
pub fn recover(
    log: &LogManager,
    stores: &mut StoreSet,
    after_tx: TransactionId,
) -> CoreResult<RecoveryStats> {
    let mut recovery = Recovery::new(stores, after_tx);
    for result in log.iter()? {
        let (offset, entry) = result?;
        recovery.feed(offset, entry)?;
    }
    let stats = recovery.finish();

    info!(
        applied = stats.transactions_applied,
        commands = stats.commands_applied,
        skipped = stats.transactions_skipped,
        discarded = stats.incomplete_discarded,
        last_tx = stats.last_tx_id.map(TransactionId::as_u64),
        "recovery complete"
    );
    Ok(stats)
}
