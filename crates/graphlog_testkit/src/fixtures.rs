//! Log fixtures and transaction helpers.
//!
//! Helpers panic on failure; they are meant for tests only.

use graphlog_core::{
    LogBufferOutput, LogConfig, LogManager, NodeRecord, RecordStore, StoreSet, TransactionId,
    TransactionWriter,
};
use graphlog_storage::MemoryBuffer;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// File name used for file-backed test logs.
pub const TEST_LOG_FILE: &str = "graph.log";

/// Creates an in-memory log that does not flush on append.
pub fn memory_log() -> LogManager {
    LogManager::with_config(
        Box::new(MemoryBuffer::new()),
        LogConfig::new().sync_on_append(false),
    )
}

/// A file-backed log in a temporary directory, removed on drop.
pub struct TestLog {
    /// The log.
    pub log: LogManager,
    dir: TempDir,
}

impl TestLog {
    /// Creates an empty log file.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let log = LogManager::open(&dir.path().join(TEST_LOG_FILE), LogConfig::new())
            .expect("Failed to open log");
        Self { log, dir }
    }

    /// Directory holding the log file.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the log file.
    pub fn path(&self) -> PathBuf {
        self.dir.path().join(TEST_LOG_FILE)
    }

    /// Drops the log and opens the file again, as after a restart.
    pub fn reopen(self) -> Self {
        let Self { log, dir } = self;
        drop(log);
        let log = LogManager::open(&dir.path().join(TEST_LOG_FILE), LogConfig::new())
            .expect("Failed to reopen log");
        Self { log, dir }
    }
}

impl Default for TestLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestLog {
    type Target = LogManager;

    fn deref(&self) -> &Self::Target {
        &self.log
    }
}

/// Logs a complete transaction creating one in-use node per id.
pub fn write_node_transaction(log: &LogManager, identifier: i32, tx: u64, nodes: &[u64]) {
    let mut writer = begin(log, identifier, tx);
    for &id in nodes {
        writer
            .create_node(NodeRecord::with(id, true, -1, -1))
            .expect("Failed to write node");
    }
    writer
        .commit(false, TransactionId::new(tx))
        .expect("Failed to write commit");
    writer.done().expect("Failed to write done");
}

/// Logs a transaction deleting the given nodes.
pub fn write_delete_transaction(log: &LogManager, identifier: i32, tx: u64, nodes: &[u64]) {
    let mut writer = begin(log, identifier, tx);
    for &id in nodes {
        writer
            .delete_node(NodeRecord::with(id, true, -1, -1))
            .expect("Failed to write node deletion");
    }
    writer
        .commit(false, TransactionId::new(tx))
        .expect("Failed to write commit");
    writer.done().expect("Failed to write done");
}

/// Logs the start and commands of a transaction that never commits.
pub fn write_unfinished_transaction(log: &LogManager, identifier: i32, tx: u64, nodes: &[u64]) {
    let mut writer = begin(log, identifier, tx);
    for &id in nodes {
        writer
            .create_node(NodeRecord::with(id, true, -1, -1))
            .expect("Failed to write node");
    }
}

fn begin(log: &LogManager, identifier: i32, tx: u64) -> TransactionWriter<LogBufferOutput<'_>> {
    let mut writer = TransactionWriter::new(LogBufferOutput::new(log), identifier, 0);
    writer
        .start(0, 0, TransactionId::new(tx.saturating_sub(1)))
        .expect("Failed to write start");
    writer
}

/// Ids among `candidates` whose node slot is in use.
pub fn nodes_in_use(stores: &StoreSet, candidates: impl IntoIterator<Item = u64>) -> BTreeSet<u64> {
    candidates
        .into_iter()
        .filter(|&id| {
            stores
                .nodes()
                .get(id)
                .expect("Failed to read node store")
                .is_some_and(|node| node.in_use)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphlog_core::recover;

    #[test]
    fn file_log_survives_reopen() {
        let test_log = TestLog::new();
        write_node_transaction(&test_log, 1, 1, &[3, 4]);
        let size = test_log.size().unwrap();

        let test_log = test_log.reopen();
        assert_eq!(test_log.size().unwrap(), size);
        assert!(test_log.path().exists());

        let mut stores = StoreSet::in_memory();
        recover(&test_log, &mut stores, TransactionId::new(0)).unwrap();
        assert_eq!(nodes_in_use(&stores, 0..10), BTreeSet::from([3, 4]));
    }

    #[test]
    fn delete_transaction_frees_nodes() {
        let log = memory_log();
        write_node_transaction(&log, 1, 1, &[1, 2]);
        write_delete_transaction(&log, 1, 2, &[1]);
        write_unfinished_transaction(&log, 2, 3, &[9]);

        let mut stores = StoreSet::in_memory();
        let stats = recover(&log, &mut stores, TransactionId::new(0)).unwrap();
        assert_eq!(stats.transactions_applied, 2);
        assert_eq!(nodes_in_use(&stores, 0..10), BTreeSet::from([2]));
    }
}
