//! Torn-tail recovery testing.
//!
//! A crash can cut the log anywhere, including in the middle of an entry.
//! [`TornTailHarness`] takes a complete log, recovers every byte prefix of it
//! into fresh stores, and checks the node slots against a model: exactly the
//! transactions whose Commit entry lies wholly inside the prefix are applied.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use graphlog_testkit::crash::TornTailHarness;
//!
//! let harness = TornTailHarness::from_log(&log)?;
//! for result in harness.check_every_cut() {
//!     assert!(result.passed, "{}", result.description);
//! }
//! ```

use crate::fixtures::nodes_in_use;
use graphlog_core::{
    recover, Command, CoreResult, LogConfig, LogEntry, LogManager, StoreSet, TransactionId,
};
use graphlog_storage::MemoryBuffer;
use std::collections::{BTreeSet, HashMap};

/// Result of recovering one prefix.
#[derive(Debug, Clone)]
pub struct CrashRecoveryResult {
    /// Whether recovery matched the model.
    pub passed: bool,
    /// What was tested.
    pub description: String,
    /// Node ids expected in use.
    pub expected_nodes: BTreeSet<u64>,
    /// Node ids found in use.
    pub actual_nodes: BTreeSet<u64>,
    /// Recovery error, if any.
    pub error: Option<String>,
}

/// Recovers every prefix of a log.
#[derive(Debug)]
pub struct TornTailHarness {
    bytes: Vec<u8>,
    /// Entries with the offset one past their last byte.
    entries: Vec<(u64, LogEntry)>,
    node_ids: BTreeSet<u64>,
}

impl TornTailHarness {
    /// Captures the complete entries of `log`.
    ///
    /// Entries are re-encoded, so a torn tail already present in `log` is
    /// left out.
    pub fn from_log(log: &LogManager) -> CoreResult<Self> {
        let mut bytes = Vec::new();
        let mut entries = Vec::new();
        let mut node_ids = BTreeSet::new();

        for (_, entry) in log.read_all()? {
            bytes.extend(entry.encode()?);
            if let LogEntry::Command {
                command: Command::Node { after, .. },
                ..
            } = &entry
            {
                node_ids.insert(after.id);
            }
            entries.push((bytes.len() as u64, entry));
        }

        Ok(Self {
            bytes,
            entries,
            node_ids,
        })
    }

    /// Length of the complete log.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Node ids in use after replaying the first `cut` bytes, per the model.
    pub fn expected_nodes(&self, cut: u64) -> BTreeSet<u64> {
        let mut pending: HashMap<i32, Vec<(u64, bool)>> = HashMap::new();
        let mut in_use = BTreeSet::new();

        for (end, entry) in &self.entries {
            if *end > cut {
                break;
            }
            match entry {
                LogEntry::Start { identifier, .. } => {
                    pending.insert(*identifier, Vec::new());
                }
                LogEntry::Command {
                    identifier,
                    command: Command::Node { after, .. },
                } => {
                    if let Some(nodes) = pending.get_mut(identifier) {
                        nodes.push((after.id, after.in_use));
                    }
                }
                LogEntry::Commit { identifier, .. } => {
                    for (id, used) in pending.remove(identifier).unwrap_or_default() {
                        if used {
                            in_use.insert(id);
                        } else {
                            in_use.remove(&id);
                        }
                    }
                }
                _ => {}
            }
        }
        in_use
    }

    /// Recovers the first `cut` bytes into fresh stores and compares.
    pub fn check_cut(&self, cut: u64) -> CrashRecoveryResult {
        let description = format!("cut at {cut} of {} bytes", self.len());
        let expected_nodes = self.expected_nodes(cut);

        let prefix = self.bytes[..cut as usize].to_vec();
        let log = LogManager::with_config(
            Box::new(MemoryBuffer::with_data(prefix)),
            LogConfig::new().sync_on_append(false),
        );
        let mut stores = StoreSet::in_memory();

        match recover(&log, &mut stores, TransactionId::new(0)) {
            Ok(_) => {
                let actual_nodes = nodes_in_use(&stores, self.node_ids.iter().copied());
                CrashRecoveryResult {
                    passed: actual_nodes == expected_nodes,
                    description,
                    expected_nodes,
                    actual_nodes,
                    error: None,
                }
            }
            Err(err) => CrashRecoveryResult {
                passed: false,
                description,
                expected_nodes,
                actual_nodes: BTreeSet::new(),
                error: Some(err.to_string()),
            },
        }
    }

    /// Checks every prefix length from empty to the whole log.
    pub fn check_every_cut(&self) -> Vec<CrashRecoveryResult> {
        (0..=self.len()).map(|cut| self.check_cut(cut)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{memory_log, write_node_transaction, write_unfinished_transaction};

    #[test]
    fn every_cut_recovers_committed_prefix() {
        let log = memory_log();
        write_node_transaction(&log, 1, 1, &[1, 2]);
        write_unfinished_transaction(&log, 2, 2, &[5]);
        write_node_transaction(&log, 3, 3, &[3]);

        let harness = TornTailHarness::from_log(&log).unwrap();
        assert_eq!(harness.len(), log.size().unwrap());
        for result in harness.check_every_cut() {
            assert!(result.passed, "{}: {:?}", result.description, result);
        }
        assert_eq!(harness.expected_nodes(harness.len()), BTreeSet::from([1, 2, 3]));
        assert!(harness.expected_nodes(0).is_empty());
    }
}
