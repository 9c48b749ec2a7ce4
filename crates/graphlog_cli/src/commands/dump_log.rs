//! Dump-log command implementation.

use super::open_log;
use crate::error::{CliError, CliResult};
use graphlog_core::{LogEntry, LogManager};
use serde::Serialize;
use std::path::Path;

/// Log entry representation for output.
#[derive(Debug, Serialize)]
pub struct EntryInfo {
    /// Offset in the log file.
    pub offset: u64,
    /// Entry kind.
    pub kind: &'static str,
    /// Local transaction identifier.
    pub identifier: i32,
    /// Commit phase (commit entries).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Committed transaction id (commit entries).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<u64>,
    /// Last committed transaction at start (start entries).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_committed_tx: Option<u64>,
    /// Global transaction id, hex-encoded (start entries).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_id: Option<String>,
    /// Record kind (command entries).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<&'static str>,
    /// Record id (command entries).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<u64>,
    /// Whether the record is in use afterwards (command entries).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_use: Option<bool>,
    /// Millis since the epoch (start, prepare and commit entries).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl EntryInfo {
    fn new(offset: u64, entry: &LogEntry) -> Self {
        let mut info = Self {
            offset,
            kind: entry.kind().name(),
            identifier: entry.identifier(),
            phase: None,
            tx_id: None,
            last_committed_tx: None,
            global_id: None,
            record: None,
            record_id: None,
            in_use: None,
            timestamp: None,
        };

        match entry {
            LogEntry::Start {
                xid,
                start_timestamp,
                last_committed_tx,
                ..
            } => {
                info.global_id = Some(hex_encode(&xid.global_id));
                info.last_committed_tx = Some(last_committed_tx.as_u64());
                info.timestamp = Some(*start_timestamp);
            }
            LogEntry::Command { command, .. } => {
                info.record = Some(command.kind().name());
                info.record_id = command.record_id();
                info.in_use = Some(command.after_in_use());
            }
            LogEntry::Prepare { timestamp, .. } => {
                info.timestamp = Some(*timestamp);
            }
            LogEntry::Commit {
                phase,
                tx_id,
                timestamp,
                ..
            } => {
                info.phase = Some(phase.to_string());
                info.tx_id = Some(tx_id.as_u64());
                info.timestamp = Some(*timestamp);
            }
            LogEntry::Done { .. } => {}
        }
        info
    }
}

/// Runs the dump-log command.
pub fn run(log_path: &Path, limit: Option<usize>, offset: u64, format: &str) -> CliResult<()> {
    let log = open_log(log_path)?;
    let entries = read_entries(&log, offset, limit)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&entries)?),
        "text" => print_text_output(&entries),
        other => return Err(CliError::UnsupportedFormat(other.to_owned())),
    }
    Ok(())
}

/// Decodes up to `limit` entries starting at `offset`.
pub fn read_entries(
    log: &LogManager,
    offset: u64,
    limit: Option<usize>,
) -> CliResult<Vec<EntryInfo>> {
    let mut entries = Vec::new();
    for result in log.iter_from(offset)?.take(limit.unwrap_or(usize::MAX)) {
        let (offset, entry) = result?;
        entries.push(EntryInfo::new(offset, &entry));
    }
    Ok(entries)
}

fn print_text_output(entries: &[EntryInfo]) {
    println!("Log entries ({} total)", entries.len());
    println!("================");
    println!();

    for entry in entries {
        print!("[{:08}] {:8} id={}", entry.offset, entry.kind, entry.identifier);

        if let Some(ref phase) = entry.phase {
            print!(" {phase}");
        }
        if let Some(tx_id) = entry.tx_id {
            print!(" tx={tx_id}");
        }
        if let Some(last) = entry.last_committed_tx {
            print!(" last_tx={last}");
        }
        if let Some(ref global_id) = entry.global_id {
            print!(" gid={}...", &global_id[..16.min(global_id.len())]);
        }
        if let Some(record) = entry.record {
            print!(" {record}");
            if let Some(id) = entry.record_id {
                print!("#{id}");
            }
        }
        if let Some(in_use) = entry.in_use {
            print!(" in_use={in_use}");
        }

        println!();
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphlog_core::{LogBufferOutput, LogConfig, NodeRecord, TransactionId, TransactionWriter};
    use graphlog_storage::MemoryBuffer;

    fn sample_log() -> LogManager {
        let log = LogManager::with_config(
            Box::new(MemoryBuffer::new()),
            LogConfig::new().sync_on_append(false),
        );
        let mut writer = TransactionWriter::new(LogBufferOutput::new(&log), 3, 0);
        writer.start(0, 0, TransactionId::new(8)).unwrap();
        writer.create_node(NodeRecord::new(12)).unwrap();
        writer.commit(true, TransactionId::new(9)).unwrap();
        writer.done().unwrap();
        log
    }

    #[test]
    fn describes_each_entry() {
        let entries = read_entries(&sample_log(), 0, None).unwrap();
        let kinds: Vec<_> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, ["start", "command", "commit", "done"]);

        assert_eq!(entries[0].last_committed_tx, Some(8));
        assert_eq!(entries[1].record, Some("node"));
        assert_eq!(entries[1].record_id, Some(12));
        assert_eq!(entries[1].in_use, Some(true));
        assert_eq!(entries[2].phase.as_deref(), Some("2PC"));
        assert_eq!(entries[2].tx_id, Some(9));
        assert!(entries.iter().all(|e| e.identifier == 3));
    }

    #[test]
    fn limit_and_offset() {
        let log = sample_log();
        let all = read_entries(&log, 0, None).unwrap();
        let tail = read_entries(&log, all[2].offset, Some(1)).unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].kind, "commit");
    }

    #[test]
    fn json_omits_empty_fields() {
        let entries = read_entries(&sample_log(), 0, None).unwrap();
        let json = serde_json::to_value(&entries[3]).unwrap();
        assert_eq!(json["kind"], "done");
        assert!(json.get("tx_id").is_none());
    }
}
