//! Streaming log entry iterator.

use super::LogEntry;
use crate::error::CoreResult;
use graphlog_storage::LogBuffer;
use parking_lot::MutexGuard;
use tracing::debug;

/// A streaming iterator over log entries.
///
/// Reads the log in fixed-size chunks and decodes entries out of the chunk,
/// so memory stays bounded by the chunk size plus the largest entry.
///
/// # Error Handling
///
/// - A frame cut off by the end of the log is treated as the log's end
/// - A checksum mismatch, an unknown tag or a malformed body is returned as
///   an error, after which the iterator yields nothing more
pub struct LogEntryIterator<'a> {
    buffer: MutexGuard<'a, Box<dyn LogBuffer>>,
    total_size: u64,
    /// Log offset of `chunk[chunk_pos]`.
    current_offset: u64,
    chunk: Vec<u8>,
    chunk_pos: usize,
    chunk_size: usize,
    finished: bool,
}

impl<'a> LogEntryIterator<'a> {
    /// Creates an iterator starting at `start_offset`, reading
    /// `chunk_size` bytes at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer size cannot be determined.
    pub fn new(
        buffer: MutexGuard<'a, Box<dyn LogBuffer>>,
        start_offset: u64,
        chunk_size: usize,
    ) -> CoreResult<Self> {
        let total_size = buffer.size()?;
        Ok(Self {
            buffer,
            total_size,
            current_offset: start_offset.min(total_size),
            chunk: Vec::new(),
            chunk_pos: 0,
            chunk_size: chunk_size.max(1),
            finished: false,
        })
    }

    /// Offset of the next entry to be read.
    ///
    /// After the iterator finishes on a torn tail, this is where the valid
    /// prefix of the log ends.
    pub fn position(&self) -> u64 {
        self.current_offset
    }

    /// Bytes of the log not yet pulled into the chunk.
    fn unread(&self) -> u64 {
        let buffered = (self.chunk.len() - self.chunk_pos) as u64;
        self.total_size - self.current_offset - buffered
    }

    /// Pulls at least `chunk_size` more bytes (or the rest of the log) into
    /// the chunk. Returns `false` when the log has nothing left.
    fn fill(&mut self) -> CoreResult<bool> {
        let unread = self.unread();
        if unread == 0 {
            return Ok(false);
        }

        self.chunk.drain(..self.chunk_pos);
        self.chunk_pos = 0;

        // Grow the request with the pending bytes so an entry larger than one
        // chunk is read in a bounded number of passes.
        let want = self.chunk_size.max(self.chunk.len());
        let len = usize::try_from(unread).map_or(want, |unread| unread.min(want));
        let read_offset = self.current_offset + self.chunk.len() as u64;
        let data = self.buffer.read_at(read_offset, len)?;
        self.chunk.extend_from_slice(&data);
        Ok(true)
    }

    fn read_next(&mut self) -> CoreResult<Option<(u64, LogEntry)>> {
        loop {
            let offset = self.current_offset;
            if let Some((entry, used)) = LogEntry::decode(&self.chunk[self.chunk_pos..], offset)? {
                self.chunk_pos += used;
                self.current_offset += used as u64;
                return Ok(Some((offset, entry)));
            }

            if !self.fill()? {
                let pending = self.chunk.len() - self.chunk_pos;
                if pending > 0 {
                    debug!(offset, pending, "ignoring torn entry at end of log");
                }
                return Ok(None);
            }
        }
    }
}

impl Iterator for LogEntryIterator<'_> {
    type Item = CoreResult<(u64, LogEntry)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_next() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::command::Command;
    use crate::config::LogConfig;
    use crate::error::CoreError;
    use crate::log::{LogEntry, LogManager};
    use crate::record::{DynamicRecord, NodeRecord};
    use graphlog_storage::{LogBuffer, MemoryBuffer};

    fn log_with_chunk(chunk: usize) -> LogManager {
        LogManager::with_config(
            Box::new(MemoryBuffer::new()),
            LogConfig::new().sync_on_append(false).read_buffer_size(chunk),
        )
    }

    fn node_entry(id: u64) -> LogEntry {
        LogEntry::Command {
            identifier: 1,
            command: Command::Node {
                before: NodeRecord::new(id),
                after: NodeRecord::with(id, true, -1, -1),
            },
        }
    }

    #[test]
    fn small_chunks_still_yield_every_entry() {
        let log = log_with_chunk(3);
        for id in 0..20 {
            log.append(&node_entry(id)).unwrap();
        }
        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 20);
        assert_eq!(entries[19].1, node_entry(19));
    }

    #[test]
    fn entry_larger_than_chunk() {
        let log = log_with_chunk(16);
        let big = LogEntry::Command {
            identifier: 1,
            command: Command::SchemaRule {
                before: vec![],
                after: vec![DynamicRecord::with_data(1, vec![7u8; 10_000])],
            },
        };
        log.append(&big).unwrap();
        log.append(&node_entry(1)).unwrap();
        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].1, big);
    }

    #[test]
    fn torn_tail_is_end_of_log() {
        let log = log_with_chunk(64);
        log.append(&node_entry(1)).unwrap();
        let good = log.size().unwrap();
        log.append(&node_entry(2)).unwrap();
        log.truncate(log.size().unwrap() - 4).unwrap();

        let mut iter = log.iter().unwrap();
        assert_eq!(iter.next().unwrap().unwrap().1, node_entry(1));
        assert!(iter.next().is_none());
        assert_eq!(iter.position(), good);
    }

    #[test]
    fn flipped_byte_before_later_entries_is_fatal() {
        let log = log_with_chunk(8);
        log.append(&node_entry(1)).unwrap();
        let corrupt_at = log.append(&node_entry(2)).unwrap();
        log.append(&node_entry(3)).unwrap();
        log.append(&node_entry(4)).unwrap();

        let mut bytes = log.buffer_for_testing().lock().read_all().unwrap();
        bytes[corrupt_at as usize + crate::log::ENTRY_HEADER_LEN + 6] ^= 0x40;
        let damaged = LogManager::with_config(
            Box::new(MemoryBuffer::with_data(bytes)),
            LogConfig::new().read_buffer_size(8),
        );

        let results: Vec<_> = damaged.iter().unwrap().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(CoreError::LogCorruption { message }) => {
                assert!(message.contains(&format!("offset {corrupt_at}")), "{message}");
            }
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_is_fatal() {
        let log = log_with_chunk(64);
        log.append(&node_entry(1)).unwrap();
        let corrupt_at = log.size().unwrap();
        log.buffer_for_testing()
            .lock()
            .append(&[0xEE, 0, 0, 0, 0, 0, 0, 0])
            .unwrap();
        log.append(&node_entry(2)).unwrap();

        let results: Vec<_> = log.iter().unwrap().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(CoreError::UnknownEntryKind { kind: 0xEE, offset }) if offset == corrupt_at
        ));
    }
}
