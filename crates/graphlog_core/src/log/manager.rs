//! Log writer and reader.

use super::{LogEntry, LogEntryIterator};
use crate::config::LogConfig;
use crate::error::CoreResult;
use graphlog_storage::{FileBuffer, LogBuffer};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::trace;

/// Manages appends to and reads from one transaction log.
///
/// Appends are serialized through a lock on the buffer, so a `LogManager`
/// can be shared by the writers of several transactions.
pub struct LogManager {
    /// Byte sink holding the log.
    buffer: Arc<Mutex<Box<dyn LogBuffer>>>,
    /// Log configuration.
    config: LogConfig,
}

impl LogManager {
    /// Creates a log manager over `buffer` with the default configuration.
    pub fn new(buffer: Box<dyn LogBuffer>) -> Self {
        Self::with_config(buffer, LogConfig::default())
    }

    /// Creates a log manager over `buffer`.
    pub fn with_config(buffer: Box<dyn LogBuffer>, config: LogConfig) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(buffer)),
            config,
        }
    }

    /// Opens (or creates) a log file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path, config: LogConfig) -> CoreResult<Self> {
        let buffer = FileBuffer::open_with_create_dirs(path)?;
        Ok(Self::with_config(Box::new(buffer), config))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Appends an entry to the log.
    ///
    /// Returns the offset where the entry was written. The entry is encoded
    /// in full before the buffer is touched, so a failed encode leaves the
    /// log unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be encoded or the buffer fails.
    pub fn append(&self, entry: &LogEntry) -> CoreResult<u64> {
        let data = entry.encode()?;

        let mut buffer = self.buffer.lock();
        let offset = buffer.append(&data)?;
        if self.config.sync_on_append {
            buffer.flush()?;
        }

        trace!(
            offset,
            len = data.len(),
            kind = entry.kind().name(),
            identifier = entry.identifier(),
            "appended log entry"
        );
        Ok(offset)
    }

    /// Flushes all pending writes to durable storage.
    pub fn flush(&self) -> CoreResult<()> {
        self.buffer.lock().flush()?;
        Ok(())
    }

    /// Returns the current log size.
    pub fn size(&self) -> CoreResult<u64> {
        Ok(self.buffer.lock().size()?)
    }

    /// Returns a streaming iterator over all entries.
    ///
    /// The buffer stays locked while the iterator lives.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer size cannot be read.
    pub fn iter(&self) -> CoreResult<LogEntryIterator<'_>> {
        self.iter_from(0)
    }

    /// Returns a streaming iterator starting at `offset`, which must be the
    /// start of an entry.
    pub fn iter_from(&self, offset: u64) -> CoreResult<LogEntryIterator<'_>> {
        let buffer = self.buffer.lock();
        LogEntryIterator::new(buffer, offset, self.config.read_buffer_size)
    }

    /// Calls `callback` for every entry in order.
    ///
    /// The callback returns `Ok(true)` to continue, `Ok(false)` to stop.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the callback returns an error.
    pub fn for_each_streaming<F>(&self, mut callback: F) -> CoreResult<()>
    where
        F: FnMut(u64, LogEntry) -> CoreResult<bool>,
    {
        for result in self.iter()? {
            let (offset, entry) = result?;
            if !callback(offset, entry)? {
                break;
            }
        }
        Ok(())
    }

    /// Reads every entry into memory.
    ///
    /// Prefer [`LogManager::iter`] for large logs.
    pub fn read_all(&self) -> CoreResult<Vec<(u64, LogEntry)>> {
        self.iter()?.collect()
    }

    /// Discards everything from `offset` onwards.
    pub fn truncate(&self, offset: u64) -> CoreResult<()> {
        self.buffer.lock().truncate(offset)?;
        Ok(())
    }

    /// Empties the log.
    pub fn clear(&self) -> CoreResult<()> {
        self.truncate(0)
    }

    /// Gives tests direct access to the buffer to simulate torn writes and
    /// corruption.
    #[cfg(test)]
    pub(crate) fn buffer_for_testing(&self) -> Arc<Mutex<Box<dyn LogBuffer>>> {
        Arc::clone(&self.buffer)
    }
}

impl std::fmt::Debug for LogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
