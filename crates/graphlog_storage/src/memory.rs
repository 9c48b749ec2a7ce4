//! In-memory log buffer.

use crate::buffer::LogBuffer;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;

/// A log buffer held entirely in memory.
///
/// Used by tests, by the collecting side of store copies, and whenever a
/// log only has to outlive a single process run.
///
/// ```rust
/// use graphlog_storage::{LogBuffer, MemoryBuffer};
///
/// let mut buffer = MemoryBuffer::new();
/// assert_eq!(buffer.append(b"abc").unwrap(), 0);
/// assert_eq!(buffer.append(b"de").unwrap(), 3);
/// assert_eq!(buffer.size().unwrap(), 5);
/// ```
#[derive(Debug, Default)]
pub struct MemoryBuffer {
    data: RwLock<Vec<u8>>,
    closed: bool,
}

impl MemoryBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer preloaded with `data`, e.g. a log captured earlier.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
            closed: false,
        }
    }

    /// Returns a copy of the contents.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.data.read().clone()
    }

    /// Refuses every further append with [`StorageError::Closed`].
    ///
    /// Lets callers exercise the failure path of a log sink.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl LogBuffer for MemoryBuffer {
    fn append(&mut self, bytes: &[u8]) -> StorageResult<u64> {
        if self.closed {
            return Err(StorageError::Closed);
        }
        let mut data = self.data.write();
        let offset = data.len() as u64;
        data.extend_from_slice(bytes);
        Ok(offset)
    }

    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.data.read();
        let size = data.len() as u64;
        let end = offset.saturating_add(len as u64);
        if end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }
        Ok(data[offset as usize..end as usize].to_vec())
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let mut data = self.data.write();
        let size = data.len() as u64;
        if new_size > size {
            return Err(StorageError::TruncateBeyondEnd {
                requested: new_size,
                size,
            });
        }
        data.truncate(new_size as usize);
        Ok(())
    }
}
