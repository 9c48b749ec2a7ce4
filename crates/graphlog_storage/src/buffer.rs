//! The append-only byte sink contract.

use crate::error::StorageResult;

/// An append-only byte sink.
///
/// # Invariants
///
/// - `append` returns the offset the bytes were written at, which is the
///   size of the buffer immediately before the call
/// - `read_at` returns exactly the bytes previously appended at that offset
/// - after `flush` returns, every appended byte survives process exit
/// - a failed `append` leaves the readable contents unchanged
pub trait LogBuffer: Send + Sync {
    /// Appends `data` and returns the offset it starts at.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink is closed or the write fails.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::ReadPastEnd`] if the range is not
    /// fully inside the buffer.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Pushes appended bytes to durable storage.
    fn flush(&mut self) -> StorageResult<()>;

    /// Current size in bytes; the offset the next append lands at.
    fn size(&self) -> StorageResult<u64>;

    /// Discards everything from `new_size` onwards.
    ///
    /// # Errors
    ///
    /// Fails if `new_size` is larger than the current size.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Reads the whole buffer.
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        let size = self.size()?;
        self.read_at(0, size as usize)
    }
}
