//! Log configuration.

use crate::xid::{DEFAULT_SEED, STORE_BRANCH_ID};

/// Configuration shared by the log manager, its reader and transaction writers.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to flush the log buffer after every appended entry.
    pub sync_on_append: bool,

    /// Chunk size the streaming reader pulls from the buffer.
    pub read_buffer_size: usize,

    /// Seed mixed into generated global transaction ids.
    pub global_id_seed: u64,

    /// Branch qualifier of this store's global transaction ids.
    pub branch_id: Vec<u8>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            sync_on_append: true,
            read_buffer_size: 64 * 1024, // 64 KB
            global_id_seed: DEFAULT_SEED,
            branch_id: STORE_BRANCH_ID.to_vec(),
        }
    }
}

impl LogConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether every append is flushed.
    #[must_use]
    pub fn sync_on_append(mut self, value: bool) -> Self {
        self.sync_on_append = value;
        self
    }

    /// Sets the reader chunk size. Zero is bumped to one byte.
    #[must_use]
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Sets the global id seed.
    #[must_use]
    pub fn global_id_seed(mut self, seed: u64) -> Self {
        self.global_id_seed = seed;
        self
    }

    /// Sets the branch qualifier.
    #[must_use]
    pub fn branch_id(mut self, branch_id: impl Into<Vec<u8>>) -> Self {
        self.branch_id = branch_id.into();
        self
    }
}
