//! Dynamic chain blocks.

use super::{impl_store_record, NULL_REFERENCE};

/// One fixed-capacity block of a dynamic chain.
///
/// Dynamic chains hold data that does not fit a fixed slot: token names,
/// long property values and serialized schema rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicRecord {
    /// Block id.
    pub id: u64,
    /// Whether the block holds live data.
    pub in_use: bool,
    /// Set when this transaction created the block.
    pub created: bool,
    /// First block of its chain.
    pub start_record: bool,
    /// Next block in the chain.
    pub next_block: i64,
    /// Bytes stored in this block.
    pub data: Vec<u8>,
}

impl DynamicRecord {
    /// An empty, not-in-use block.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            in_use: false,
            created: false,
            start_record: true,
            next_block: NULL_REFERENCE,
            data: Vec::new(),
        }
    }

    /// A live block holding `data`.
    #[must_use]
    pub fn with_data(id: u64, data: impl Into<Vec<u8>>) -> Self {
        Self {
            in_use: true,
            data: data.into(),
            ..Self::new(id)
        }
    }
}

impl_store_record!(DynamicRecord, "dynamic");
