//! Property records and their blocks.

use super::{impl_store_record, DynamicRecord, NULL_REFERENCE};

/// The entity a property record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PropertyOwner {
    /// Owner not recorded (graph properties, or not yet linked).
    #[default]
    None,
    /// Owned by a node.
    Node(u64),
    /// Owned by a relationship.
    Relationship(u64),
}

/// One property value inside a property record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyBlock {
    /// Property key token id.
    pub key_id: u32,
    /// Encoded value words: inlined value, or header plus pointer to `value_records`.
    pub value: Vec<u64>,
    /// Dynamic blocks holding a value too long to inline.
    pub value_records: Vec<DynamicRecord>,
}

impl PropertyBlock {
    /// A block whose value fits inline.
    #[must_use]
    pub fn inline(key_id: u32, value: Vec<u64>) -> Self {
        Self {
            key_id,
            value,
            value_records: Vec::new(),
        }
    }
}

/// A property slot: a few property blocks plus links to its neighbours in
/// the owner's property chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRecord {
    /// Slot id.
    pub id: u64,
    /// Whether the slot holds live data.
    pub in_use: bool,
    /// Set when this transaction created the record.
    pub created: bool,
    /// Previous record of the chain.
    pub prev_prop: i64,
    /// Next record of the chain.
    pub next_prop: i64,
    /// Owning entity.
    pub owner: PropertyOwner,
    /// Property values stored here.
    pub blocks: Vec<PropertyBlock>,
    /// Value blocks freed by this transaction.
    pub deleted_records: Vec<DynamicRecord>,
}

impl PropertyRecord {
    /// An empty, not-in-use record.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            in_use: false,
            created: false,
            prev_prop: NULL_REFERENCE,
            next_prop: NULL_REFERENCE,
            owner: PropertyOwner::None,
            blocks: Vec::new(),
            deleted_records: Vec::new(),
        }
    }

    /// An empty, not-in-use record already linked to `owner`.
    #[must_use]
    pub fn owned_by(id: u64, owner: PropertyOwner) -> Self {
        Self {
            owner,
            ..Self::new(id)
        }
    }
}

impl_store_record!(PropertyRecord, "property");
