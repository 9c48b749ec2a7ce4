//! Fixed-slot store records.
//!
//! A record is a snapshot of one store slot: its id, whether the slot is in
//! use, whether this transaction created it, and the kind-specific fields.
//! Records carry values only. Commands pair them into before/after diffs.

mod dynamic;
mod graph;
mod property;
mod token;

pub use dynamic::DynamicRecord;
pub use graph::{NodeRecord, RelationshipGroupRecord, RelationshipRecord};
pub use property::{PropertyBlock, PropertyOwner, PropertyRecord};
pub use token::{PropertyKeyTokenRecord, TokenRecord};

/// Value of a chain pointer that points nowhere.
pub const NULL_REFERENCE: i64 = -1;

/// Behaviour every slot record shares.
pub trait StoreRecord: Clone {
    /// Store name, used in error messages.
    const STORE: &'static str;

    /// Slot id.
    fn id(&self) -> u64;

    /// Whether the slot holds live data.
    fn in_use(&self) -> bool;

    /// Marks the slot live or free.
    fn set_in_use(&mut self, in_use: bool);

    /// Whether this transaction created the slot.
    fn is_created(&self) -> bool;

    /// Flags the record as created by this transaction.
    ///
    /// Called once, right before the record is first written in use.
    fn set_created(&mut self);
}

macro_rules! impl_store_record {
    ($record:ty, $store:literal) => {
        impl $crate::record::StoreRecord for $record {
            const STORE: &'static str = $store;

            fn id(&self) -> u64 {
                u64::from(self.id)
            }

            fn in_use(&self) -> bool {
                self.in_use
            }

            fn set_in_use(&mut self, in_use: bool) {
                self.in_use = in_use;
            }

            fn is_created(&self) -> bool {
                self.created
            }

            fn set_created(&mut self) {
                self.created = true;
            }
        }
    };
}
pub(crate) use impl_store_record;

/// The single store-header record.
///
/// Holds the head of the graph's own property chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreHeaderRecord {
    /// Always true once the store exists.
    pub in_use: bool,
    /// Set when this transaction created the header.
    pub created: bool,
    /// First property record of the graph property chain.
    pub next_prop: i64,
}

impl StoreHeaderRecord {
    /// Creates a header with an empty graph property chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            in_use: true,
            created: false,
            next_prop: NULL_REFERENCE,
        }
    }

    /// Creates a header pointing at `next_prop`.
    #[must_use]
    pub fn with_next_prop(next_prop: i64) -> Self {
        Self {
            next_prop,
            ..Self::new()
        }
    }
}

impl Default for StoreHeaderRecord {
    fn default() -> Self {
        Self::new()
    }
}
