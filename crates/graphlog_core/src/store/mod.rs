//! Record stores that replay applies commands to.
//!
//! The stores themselves are collaborators: anything implementing
//! [`RecordStore`] can be plugged into a [`StoreSet`]. The in-memory
//! implementation here backs tests, the CLI and recovery tooling.

mod flag;
mod memory;
mod set;

pub use flag::{ApplyMode, RecoveryFlag, RecoveryGuard};
pub use memory::InMemoryRecordStore;
pub use set::StoreSet;

use crate::error::CoreResult;
use crate::record::StoreRecord;

/// A store of fixed-size records addressed by slot id.
pub trait RecordStore<R: StoreRecord>: Send + Sync {
    /// Reads the record in slot `id`, if the slot was ever written.
    fn get(&self, id: u64) -> CoreResult<Option<R>>;

    /// Writes `record` into its slot.
    ///
    /// In [`ApplyMode::Normal`] the store enforces its online invariants:
    /// a record flagged created must not land on a slot in use, and a
    /// record not flagged created must land on an existing slot. In
    /// [`ApplyMode::Recovering`] every write is an upsert by slot id.
    ///
    /// # Errors
    ///
    /// [`crate::CoreError::RecordInUse`] or [`crate::CoreError::RecordNotFound`]
    /// for a rejected online write, or any error of the backing storage.
    fn update_record(&mut self, record: &R, mode: ApplyMode) -> CoreResult<()>;

    /// Number of slots currently in use.
    fn in_use_count(&self) -> CoreResult<usize>;
}
