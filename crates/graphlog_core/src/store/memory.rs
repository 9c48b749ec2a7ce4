//! In-memory record store.

use super::{ApplyMode, RecordStore};
use crate::error::{CoreError, CoreResult};
use crate::record::StoreRecord;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::trace;

/// A record store held in memory.
///
/// Slots are kept in id order. Freed slots stay in the map with
/// `in_use = false`, the way a fixed-slot file keeps a freed record.
#[derive(Debug)]
pub struct InMemoryRecordStore<R> {
    slots: RwLock<BTreeMap<u64, R>>,
}

impl<R: StoreRecord> InMemoryRecordStore<R> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates a store pre-populated with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        let slots = records.into_iter().map(|r| (r.id(), r)).collect();
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// Returns every written slot in id order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<R> {
        self.slots.read().values().cloned().collect()
    }
}

impl<R: StoreRecord> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> RecordStore<R> for InMemoryRecordStore<R>
where
    R: StoreRecord + Send + Sync,
{
    fn get(&self, id: u64) -> CoreResult<Option<R>> {
        Ok(self.slots.read().get(&id).cloned())
    }

    fn update_record(&mut self, record: &R, mode: ApplyMode) -> CoreResult<()> {
        let id = record.id();
        let slots = self.slots.get_mut();

        if mode == ApplyMode::Normal {
            let existing = slots.get(&id);
            if record.is_created() && existing.is_some_and(|slot| slot.in_use()) {
                return Err(CoreError::RecordInUse { store: R::STORE, id });
            }
            if !record.is_created() && existing.is_none() {
                return Err(CoreError::RecordNotFound { store: R::STORE, id });
            }
        }

        trace!(store = R::STORE, id, in_use = record.in_use(), ?mode, "update record");
        slots.insert(id, record.clone());
        Ok(())
    }

    fn in_use_count(&self) -> CoreResult<usize> {
        Ok(self.slots.read().values().filter(|r| r.in_use()).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NodeRecord;

    fn created(id: u64) -> NodeRecord {
        let mut node = NodeRecord::with(id, true, -1, -1);
        node.set_created();
        node
    }

    #[test]
    fn online_create_then_update() {
        let mut store = InMemoryRecordStore::new();
        store.update_record(&created(1), ApplyMode::Normal).unwrap();

        let mut updated = NodeRecord::with(1, true, 5, -1);
        updated.labels = 3;
        store.update_record(&updated, ApplyMode::Normal).unwrap();
        assert_eq!(store.get(1).unwrap(), Some(updated));
        assert_eq!(store.in_use_count().unwrap(), 1);
    }

    #[test]
    fn online_create_over_live_slot_is_rejected() {
        let mut store = InMemoryRecordStore::with_records([NodeRecord::with(1, true, -1, -1)]);
        let err = store
            .update_record(&created(1), ApplyMode::Normal)
            .unwrap_err();
        assert!(matches!(err, CoreError::RecordInUse { store: "node", id: 1 }));
    }

    #[test]
    fn online_update_of_missing_slot_is_rejected() {
        let mut store = InMemoryRecordStore::<NodeRecord>::new();
        let err = store
            .update_record(&NodeRecord::with(9, true, -1, -1), ApplyMode::Normal)
            .unwrap_err();
        assert!(matches!(err, CoreError::RecordNotFound { store: "node", id: 9 }));
    }

    #[test]
    fn recovering_writes_are_upserts() {
        let mut store = InMemoryRecordStore::with_records([NodeRecord::with(1, true, -1, -1)]);
        store
            .update_record(&created(1), ApplyMode::Recovering)
            .unwrap();
        store
            .update_record(&NodeRecord::with(2, true, -1, -1), ApplyMode::Recovering)
            .unwrap();
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn freed_slots_are_kept_but_not_counted() {
        let mut store = InMemoryRecordStore::with_records([NodeRecord::with(1, true, -1, -1)]);
        store
            .update_record(&NodeRecord::new(1), ApplyMode::Normal)
            .unwrap();
        assert_eq!(store.in_use_count().unwrap(), 0);
        assert!(store.get(1).unwrap().is_some());
    }
}
