//! Output that applies commands straight to the record stores.

use super::{Output, TxStart};
use crate::command::Command;
use crate::error::CoreResult;
use crate::replay::ReplayVisitor;
use crate::store::StoreSet;
use crate::types::{CommitPhase, TransactionId};

/// Applies commands directly to stores, without logging them.
///
/// Boundary entries are accepted and ignored; only commands change state.
/// Used to re-derive store state from a command stream that is already
/// durable somewhere else.
pub struct RecordOutput<'s> {
    visitor: ReplayVisitor<'s>,
    applied: u64,
}

impl<'s> RecordOutput<'s> {
    /// Creates an output applying to `stores`.
    pub fn new(stores: &'s mut StoreSet) -> Self {
        Self {
            visitor: ReplayVisitor::new(stores),
            applied: 0,
        }
    }

    /// Number of commands applied so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// The stores being applied to.
    pub fn stores(&self) -> &StoreSet {
        self.visitor.stores()
    }
}

impl Output for RecordOutput<'_> {
    fn write_start(&mut self, _start: &TxStart) -> CoreResult<()> {
        Ok(())
    }

    fn write_command(&mut self, _identifier: i32, command: Command) -> CoreResult<()> {
        self.visitor.visit(&command)?;
        self.applied += 1;
        Ok(())
    }

    fn write_prepare(&mut self, _identifier: i32, _timestamp: u64) -> CoreResult<()> {
        Ok(())
    }

    fn write_commit(
        &mut self,
        _identifier: i32,
        _phase: CommitPhase,
        _tx_id: TransactionId,
        _timestamp: u64,
    ) -> CoreResult<()> {
        Ok(())
    }

    fn write_done(&mut self, _identifier: i32) -> CoreResult<()> {
        Ok(())
    }
}
