//! Replay of durable commands against live stores.

use crate::command::Command;
use crate::error::CoreResult;
use crate::store::StoreSet;
use tracing::trace;

/// Applies commands' after-states to a [`StoreSet`].
///
/// Each [`ReplayVisitor::visit`] raises the set's recovery flag for exactly
/// that one apply, so the stores skip their online invariant checks, and
/// puts the flag back to its previous value on every exit path.
pub struct ReplayVisitor<'s> {
    stores: &'s mut StoreSet,
}

impl<'s> ReplayVisitor<'s> {
    /// Creates a visitor applying to `stores`.
    pub fn new(stores: &'s mut StoreSet) -> Self {
        Self { stores }
    }

    /// Applies one command.
    ///
    /// # Errors
    ///
    /// Propagates the store's error; the recovery flag is already restored
    /// when the error reaches the caller.
    pub fn visit(&mut self, command: &Command) -> CoreResult<()> {
        let guard = self.stores.recovery_flag().raise();
        trace!(
            kind = command.kind().name(),
            id = command.record_id(),
            "replaying command"
        );
        self.stores.apply(command, guard.mode())
    }

    /// The stores being applied to.
    pub fn stores(&self) -> &StoreSet {
        self.stores
    }
}
