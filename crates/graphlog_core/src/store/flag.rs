//! Recovery mode flag and its scope guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How a store write is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApplyMode {
    /// Live mutation; online invariants apply.
    #[default]
    Normal,
    /// Replay of durable commands; online invariants are skipped.
    Recovering,
}

impl ApplyMode {
    /// Returns `true` for [`ApplyMode::Recovering`].
    #[must_use]
    pub const fn is_recovering(self) -> bool {
        matches!(self, Self::Recovering)
    }
}

/// The "recovery in progress" flag shared by a store set and everyone
/// watching it.
///
/// Clones share the same flag. Raise it only through [`RecoveryFlag::raise`],
/// which restores the previous value when the guard drops.
#[derive(Debug, Clone, Default)]
pub struct RecoveryFlag(Arc<AtomicBool>);

impl RecoveryFlag {
    /// Creates a lowered flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a replay apply is in progress.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Mode a store write issued right now should use.
    #[must_use]
    pub fn mode(&self) -> ApplyMode {
        if self.is_raised() {
            ApplyMode::Recovering
        } else {
            ApplyMode::Normal
        }
    }

    /// Raises the flag until the returned guard is dropped.
    #[must_use = "the flag is restored as soon as the guard is dropped"]
    pub fn raise(&self) -> RecoveryGuard {
        let previous = self.0.swap(true, Ordering::SeqCst);
        RecoveryGuard {
            flag: self.clone(),
            previous,
        }
    }
}

/// Keeps a [`RecoveryFlag`] raised; restores its previous value on drop,
/// including unwinding and early returns.
#[derive(Debug)]
pub struct RecoveryGuard {
    flag: RecoveryFlag,
    previous: bool,
}

impl RecoveryGuard {
    /// Mode for writes issued under this guard.
    #[must_use]
    pub fn mode(&self) -> ApplyMode {
        ApplyMode::Recovering
    }

    /// Value the flag had before this guard raised it.
    #[must_use]
    pub fn previous(&self) -> bool {
        self.previous
    }
}

impl Drop for RecoveryGuard {
    fn drop(&mut self) {
        self.flag.0.store(self.previous, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_restores_lowered_flag() {
        let flag = RecoveryFlag::new();
        {
            let guard = flag.raise();
            assert!(flag.is_raised());
            assert_eq!(guard.mode(), ApplyMode::Recovering);
            assert!(!guard.previous());
        }
        assert!(!flag.is_raised());
        assert_eq!(flag.mode(), ApplyMode::Normal);
    }

    #[test]
    fn nested_guards_restore_in_order() {
        let flag = RecoveryFlag::new();
        let outer = flag.raise();
        {
            let _inner = flag.raise();
            assert!(flag.is_raised());
        }
        assert!(flag.is_raised());
        drop(outer);
        assert!(!flag.is_raised());
    }

    #[test]
    fn guard_restores_on_panic() {
        let flag = RecoveryFlag::new();
        let watched = flag.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = watched.raise();
            panic!("apply blew up");
        });
        assert!(result.is_err());
        assert!(!flag.is_raised());
    }
}
