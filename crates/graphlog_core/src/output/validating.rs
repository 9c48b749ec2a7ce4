//! Output wrapper that checks the order of protocol steps.

use super::{Output, TxStart};
use crate::command::Command;
use crate::error::{CoreError, CoreResult};
use crate::log::EntryKind;
use crate::types::{CommitPhase, TransactionId};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Started,
    Prepared,
    Committed,
}

impl Step {
    fn allows(state: Option<Self>, kind: EntryKind) -> bool {
        match kind {
            EntryKind::Start => state.is_none(),
            EntryKind::Command | EntryKind::Prepare => state == Some(Self::Started),
            EntryKind::OnePhaseCommit | EntryKind::TwoPhaseCommit => {
                matches!(state, Some(Self::Started | Self::Prepared))
            }
            EntryKind::Done => state == Some(Self::Committed),
        }
    }

    fn expected(state: Option<Self>) -> &'static str {
        match state {
            None => "start",
            Some(Self::Started) => "command, prepare or commit",
            Some(Self::Prepared) => "commit",
            Some(Self::Committed) => "done",
        }
    }
}

/// Wraps an output and rejects entries that break the per-transaction
/// order Start, Command*, Prepare?, Commit, Done.
///
/// A rejected entry is not forwarded. Once Done is forwarded the
/// identifier may start a new transaction.
#[derive(Debug)]
pub struct SequenceValidatingOutput<O> {
    inner: O,
    open: HashMap<i32, Step>,
}

impl<O: Output> SequenceValidatingOutput<O> {
    /// Wraps `inner`.
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            open: HashMap::new(),
        }
    }

    /// The wrapped output.
    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Unwraps the output.
    pub fn into_inner(self) -> O {
        self.inner
    }

    /// Identifiers whose transactions have not reached Done, sorted.
    pub fn open_transactions(&self) -> Vec<i32> {
        let mut open: Vec<_> = self.open.keys().copied().collect();
        open.sort_unstable();
        open
    }

    fn check(&self, identifier: i32, kind: EntryKind) -> CoreResult<()> {
        let state = self.open.get(&identifier).copied();
        if Step::allows(state, kind) {
            Ok(())
        } else {
            Err(CoreError::SequenceViolation {
                identifier,
                expected: Step::expected(state),
                found: kind.name(),
            })
        }
    }
}

impl<O: Output> Output for SequenceValidatingOutput<O> {
    fn write_start(&mut self, start: &TxStart) -> CoreResult<()> {
        self.check(start.identifier, EntryKind::Start)?;
        self.inner.write_start(start)?;
        self.open.insert(start.identifier, Step::Started);
        Ok(())
    }

    fn write_command(&mut self, identifier: i32, command: Command) -> CoreResult<()> {
        self.check(identifier, EntryKind::Command)?;
        self.inner.write_command(identifier, command)
    }

    fn write_prepare(&mut self, identifier: i32, timestamp: u64) -> CoreResult<()> {
        self.check(identifier, EntryKind::Prepare)?;
        self.inner.write_prepare(identifier, timestamp)?;
        self.open.insert(identifier, Step::Prepared);
        Ok(())
    }

    fn write_commit(
        &mut self,
        identifier: i32,
        phase: CommitPhase,
        tx_id: TransactionId,
        timestamp: u64,
    ) -> CoreResult<()> {
        self.check(identifier, EntryKind::OnePhaseCommit)?;
        self.inner.write_commit(identifier, phase, tx_id, timestamp)?;
        self.open.insert(identifier, Step::Committed);
        Ok(())
    }

    fn write_done(&mut self, identifier: i32) -> CoreResult<()> {
        self.check(identifier, EntryKind::Done)?;
        self.inner.write_done(identifier)?;
        self.open.remove(&identifier);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::CommandCollector;
    use crate::record::StoreHeaderRecord;
    use crate::xid::Xid;

    fn start(identifier: i32) -> TxStart {
        TxStart {
            xid: Xid::new(vec![1], vec![2]),
            identifier,
            master_id: 0,
            my_id: 0,
            start_timestamp: 0,
            last_committed_tx: TransactionId::new(0),
        }
    }

    fn header() -> Command {
        Command::StoreHeader(StoreHeaderRecord::new())
    }

    #[test]
    fn full_sequences_pass_and_free_the_identifier() {
        let mut output = SequenceValidatingOutput::new(CommandCollector::new());
        for phase in [CommitPhase::OnePhase, CommitPhase::TwoPhase] {
            output.write_start(&start(1)).unwrap();
            output.write_command(1, header()).unwrap();
            if phase.is_two_phase() {
                output.write_prepare(1, 0).unwrap();
            }
            output
                .write_commit(1, phase, TransactionId::new(1), 0)
                .unwrap();
            output.write_done(1).unwrap();
        }
        assert!(output.open_transactions().is_empty());
        assert_eq!(output.into_inner().len(), 9);
    }

    #[test]
    fn command_without_start_is_rejected_and_not_forwarded() {
        let mut output = SequenceValidatingOutput::new(CommandCollector::new());
        let err = output.write_command(4, header()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::SequenceViolation {
                identifier: 4,
                expected: "start",
                found: "command"
            }
        ));
        assert!(output.inner().is_empty());
    }

    #[test]
    fn command_after_prepare_is_rejected() {
        let mut output = SequenceValidatingOutput::new(CommandCollector::new());
        output.write_start(&start(1)).unwrap();
        output.write_prepare(1, 0).unwrap();
        assert!(output.write_command(1, header()).is_err());
        assert!(output.write_done(1).is_err());
        assert_eq!(output.open_transactions(), vec![1]);
    }

    #[test]
    fn interleaved_transactions_are_tracked_separately() {
        let mut output = SequenceValidatingOutput::new(CommandCollector::new());
        output.write_start(&start(1)).unwrap();
        output.write_start(&start(2)).unwrap();
        assert!(output.write_start(&start(1)).is_err());
        output
            .write_commit(2, CommitPhase::OnePhase, TransactionId::new(5), 0)
            .unwrap();
        output.write_command(1, header()).unwrap();
        assert_eq!(output.open_transactions(), vec![1, 2]);
    }
}
