//! Verify command implementation.

use super::open_log;
use crate::error::{CliError, CliResult};
use graphlog_core::{
    Command, CommitPhase, CoreResult, LogManager, Output, SequenceValidatingOutput,
    TransactionId, TxStart,
};
use std::path::Path;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Entries decoded.
    pub entries_checked: u64,
    /// Commands decoded.
    pub commands: u64,
    /// Transactions that reached Done.
    pub transactions_done: u64,
    /// Highest committed transaction id.
    pub last_tx_id: Option<TransactionId>,
    /// Identifiers of transactions without a Done entry.
    pub open_transactions: Vec<i32>,
    /// Bytes after the last complete entry.
    pub trailing_bytes: u64,
    /// Sequencing and decoding errors.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Counts entries without keeping them.
#[derive(Debug, Default)]
struct Tally {
    commands: u64,
    done: u64,
    last_tx_id: Option<TransactionId>,
}

impl Output for Tally {
    fn write_start(&mut self, _start: &TxStart) -> CoreResult<()> {
        Ok(())
    }

    fn write_command(&mut self, _identifier: i32, _command: Command) -> CoreResult<()> {
        self.commands += 1;
        Ok(())
    }

    fn write_prepare(&mut self, _identifier: i32, _timestamp: u64) -> CoreResult<()> {
        Ok(())
    }

    fn write_commit(
        &mut self,
        _identifier: i32,
        _phase: CommitPhase,
        tx_id: TransactionId,
        _timestamp: u64,
    ) -> CoreResult<()> {
        self.last_tx_id = self.last_tx_id.max(Some(tx_id));
        Ok(())
    }

    fn write_done(&mut self, _identifier: i32) -> CoreResult<()> {
        self.done += 1;
        Ok(())
    }
}

/// Runs the verify command.
pub fn run(log_path: &Path) -> CliResult<()> {
    println!("Verifying log at {}", log_path.display());
    println!();

    let log = open_log(log_path)?;
    let result = verify_log(&log)?;
    print_result(&result);

    println!();
    if result.is_ok() {
        println!("✓ Log verification passed");
        Ok(())
    } else {
        println!("✗ Log verification failed");
        Err(CliError::VerificationFailed(result.errors.len()))
    }
}

/// Decodes every entry and checks the per-transaction entry order.
///
/// A decoding error ends the scan; sequencing errors are collected and the
/// scan continues.
pub fn verify_log(log: &LogManager) -> CliResult<VerifyResult> {
    let mut result = VerifyResult::default();
    let mut validator = SequenceValidatingOutput::new(Tally::default());

    let mut iter = log.iter()?;
    for item in iter.by_ref() {
        match item {
            Ok((offset, entry)) => {
                result.entries_checked += 1;
                if let Err(err) = validator.write_entry(entry) {
                    result.errors.push(format!("offset {offset}: {err}"));
                }
            }
            Err(err) => {
                result.errors.push(err.to_string());
                break;
            }
        }
    }
    let position = iter.position();
    drop(iter);

    if result.errors.is_empty() {
        result.trailing_bytes = log.size()?.saturating_sub(position);
    }
    result.open_transactions = validator.open_transactions();
    let tally = validator.into_inner();
    result.commands = tally.commands;
    result.transactions_done = tally.done;
    result.last_tx_id = tally.last_tx_id;
    Ok(result)
}

fn print_result(result: &VerifyResult) {
    println!("  Entries checked: {}", result.entries_checked);
    println!("  Commands: {}", result.commands);
    println!("  Transactions done: {}", result.transactions_done);
    if let Some(tx) = result.last_tx_id {
        println!("  Last committed: {tx}");
    }
    if !result.open_transactions.is_empty() {
        println!("  Open transactions: {:?}", result.open_transactions);
    }
    if result.trailing_bytes > 0 {
        println!(
            "  Torn tail: {} byte(s) after the last complete entry",
            result.trailing_bytes
        );
    }
    for error in &result.errors {
        println!("  ERROR: {error}");
    }
}
