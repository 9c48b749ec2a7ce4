//! Replay command implementation.

use super::open_log;
use crate::error::CliResult;
use graphlog_core::{recover, RecoveryStats, StoreSet, TransactionId};
use std::path::Path;
use tracing::info;

/// Runs the replay command.
pub fn run(log_path: &Path, after_tx: u64) -> CliResult<()> {
    info!("Replaying {:?} after tx {}", log_path, after_tx);

    let log = open_log(log_path)?;
    let mut stores = StoreSet::in_memory();
    let stats = recover(&log, &mut stores, TransactionId::new(after_tx))?;

    print_stats(&stats);
    println!();
    println!("Records in use:");
    for (store, count) in stores.in_use_counts()? {
        println!("  {store:24} {count}");
    }
    println!("  {:24} {}", "next graph property", stores.header().next_prop);
    Ok(())
}

fn print_stats(stats: &RecoveryStats) {
    println!("✓ Replay complete");
    println!("  Transactions applied: {}", stats.transactions_applied);
    println!("  Commands applied: {}", stats.commands_applied);
    println!("  Transactions skipped: {}", stats.transactions_skipped);
    println!("  Incomplete discarded: {}", stats.incomplete_discarded);
    match stats.last_tx_id {
        Some(tx) => println!("  Last committed: {tx}"),
        None => println!("  Last committed: none"),
    }
}
