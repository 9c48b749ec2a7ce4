//! Benchmark utilities.

use graphlog_core::{
    LogBufferOutput, LogConfig, LogManager, NodeRecord, PropertyBlock, PropertyOwner,
    PropertyRecord, TransactionId, TransactionWriter,
};
use graphlog_storage::MemoryBuffer;
use rand::Rng;

/// Generate nodes with random chain pointers and labels.
pub fn random_nodes(count: usize) -> Vec<NodeRecord> {
    let mut rng = rand::thread_rng();
    (0..count as u64)
        .map(|id| {
            let next_rel = rng.gen_range(0..1 << 20);
            let next_prop = rng.gen_range(0..1 << 20);
            let mut node = NodeRecord::with(id, true, next_rel, next_prop);
            node.labels = rng.gen();
            node
        })
        .collect()
}

/// Generate a property record owned by `node` with `blocks` inline values.
pub fn random_property(id: u64, node: u64, blocks: usize) -> PropertyRecord {
    let mut rng = rand::thread_rng();
    let mut record = PropertyRecord::owned_by(id, PropertyOwner::Node(node));
    record.in_use = true;
    record.blocks = (0..blocks)
        .map(|key| PropertyBlock::inline(key as u32, vec![rng.gen(), rng.gen()]))
        .collect();
    record
}

/// An in-memory log that never flushes.
pub fn memory_log() -> LogManager {
    LogManager::with_config(
        Box::new(MemoryBuffer::new()),
        LogConfig::new().sync_on_append(false),
    )
}

/// Logs `transactions` committed transactions of `nodes_per_tx` node creations each.
pub fn populate(log: &LogManager, transactions: u64, nodes_per_tx: usize) {
    let nodes = random_nodes(nodes_per_tx);
    for tx in 1..=transactions {
        let identifier = (tx % 64) as i32;
        let mut writer = TransactionWriter::new(LogBufferOutput::new(log), identifier, 0);
        writer.start(0, 0, TransactionId::new(tx - 1)).unwrap();
        for node in &nodes {
            let mut node = node.clone();
            node.id += tx * nodes_per_tx as u64;
            writer.create_node(node).unwrap();
        }
        writer.commit(false, TransactionId::new(tx)).unwrap();
        writer.done().unwrap();
    }
}
