//! Transaction writer and log append benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use graphlog_bench::{memory_log, random_nodes, random_property};
use graphlog_core::{
    Command, CommandCollector, LogBufferOutput, LogConfig, LogManager, NameBlockEncoder,
    TransactionId, TransactionWriter,
};
use tempfile::TempDir;

/// Benchmark collecting node creations in memory.
fn bench_collect_nodes(c: &mut Criterion) {
    let mut group = c.benchmark_group("collect_nodes");

    for count in [1, 16, 256].iter() {
        let nodes = random_nodes(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &nodes, |b, nodes| {
            b.iter(|| {
                let mut writer = TransactionWriter::new(CommandCollector::new(), 1, 0);
                writer.start(0, 0, TransactionId::new(0)).unwrap();
                for node in nodes {
                    writer.create_node(node.clone()).unwrap();
                }
                writer.commit(false, TransactionId::new(1)).unwrap();
                writer.done().unwrap();
                black_box(writer.into_output());
            });
        });
    }

    group.finish();
}

/// Benchmark logging transactions to an in-memory log.
fn bench_log_transaction(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_transaction");

    for count in [1, 16, 256].iter() {
        let nodes = random_nodes(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &nodes, |b, nodes| {
            let log = memory_log();
            let mut tx = 0;
            b.iter(|| {
                tx += 1;
                let mut writer = TransactionWriter::new(LogBufferOutput::new(&log), 1, 0);
                writer.start(0, 0, TransactionId::new(tx - 1)).unwrap();
                for node in nodes {
                    writer.create_node(node.clone()).unwrap();
                }
                writer.commit(false, TransactionId::new(tx)).unwrap();
                writer.done().unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark durable commits to a log file.
fn bench_file_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_commit");
    group.sample_size(20);

    for sync in [false, true].iter() {
        group.bench_with_input(BenchmarkId::new("sync_on_append", sync), sync, |b, &sync| {
            let dir = TempDir::new().unwrap();
            let log = LogManager::open(
                &dir.path().join("graph.log"),
                LogConfig::new().sync_on_append(sync),
            )
            .unwrap();
            let nodes = random_nodes(4);
            let mut tx = 0;

            b.iter(|| {
                tx += 1;
                let mut writer = TransactionWriter::new(LogBufferOutput::new(&log), 1, 0);
                writer.start(0, 0, TransactionId::new(tx - 1)).unwrap();
                for node in &nodes {
                    writer.create_node(node.clone()).unwrap();
                }
                writer.commit(false, TransactionId::new(tx)).unwrap();
                writer.done().unwrap();
                log.flush().unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark command payload encoding.
fn bench_encode_command(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_command");

    for blocks in [1, 4, 16].iter() {
        let command = Command::Property {
            before: random_property(1, 7, *blocks),
            after: random_property(1, 7, *blocks),
        };
        group.bench_with_input(BenchmarkId::new("property", blocks), &command, |b, cmd| {
            b.iter(|| black_box(cmd.encode_payload().unwrap()));
        });
    }

    group.finish();
}

/// Benchmark name block encoding.
fn bench_name_blocks(c: &mut Criterion) {
    let mut group = c.benchmark_group("name_blocks");
    let encoder = NameBlockEncoder::new();

    for len in [8, 30, 300].iter() {
        let name = "n".repeat(*len);
        let ids: Vec<u64> = (0..len.div_ceil(encoder.block_size()) as u64).collect();
        group.throughput(Throughput::Bytes(*len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &name, |b, name| {
            b.iter(|| black_box(encoder.encode(black_box(name), &ids).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_collect_nodes,
    bench_log_transaction,
    bench_file_commit,
    bench_encode_command,
    bench_name_blocks
);
criterion_main!(benches);
