//! Log reading and recovery benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use graphlog_bench::{memory_log, populate};
use graphlog_core::{recover, LogConfig, LogManager, StoreSet, TransactionId};
use graphlog_storage::MemoryBuffer;

/// Benchmark streaming reads with different chunk sizes.
fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    let source = memory_log();
    populate(&source, 200, 8);
    let entries = source.read_all().unwrap();
    let size = source.size().unwrap();

    for chunk in [256, 4096, 64 * 1024].iter() {
        let log = LogManager::with_config(
            Box::new(MemoryBuffer::new()),
            LogConfig::new()
                .sync_on_append(false)
                .read_buffer_size(*chunk),
        );
        for (_, entry) in &entries {
            log.append(entry).unwrap();
        }

        group.throughput(Throughput::Bytes(size));
        group.bench_with_input(BenchmarkId::new("chunk", chunk), &log, |b, log| {
            b.iter(|| {
                let count = log.iter().unwrap().count();
                black_box(count);
            });
        });
    }

    group.finish();
}

/// Benchmark full recovery into in-memory stores.
fn bench_recover(c: &mut Criterion) {
    let mut group = c.benchmark_group("recover");
    group.sample_size(20);

    for transactions in [10u64, 100, 1000].iter() {
        let log = memory_log();
        populate(&log, *transactions, 8);

        group.throughput(Throughput::Elements(*transactions));
        group.bench_with_input(
            BenchmarkId::from_parameter(transactions),
            &log,
            |b, log| {
                b.iter(|| {
                    let mut stores = StoreSet::in_memory();
                    let stats = recover(log, &mut stores, TransactionId::new(0)).unwrap();
                    black_box(stats);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark incremental replay of the last tenth of a log.
fn bench_recover_suffix(c: &mut Criterion) {
    let log = memory_log();
    populate(&log, 1000, 8);

    c.bench_function("recover_suffix", |b| {
        b.iter(|| {
            let mut stores = StoreSet::in_memory();
            let stats = recover(&log, &mut stores, TransactionId::new(900)).unwrap();
            black_box(stats);
        });
    });
}

criterion_group!(benches, bench_iterate, bench_recover, bench_recover_suffix);
criterion_main!(benches);
