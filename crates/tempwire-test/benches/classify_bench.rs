//! Benchmarks for the classifier and the acquisition cycle

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tempwire_core::{classify, FaultTracker, SensorConfig, Timestamp};
use tempwire_runtime::{slot_pair, AcquisitionEngine};
use tempwire_test::{ChaosConfig, ChaosTransport};
use tempwire_time::ManualClock;

fn bench_classify(c: &mut Criterion) {
    c.bench_function("classify_sweep", |b| {
        let mut raw = 0u16;
        b.iter(|| {
            raw = raw.wrapping_add(1);
            black_box(classify(black_box(raw)))
        })
    });
}

fn bench_fault_tracker(c: &mut Criterion) {
    let mut tracker = FaultTracker::new();

    c.bench_function("fault_tracker_update", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            if i % 4 == 0 {
                tracker.on_success();
            } else {
                tracker.on_rejection(black_box(Timestamp::from_micros(i)));
            }
            black_box(tracker.is_connected())
        })
    });
}

fn bench_sync_cycle(c: &mut Criterion) {
    let engine = AcquisitionEngine::with_clock(
        ChaosTransport::new(ChaosConfig::perfect(), 1),
        ManualClock::new(),
        SensorConfig::default(),
    )
    .unwrap();

    c.bench_function("sync_cycle_unbound", |b| {
        b.iter(|| black_box(engine.read_synchronous()))
    });

    let (value, valid) = slot_pair();
    engine.bind(Some(value), Some(valid));
    c.bench_function("sync_cycle_bound", |b| {
        b.iter(|| black_box(engine.read_synchronous()))
    });
}

fn bench_async_cycle(c: &mut Criterion) {
    let engine = AcquisitionEngine::with_clock(
        ChaosTransport::new(ChaosConfig::poor(), 2),
        ManualClock::new(),
        SensorConfig::default(),
    )
    .unwrap();

    c.bench_function("async_cycle_poor_bus", |b| {
        b.iter(|| {
            engine.request_async();
            black_box(engine.fetch_result())
        })
    });
}

criterion_group!(
    benches,
    bench_classify,
    bench_fault_tracker,
    bench_sync_cycle,
    bench_async_cycle,
);
criterion_main!(benches);
