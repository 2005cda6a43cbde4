//! Arbitration benchmarks.
//!
//! This benchmark suite measures:
//! - Sequence cache put/remove
//! - Engine ingest of healthy A/B feeds (one dispatch, one duplicate per sequence)
//! - Engine ingest of lossy, reordered feeds (cache and sweep paths)
//! - Monitor datagram handling including header decoding
//! - Per-ingest latency percentiles of a lossy scenario (printed once)
//!
//! Run with: cargo bench -p mdparb-bench --bench arbitration

use bytes::Bytes;
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use mdparb_arbitration::{ArbitrationConfig, ArbitrationEngine, ChannelMonitor, SequenceCache};
use mdparb_bench::latency::{LatencyCollector, profile_ingest};
use mdparb_bench::scenario::{FeedArrival, ScenarioConfig, generate};
use std::hint::black_box;
use std::time::Instant;

fn benchmark_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequence_cache");
    group.throughput(Throughput::Elements(1));

    group.bench_function("put_remove", |b| {
        let mut cache = SequenceCache::new(4096).unwrap();
        let payload = Bytes::from_static(b"payload");
        let mut sequence = 0u64;
        b.iter(|| {
            sequence += 1;
            cache.put(black_box(sequence), payload.clone());
            black_box(cache.remove(black_box(sequence)))
        })
    });

    group.bench_function("lowest_sequence_4096", |b| {
        let mut cache = SequenceCache::new(4096).unwrap();
        for sequence in (10_000..12_000).step_by(2) {
            cache.put(sequence, Bytes::new());
        }
        b.iter(|| black_box(cache.lowest_sequence()))
    });

    group.finish();
}

fn run_engine(arrivals: &[FeedArrival], capacity: usize) -> u64 {
    let mut engine = ArbitrationEngine::new(ArbitrationConfig::new().cache_capacity(capacity))
        .unwrap();
    let now = Instant::now();
    let mut dispatched = 0u64;
    for arrival in arrivals {
        let outcome = engine.ingest_at(arrival.line, arrival.sequence, Bytes::new(), now);
        dispatched += outcome.events.len() as u64;
    }
    dispatched
}

fn benchmark_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_ingest");

    let scenarios = [
        ("healthy", ScenarioConfig::healthy(10_000)),
        ("lossy_1pct_jitter_4", ScenarioConfig::lossy(10_000, 10, 4)),
        ("lossy_10pct_jitter_16", ScenarioConfig::lossy(10_000, 100, 16)),
    ];

    for (name, config) in scenarios {
        let arrivals = generate(&config);
        group.throughput(Throughput::Elements(arrivals.len() as u64));
        group.bench_with_input(BenchmarkId::new("scenario", name), &arrivals, |b, arrivals| {
            b.iter(|| black_box(run_engine(arrivals, 4096)))
        });
    }

    group.finish();
}

fn benchmark_monitor(c: &mut Criterion) {
    let mut group = c.benchmark_group("monitor_datagram");
    let arrivals = generate(&ScenarioConfig::lossy(10_000, 5, 2));
    group.throughput(Throughput::Elements(arrivals.len() as u64));

    group.bench_function("on_datagram", |b| {
        b.iter_batched(
            || ChannelMonitor::new(310, ArbitrationConfig::default()).unwrap(),
            |mut monitor| {
                let now = Instant::now();
                for arrival in &arrivals {
                    black_box(monitor.on_datagram(arrival.line, arrival.datagram.clone(), now));
                }
                monitor.snapshot()
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn report_ingest_latency(_c: &mut Criterion) {
    let arrivals = generate(&ScenarioConfig::lossy(100_000, 10, 4));
    let mut collector = LatencyCollector::new().unwrap();
    profile_ingest(&arrivals, ArbitrationConfig::default(), &mut collector).unwrap();

    if let Some(stats) = collector.stats() {
        println!(
            "ingest latency over {} arrivals: min {:?} p50 {:?} p99 {:?} p99.9 {:?} max {:?}",
            stats.count, stats.min, stats.median, stats.p99, stats.p999, stats.max
        );
    }
}

criterion_group!(
    benches,
    benchmark_cache,
    benchmark_engine,
    benchmark_monitor,
    report_ingest_latency
);
criterion_main!(benches);
