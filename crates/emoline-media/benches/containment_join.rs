//! Containment join benchmarks.
//!
//! Compares the scan and indexed strategies of `SegmentMerger`.
//!
//! # Running Benchmarks
//! ```bash
//! cargo bench --package emoline-media --bench containment_join
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use emoline_media::{JoinStrategy, SegmentMerger};
use emoline_models::{DetectionEvent, TimeInterval};

/// Deterministic segments: short emotions and long sentiments over `n` seconds.
fn synthetic_streams(n: usize) -> (Vec<DetectionEvent>, Vec<DetectionEvent>) {
    let emotions = (0..n)
        .map(|i| {
            let start = i as f64 + 0.25;
            let interval = TimeInterval::new(start, start + 0.5).unwrap();
            DetectionEvent::emotion("happy", 0.7, interval).unwrap()
        })
        .collect();
    let sentiments = (0..n / 4)
        .map(|i| {
            let start = (i * 4) as f64;
            let len = 3.0 + (i % 5) as f64;
            let interval = TimeInterval::new(start, start + len).unwrap();
            DetectionEvent::sentiment("positive", None, interval).unwrap()
        })
        .collect();
    (emotions, sentiments)
}

fn bench_merge_containing(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_containing");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for size in [100usize, 1_000, 10_000] {
        let (emotions, sentiments) = synthetic_streams(size);
        group.throughput(Throughput::Elements(size as u64));

        for strategy in [JoinStrategy::Scan, JoinStrategy::Indexed] {
            // Scan is quadratic; skip the largest input.
            if strategy == JoinStrategy::Scan && size > 1_000 {
                continue;
            }
            let merger = SegmentMerger::new(strategy);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", strategy), size),
                &(&emotions, &sentiments),
                |b, (e, s)| b.iter(|| black_box(merger.merge_containing(e, s))),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_merge_containing);
criterion_main!(benches);
