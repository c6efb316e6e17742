//! Criterion benchmarks for the OSC/TUIO codec and the partition router.
//!
//! One output cycle routes the session table, encodes one bundle, and the
//! receiving side decodes it again.  These benches measure each step for a
//! few realistic cursor counts.
//!
//! Run with:
//! ```bash
//! cargo bench --package tuio-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tuio_core::{decode_frame, encode_cursor_bundle, CursorSession, DisplayPartition, Vec2};

// ── Fixtures ──────────────────────────────────────────────────────────────────

const CURSOR_COUNTS: [usize; 4] = [0, 1, 10, 50];

/// `count` cursors spread evenly across the surface.
fn make_cursors(count: usize) -> Vec<CursorSession> {
    (0..count)
        .map(|i| {
            let t = (i as f32 + 0.5) / count.max(1) as f32;
            CursorSession::at(i as i32, Vec2::new(t, 1.0 - t))
        })
        .collect()
}

// ── Benchmark groups ──────────────────────────────────────────────────────────

/// Benchmarks `encode_cursor_bundle` for several table sizes.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_cursor_bundle");
    for count in CURSOR_COUNTS {
        let cursors = make_cursors(count);
        group.bench_with_input(BenchmarkId::new("cursors", count), &cursors, |b, cursors| {
            b.iter(|| encode_cursor_bundle(black_box(cursors), black_box(1)).expect("encode"))
        });
    }
    group.finish();
}

/// Benchmarks `decode_frame` on pre-encoded bundles.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");
    for count in CURSOR_COUNTS {
        let bytes = encode_cursor_bundle(&make_cursors(count), 1)
            .expect("encode must succeed for benchmark setup");
        group.bench_with_input(BenchmarkId::new("cursors", count), &bytes, |b, bytes| {
            b.iter(|| decode_frame(black_box(bytes)).expect("decode"))
        });
    }
    group.finish();
}

/// Benchmarks the tile remap and filter for a four-way partition.
fn bench_route(c: &mut Criterion) {
    let partition = DisplayPartition::new(4, 3);
    let mut group = c.benchmark_group("partition_route");
    for count in CURSOR_COUNTS {
        let cursors = make_cursors(count);
        group.bench_with_input(BenchmarkId::new("cursors", count), &cursors, |b, cursors| {
            b.iter(|| partition.route(black_box(cursors)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_route);
criterion_main!(benches);
