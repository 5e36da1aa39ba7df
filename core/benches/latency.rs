//! Overhead of the read loop itself, measured against a zero-latency reader

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use probe_bench::{run_benchmark, AccessMode, MemoryReader, ProbeResult, RunConfig};
use std::num::NonZeroU32;

struct NullReader;

impl MemoryReader for NullReader {
    fn read(
        &self,
        _mode: AccessMode,
        _channel_id: u32,
        _address: u64,
        length: u64,
        _unit_size: u32,
    ) -> ProbeResult<Vec<u8>> {
        Ok(vec![0; length as usize])
    }
}

fn bench_loop(c: &mut Criterion) {
    let config = RunConfig {
        repetitions: NonZeroU32::new(1000).unwrap(),
        ..RunConfig::default()
    };

    c.bench_function("run_benchmark 1000 null reads", |b| {
        b.iter(|| run_benchmark(black_box(&NullReader), &config).unwrap())
    });
}

criterion_group!(benches, bench_loop);
criterion_main!(benches);
