//! Memory-read latency measurement
//! Sequential blocking reads, min/max/total folded on the fly

use crate::config::RunConfig;
use crate::error::ProbeResult;
use crate::probe::MemoryReader;
use crate::timer::{elapsed, Clock, MonotonicClock};
use std::fmt;
use std::hint::black_box;
use tracing::{debug, trace};

/// Aggregate over one benchmark run, all durations in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkResult {
    pub count: u64,
    pub min_us: u64,
    pub max_us: u64,
    pub total_us: u64,
    /// `total_us / count`, truncated
    pub avg_us: u64,
    /// Whole run including loop overhead
    pub wall_span_us: u64,
}

impl fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results:")?;
        writeln!(f, "Number of reads: {}", self.count)?;
        writeln!(f, "Min read time [us]: {}", self.min_us)?;
        writeln!(f, "Max read time [us]: {}", self.max_us)?;
        writeln!(f, "Avg read time [us]: {}", self.avg_us)?;
        write!(
            f,
            "Raw read test is finished. Duration [ms]: {}",
            self.wall_span_us / 1000
        )
    }
}

/// Running min/max/total over read durations
#[derive(Debug, Default, Clone, Copy)]
pub struct LatencyStats {
    count: u64,
    min: Option<u64>,
    max: u64,
    total: u64,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample in. Equal values never replace the stored min.
    #[inline]
    pub fn record(&mut self, duration_us: u64) {
        self.count += 1;
        self.total += duration_us;
        self.max = self.max.max(duration_us);
        self.min = match self.min {
            Some(min) if duration_us >= min => Some(min),
            _ => Some(duration_us),
        };
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Finalize. An empty run reports zeros rather than dividing by zero.
    pub fn finish(self, wall_span_us: u64) -> BenchmarkResult {
        BenchmarkResult {
            count: self.count,
            min_us: self.min.unwrap_or(0),
            max_us: self.max,
            total_us: self.total,
            avg_us: self.total.checked_div(self.count).unwrap_or(0),
            wall_span_us,
        }
    }
}

/// One timed read
#[derive(Debug, Clone, Copy)]
struct ReadSample {
    address: u64,
    length: u64,
    duration_us: u64,
}

/// Run the benchmark against the process monotonic clock
pub fn run_benchmark<R>(reader: &R, config: &RunConfig) -> ProbeResult<BenchmarkResult>
where
    R: MemoryReader + ?Sized,
{
    run_benchmark_with_clock(reader, &MonotonicClock, config)
}

/// Read `config.address` `config.repetitions` times and aggregate latencies.
///
/// The first failed read aborts the run and its error is returned as is; a
/// partial aggregate is never produced.
pub fn run_benchmark_with_clock<R, C>(
    reader: &R,
    clock: &C,
    config: &RunConfig,
) -> ProbeResult<BenchmarkResult>
where
    R: MemoryReader + ?Sized,
    C: Clock + ?Sized,
{
    let repetitions = config.repetitions.get();
    debug!(
        address = config.address,
        length = config.length,
        repetitions,
        mode = ?config.mode,
        "Starting read benchmark"
    );

    let test_start = clock.now();
    let mut stats = LatencyStats::new();

    for _ in 0..repetitions {
        let start = clock.now();
        let data = reader.read(
            config.mode,
            config.channel_id,
            config.address,
            config.length,
            config.unit_size,
        )?;
        let end = clock.now();
        black_box(data);

        let sample = ReadSample {
            address: config.address,
            length: config.length,
            duration_us: elapsed(start, end),
        };
        trace!(
            address = sample.address,
            length = sample.length,
            duration_us = sample.duration_us,
            "read"
        );
        stats.record(sample.duration_us);

        metrics::counter!("probe_bench_reads_total").increment(1);
        metrics::histogram!("probe_bench_read_latency_us").record(sample.duration_us as f64);
    }

    let test_end = clock.now();

    let result = stats.finish(elapsed(test_start, test_end));
    debug_assert_eq!(result.count, repetitions as u64);

    debug!(
        count = result.count,
        min_us = result.min_us,
        max_us = result.max_us,
        avg_us = result.avg_us,
        wall_span_us = result.wall_span_us,
        "Read benchmark finished"
    );

    Ok(result)
}
