//! Benchmark module
//! Memory-read latency measurement over a probe connection

pub mod latency;

pub use latency::{
    run_benchmark,
    run_benchmark_with_clock,
    BenchmarkResult,
    LatencyStats,
};
