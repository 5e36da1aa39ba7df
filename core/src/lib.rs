//! Probe Bench
//!
//! Latency benchmark for a single target-memory read over a debug-probe
//! connection.
//!
//! ## Architecture
//! - Timer: monotonic microsecond timestamps
//! - Bench: sequential read loop with min/max/avg aggregation
//! - Probe: session, execution-control and memory-access capabilities
//! - Harness: session lifecycle with scope-guarded polling suspension

pub mod bench;
pub mod config;
pub mod error;
pub mod harness;
pub mod probe;
pub mod timer;

pub use bench::{run_benchmark, run_benchmark_with_clock, BenchmarkResult, LatencyStats};
pub use config::{Config, LoggingConfig, RunConfig};
pub use error::{ProbeError, ProbeResult};
pub use harness::{Harness, PollingGuard, SessionGuard};
pub use probe::{
    AccessMode, ExecutionControl, MemoryReader, SessionControl, SimulatedProbe,
    SimulatedProbeConfig, VersionInfo,
};
