//! Benchmark orchestration
//!
//! Connects, resets the target, suspends status polling, runs the read
//! benchmark, then undoes both side effects. Session and polling state are
//! held by guards, so an error anywhere after they are taken still restores
//! polling and ends the session.

use crate::bench::{run_benchmark, BenchmarkResult};
use crate::config::RunConfig;
use crate::error::ProbeResult;
use crate::probe::{ExecutionControl, MemoryReader, SessionControl};
use tracing::{info, warn};

const BANNER: &str = "****************************************";

/// Open debug session, ended on drop
pub struct SessionGuard<'a, S: SessionControl + ?Sized> {
    session: &'a S,
    open: bool,
}

impl<'a, S: SessionControl + ?Sized> SessionGuard<'a, S> {
    pub fn connect(session: &'a S) -> ProbeResult<Self> {
        session.connect()?;
        Ok(Self {
            session,
            open: true,
        })
    }

    /// End the session, reporting any teardown failure.
    pub fn end(mut self) -> ProbeResult<()> {
        self.open = false;
        self.session.end_session()
    }
}

impl<S: SessionControl + ?Sized> Drop for SessionGuard<'_, S> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.session.end_session() {
                warn!("Failed to end session during unwind: {}", e);
            }
        }
    }
}

/// Target status polling held off, re-enabled on drop
pub struct PollingGuard<'a, E: ExecutionControl + ?Sized> {
    execution: &'a E,
    suspended: bool,
}

impl<'a, E: ExecutionControl + ?Sized> PollingGuard<'a, E> {
    pub fn suspend(execution: &'a E) -> ProbeResult<Self> {
        execution.set_polling_enabled(false)?;
        Ok(Self {
            execution,
            suspended: true,
        })
    }

    pub fn restore(mut self) -> ProbeResult<()> {
        self.suspended = false;
        self.execution.set_polling_enabled(true)
    }
}

impl<E: ExecutionControl + ?Sized> Drop for PollingGuard<'_, E> {
    fn drop(&mut self) {
        if self.suspended {
            if let Err(e) = self.execution.set_polling_enabled(true) {
                warn!("Failed to re-enable polling during unwind: {}", e);
            }
        }
    }
}

/// Wires the probe collaborators together for one run
pub struct Harness<'a, S: ?Sized, E: ?Sized, M: ?Sized> {
    session: &'a S,
    execution: &'a E,
    memory: &'a M,
}

impl<'a, S, E, M> Harness<'a, S, E, M>
where
    S: SessionControl + ?Sized,
    E: ExecutionControl + ?Sized,
    M: MemoryReader + ?Sized,
{
    pub fn new(session: &'a S, execution: &'a E, memory: &'a M) -> Self {
        Self {
            session,
            execution,
            memory,
        }
    }

    /// Full session: connect, reset, benchmark with polling off, tear down.
    pub fn run(&self, config: &RunConfig) -> ProbeResult<BenchmarkResult> {
        let session = SessionGuard::connect(self.session)?;

        let version = self.session.environment_version()?;
        println!("Connected to {}", version);
        info!(%version, "Debug session established");

        println!("Stop...");
        self.execution.reset()?;

        // Polling adds large jitter to individual reads
        let polling = PollingGuard::suspend(self.execution)?;
        let result = raw_read_test(self.memory, config)?;
        polling.restore()?;

        println!("Ending session...");
        session.end()?;

        println!("Finished");
        Ok(result)
    }
}

/// Benchmark with the console banner and results block around it
pub fn raw_read_test<M>(memory: &M, config: &RunConfig) -> ProbeResult<BenchmarkResult>
where
    M: MemoryReader + ?Sized,
{
    println!("{}", BANNER);
    println!("Starting raw read test ...");

    let result = run_benchmark(memory, config)?;

    println!("\n{}", result);
    println!("{}", BANNER);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::probe::{AccessMode, SimulatedProbe, SimulatedProbeConfig, VersionInfo};
    use std::cell::{Cell, RefCell};
    use std::num::NonZeroU32;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Connect,
        Version,
        Reset,
        Polling(bool),
        Read,
        EndSession,
    }

    /// Probe that logs every call and can fail at chosen points
    #[derive(Default)]
    struct RecordingProbe {
        calls: RefCell<Vec<Call>>,
        fail_connect: bool,
        fail_reset: bool,
        fail_restore: bool,
        fail_read_at: Option<usize>,
        reads: Cell<usize>,
    }

    impl RecordingProbe {
        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn push(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl SessionControl for RecordingProbe {
        fn connect(&self) -> ProbeResult<()> {
            self.push(Call::Connect);
            if self.fail_connect {
                return Err(ProbeError::Connection("no environment".to_string()));
            }
            Ok(())
        }

        fn environment_version(&self) -> ProbeResult<VersionInfo> {
            self.push(Call::Version);
            Ok(VersionInfo {
                name: "Recorder".to_string(),
                major: 1,
                minor: 0,
                build: 0,
            })
        }

        fn end_session(&self) -> ProbeResult<()> {
            self.push(Call::EndSession);
            Ok(())
        }
    }

    impl ExecutionControl for RecordingProbe {
        fn set_polling_enabled(&self, enabled: bool) -> ProbeResult<()> {
            self.push(Call::Polling(enabled));
            if enabled && self.fail_restore {
                return Err(ProbeError::Session("polling stuck".to_string()));
            }
            Ok(())
        }

        fn reset(&self) -> ProbeResult<()> {
            self.push(Call::Reset);
            if self.fail_reset {
                return Err(ProbeError::Session("reset refused".to_string()));
            }
            Ok(())
        }
    }

    impl MemoryReader for RecordingProbe {
        fn read(
            &self,
            _mode: AccessMode,
            _channel_id: u32,
            address: u64,
            length: u64,
            _unit_size: u32,
        ) -> ProbeResult<Vec<u8>> {
            let n = self.reads.get();
            self.reads.set(n + 1);
            if self.fail_read_at == Some(n) {
                return Err(ProbeError::access(address, "target disconnected"));
            }
            // Only the first read is logged to keep the trace short
            if n == 0 {
                self.push(Call::Read);
            }
            Ok(vec![0; length as usize])
        }
    }

    fn run_config(repetitions: u32) -> RunConfig {
        RunConfig {
            repetitions: NonZeroU32::new(repetitions).unwrap(),
            ..RunConfig::default()
        }
    }

    fn run(probe: &RecordingProbe, repetitions: u32) -> ProbeResult<BenchmarkResult> {
        Harness::new(probe, probe, probe).run(&run_config(repetitions))
    }

    #[test]
    fn test_call_order() {
        let probe = RecordingProbe::default();
        let result = run(&probe, 5).unwrap();

        assert_eq!(result.count, 5);
        assert_eq!(
            probe.calls(),
            vec![
                Call::Connect,
                Call::Version,
                Call::Reset,
                Call::Polling(false),
                Call::Read,
                Call::Polling(true),
                Call::EndSession,
            ]
        );
    }

    #[test]
    fn test_read_failure_still_tears_down() {
        let probe = RecordingProbe {
            fail_read_at: Some(3),
            ..Default::default()
        };

        let err = run(&probe, 10).unwrap_err();

        assert!(matches!(err, ProbeError::Access { .. }));
        assert_eq!(probe.reads.get(), 4);
        let calls = probe.calls();
        assert_eq!(
            &calls[calls.len() - 2..],
            &[Call::Polling(true), Call::EndSession]
        );
    }

    #[test]
    fn test_reset_failure_ends_session_only() {
        let probe = RecordingProbe {
            fail_reset: true,
            ..Default::default()
        };

        assert!(run(&probe, 10).is_err());
        assert_eq!(
            probe.calls(),
            vec![Call::Connect, Call::Version, Call::Reset, Call::EndSession]
        );
    }

    #[test]
    fn test_connect_failure_touches_nothing() {
        let probe = RecordingProbe {
            fail_connect: true,
            ..Default::default()
        };

        let err = run(&probe, 10).unwrap_err();
        assert!(matches!(err, ProbeError::Connection(_)));
        assert_eq!(probe.calls(), vec![Call::Connect]);
    }

    #[test]
    fn test_restore_failure_propagates() {
        let probe = RecordingProbe {
            fail_restore: true,
            ..Default::default()
        };

        let err = run(&probe, 2).unwrap_err();
        assert!(matches!(err, ProbeError::Session(_)));
        // restore is attempted once; the session guard still ends the session
        let calls = probe.calls();
        assert_eq!(calls.iter().filter(|c| **c == Call::Polling(true)).count(), 1);
        assert_eq!(calls.last(), Some(&Call::EndSession));
    }

    #[test]
    fn test_simulated_probe_run() {
        let probe = SimulatedProbe::new(SimulatedProbeConfig {
            read_latency_us: 0,
            ..Default::default()
        });

        let result = Harness::new(&probe, &probe, &probe)
            .run(&run_config(64))
            .unwrap();

        assert_eq!(result.count, 64);
        assert_eq!(probe.reads(), 64);
        assert_eq!(probe.resets(), 1);
        assert_eq!(probe.halts(), 0);
        assert!(!probe.is_session_open());
        assert!(result.wall_span_us >= result.total_us);
    }

    #[test]
    fn test_simulated_probe_bad_address() {
        let probe = SimulatedProbe::new(SimulatedProbeConfig {
            read_latency_us: 0,
            ..Default::default()
        });
        let config = RunConfig {
            address: 0x1000,
            ..run_config(8)
        };

        let err = Harness::new(&probe, &probe, &probe).run(&config).unwrap_err();

        assert!(matches!(err, ProbeError::Access { address: 0x1000, .. }));
        assert!(!probe.is_session_open());
    }
}
