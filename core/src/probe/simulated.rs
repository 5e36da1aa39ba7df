//! In-process debug probe
//! Fixed per-read latency, periodic polling stalls, bounded memory image

use super::{AccessMode, ExecutionControl, MemoryReader, SessionControl, VersionInfo};
use crate::error::{ProbeError, ProbeResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Simulated probe settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedProbeConfig {
    /// Whether `connect` finds an environment
    pub reachable: bool,
    pub environment: String,
    pub version: [u32; 3],
    /// Base cost of one read
    pub read_latency_us: u64,
    /// Extra cost paid by every `poll_interval`-th read while polling is on
    pub poll_penalty_us: u64,
    pub poll_interval: u64,
    pub memory_base: u64,
    pub memory_size: u64,
}

impl Default for SimulatedProbeConfig {
    fn default() -> Self {
        Self {
            reachable: true,
            environment: "SimProbe".to_string(),
            version: [9, 21, 341],
            read_latency_us: 50,
            poll_penalty_us: 2_000,
            poll_interval: 16,
            memory_base: 0x7000_0000,
            memory_size: 0x1_0000,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    connected: bool,
    session_open: bool,
    polling_enabled: bool,
    resets: u64,
}

/// Deterministic stand-in for a debug environment.
///
/// Memory holds the low byte of each address, so reads are verifiable.
pub struct SimulatedProbe {
    config: SimulatedProbeConfig,
    state: Mutex<State>,
    reads: AtomicU64,
    halts: AtomicU64,
}

impl SimulatedProbe {
    pub fn new(config: SimulatedProbeConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State::default()),
            reads: AtomicU64::new(0),
            halts: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SimulatedProbeConfig {
        &self.config
    }

    pub fn is_session_open(&self) -> bool {
        self.state.lock().session_open
    }

    pub fn is_polling_enabled(&self) -> bool {
        self.state.lock().polling_enabled
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Reads that stopped the target
    pub fn halts(&self) -> u64 {
        self.halts.load(Ordering::Relaxed)
    }

    pub fn resets(&self) -> u64 {
        self.state.lock().resets
    }

    fn require_session(&self, what: &str) -> ProbeResult<()> {
        if self.state.lock().session_open {
            Ok(())
        } else {
            Err(ProbeError::Session(format!("{what}: no open session")))
        }
    }

    fn cost_of_read(&self, ordinal: u64, polling: bool) -> u64 {
        let mut cost = self.config.read_latency_us;
        if polling && self.config.poll_interval > 0 && ordinal % self.config.poll_interval == 0 {
            cost += self.config.poll_penalty_us;
        }
        cost
    }
}

impl Default for SimulatedProbe {
    fn default() -> Self {
        Self::new(SimulatedProbeConfig::default())
    }
}

impl SessionControl for SimulatedProbe {
    fn connect(&self) -> ProbeResult<()> {
        if !self.config.reachable {
            return Err(ProbeError::Connection(format!(
                "{} is not reachable",
                self.config.environment
            )));
        }

        let mut state = self.state.lock();
        if !state.connected {
            info!("Starting {}", self.config.environment);
        }
        state.connected = true;
        state.session_open = true;
        // A fresh session polls target status until told otherwise
        state.polling_enabled = true;
        Ok(())
    }

    fn environment_version(&self) -> ProbeResult<VersionInfo> {
        if !self.state.lock().connected {
            return Err(ProbeError::Connection("not connected".to_string()));
        }
        let [major, minor, build] = self.config.version;
        Ok(VersionInfo {
            name: self.config.environment.clone(),
            major,
            minor,
            build,
        })
    }

    fn end_session(&self) -> ProbeResult<()> {
        let mut state = self.state.lock();
        if !state.session_open {
            debug!("end_session on closed session ignored");
            return Ok(());
        }
        state.session_open = false;
        state.polling_enabled = false;
        Ok(())
    }
}

impl ExecutionControl for SimulatedProbe {
    fn set_polling_enabled(&self, enabled: bool) -> ProbeResult<()> {
        self.require_session("set_polling_enabled")?;
        self.state.lock().polling_enabled = enabled;
        debug!(enabled, "Target status polling toggled");
        Ok(())
    }

    fn reset(&self) -> ProbeResult<()> {
        self.require_session("reset")?;
        self.state.lock().resets += 1;
        Ok(())
    }
}

impl MemoryReader for SimulatedProbe {
    fn read(
        &self,
        mode: AccessMode,
        channel_id: u32,
        address: u64,
        length: u64,
        unit_size: u32,
    ) -> ProbeResult<Vec<u8>> {
        let polling = {
            let state = self.state.lock();
            if !state.connected || !state.session_open {
                return Err(ProbeError::access(address, "target disconnected"));
            }
            state.polling_enabled
        };

        if channel_id != 0 {
            return Err(ProbeError::access(address, format!("unknown channel {channel_id}")));
        }
        if length == 0 || unit_size == 0 {
            return Err(ProbeError::access(address, "empty access"));
        }

        let bytes = length
            .checked_mul(unit_size as u64)
            .ok_or_else(|| ProbeError::access(address, "access size overflow"))?;
        let end = address
            .checked_add(bytes)
            .ok_or_else(|| ProbeError::access(address, "address overflow"))?;
        let limit = self.config.memory_base.saturating_add(self.config.memory_size);
        if address < self.config.memory_base || end > limit {
            return Err(ProbeError::access(address, "address outside target memory"));
        }

        let ordinal = self.reads.fetch_add(1, Ordering::Relaxed) + 1;
        if mode == AccessMode::Halt {
            self.halts.fetch_add(1, Ordering::Relaxed);
        }

        std::thread::sleep(Duration::from_micros(self.cost_of_read(ordinal, polling)));

        Ok((address..end).map(|a| a as u8).collect())
    }
}
