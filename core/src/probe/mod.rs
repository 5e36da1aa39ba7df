//! Debug-probe collaborator capabilities
//!
//! The benchmark only ever sees `MemoryReader`. Session and execution control
//! are driven by the harness around it.

pub mod simulated;

pub use simulated::{SimulatedProbe, SimulatedProbeConfig};

use crate::error::ProbeResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Memory access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Non-intrusive read, the target keeps running
    #[default]
    Monitor,
    /// Halts the target for the duration of the access
    Halt,
}

/// Version of the attached debug environment (informational only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub name: String,
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}.{}", self.name, self.major, self.minor, self.build)
    }
}

/// Connection and session lifecycle
pub trait SessionControl {
    /// Establish or attach to a debug session.
    fn connect(&self) -> ProbeResult<()>;

    fn environment_version(&self) -> ProbeResult<VersionInfo>;

    /// Release the debug session. Called once at shutdown.
    fn end_session(&self) -> ProbeResult<()>;
}

/// Target execution control
pub trait ExecutionControl {
    /// Toggle background status polling.
    fn set_polling_enabled(&self, enabled: bool) -> ProbeResult<()>;

    /// Reset the target processor to a known state.
    fn reset(&self) -> ProbeResult<()>;
}

/// Blocking target memory access
pub trait MemoryReader {
    fn read(
        &self,
        mode: AccessMode,
        channel_id: u32,
        address: u64,
        length: u64,
        unit_size: u32,
    ) -> ProbeResult<Vec<u8>>;
}
