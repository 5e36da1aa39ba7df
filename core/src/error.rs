//! Error types shared by the probe collaborators and the benchmark

use thiserror::Error;

/// Failures raised by the debug-probe collaborators.
///
/// Nothing in the crate recovers from these locally; they abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The debug environment could not be reached or launched.
    #[error("connection error: {0}")]
    Connection(String),

    /// Session establishment or teardown failed.
    #[error("session error: {0}")]
    Session(String),

    /// A single memory read failed.
    #[error("access error at {address:#010x}: {reason}")]
    Access { address: u64, reason: String },
}

impl ProbeError {
    pub fn access(address: u64, reason: impl Into<String>) -> Self {
        Self::Access {
            address,
            reason: reason.into(),
        }
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;
