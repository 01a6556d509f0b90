//! Error types shared across the harness

use std::path::PathBuf;
use thiserror::Error;

/// Failures talking to the target host.
///
/// Only `Connection` is fatal for a run. Every other variant is scoped to the
/// single probe that produced it and ends up as a failed check.
#[derive(Debug, Error)]
pub enum HostError {
    /// The target could not be reached at all
    #[error("cannot reach {target}: {reason}")]
    Connection { target: String, reason: String },

    /// The local process that carries the command could not be started
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on a spawned command failed
    #[error("failed to wait for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A probe command did not finish inside the configured timeout
    #[error("`{command}` timed out after {secs}s")]
    TimedOut { command: String, secs: u64 },

    /// A probe command ran but its output could not be interpreted
    #[error("unexpected output from `{command}`: {detail}")]
    UnexpectedOutput { command: String, detail: String },

    #[error("invalid socket address `{0}` (expected tcp://host:port, udp://host:port or unix:///path)")]
    InvalidSocket(String),

    #[error("invalid target `{0}` (expected local, ssh://[user@]host[:port] or docker://container)")]
    InvalidTarget(String),
}

impl HostError {
    /// Whether this error means the whole host is unreachable
    pub fn is_connection(&self) -> bool {
        matches!(self, HostError::Connection { .. })
    }
}

/// Failures loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failures that stop a harness run before a report can be produced
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("target unreachable: {0}")]
    Unreachable(#[source] HostError),

    #[error("unknown check `{name}` (run `pgverify list` to see available checks)")]
    UnknownCheck { name: String },

    #[error("no checks selected")]
    NothingSelected,

    #[error("check worker thread terminated unexpectedly")]
    WorkerLost,
}
