//! Host connections
//!
//! A [`Host`] is the only way checks touch the target machine. It exposes
//! three read-only probes:
//!
//! - `run`: execute a shell command and capture exit code, stdout and stderr
//! - `file`: stat a path (existence, type, owner, group, permission bits)
//! - `socket`: whether an address is listening
//!
//! Command failures are data, not errors: a non-zero exit code comes back in
//! [`CommandOutput`] and the caller decides what it means. `Err` is reserved
//! for problems with the probe itself, and [`HostError::Connection`] for an
//! unreachable target.
//!
//! # Transports
//!
//! [`CommandHost`] carries commands to the target selected by a [`Target`]:
//! the local shell, `ssh`, or `docker exec`. Every command is bounded by a
//! timeout and killed when it exceeds it.

mod executor;
mod probe;
mod scripted;
mod transport;

pub use executor::{run_with_timeout, CommandOutput, DEFAULT_COMMAND_TIMEOUT};
pub use probe::{socket_state, stat_file, FileInfo, SocketAddress, SocketInfo};
pub use scripted::ScriptedHost;
pub use transport::{CommandHost, Target};

pub(crate) use probe::quote;

use crate::error::HostError;

/// A connection to the machine under verification.
///
/// Implementations must be safe to share between worker threads; each
/// `run` call is expected to be an independent process or session.
pub trait Host: Send + Sync {
    /// Human-readable name of the target, used in reports and errors
    fn describe(&self) -> String;

    /// Run a shell command on the target
    fn run(&self, command: &str) -> Result<CommandOutput, HostError>;

    /// Confirm the target is reachable before any check runs
    fn ping(&self) -> Result<(), HostError> {
        let output = self.run("true")?;
        if output.success() {
            Ok(())
        } else {
            Err(HostError::Connection {
                target: self.describe(),
                reason: output.summary(),
            })
        }
    }

    fn file(&self, path: &str) -> Result<FileInfo, HostError> {
        stat_file(self, path)
    }

    fn socket(&self, address: &str) -> Result<SocketInfo, HostError> {
        socket_state(self, address)
    }
}
