//! Checks: independent, read-only verification units
//!
//! Each check receives the [`Host`] explicitly and either passes or returns a
//! [`CheckFailure`] describing what was expected and what was found. Checks
//! keep no state between runs and never depend on another check having run.

mod docker;
mod files;
mod postgres;
mod socket;
mod systemd;


pub use docker::{find_container, ContainerHealthCheck, ServiceReplicasCheck};
pub use files::{FileCheck, FileKind};
pub use postgres::{DatabaseExistsCheck, Psql, RoleCanConnectCheck, RoleExistsCheck};
pub use socket::SocketListeningCheck;
pub use systemd::UnitEnabledCheck;

use serde::Serialize;
use thiserror::Error;

use crate::error::HostError;
use crate::host::{CommandOutput, Host};

/// A single named verification
pub trait Check: Send + Sync {
    /// Stable identifier used for selection and in reports
    fn name(&self) -> &str;

    /// One-line description of what is verified
    fn description(&self) -> String;

    fn run(&self, host: &dyn Host) -> Result<(), CheckFailure>;
}

/// Why a check did not pass
#[derive(Debug, Error)]
pub enum CheckFailure {
    /// The probed value differs from the expected one
    #[error("{subject}: expected {expected}, found {actual}")]
    Assertion {
        subject: String,
        expected: String,
        actual: String,
    },

    /// A named object that must exist does not
    #[error("{subject} not found")]
    NotFound { subject: String },

    /// A dynamic lookup returned nothing, so dependent probes were skipped
    #[error("no {what} found matching filter {filter}")]
    LookupEmpty { what: String, filter: String },

    /// A probe command whose output the check needs did not succeed
    #[error("`{command}` failed: {detail}")]
    Command { command: String, detail: String },

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("check panicked: {0}")]
    Panicked(String),
}

/// Coarse failure category carried into reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Assertion,
    NotFound,
    LookupEmpty,
    Command,
    Host,
    Panicked,
}

impl CheckFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            CheckFailure::Assertion { .. } => FailureKind::Assertion,
            CheckFailure::NotFound { .. } => FailureKind::NotFound,
            CheckFailure::LookupEmpty { .. } => FailureKind::LookupEmpty,
            CheckFailure::Command { .. } => FailureKind::Command,
            CheckFailure::Host(_) => FailureKind::Host,
            CheckFailure::Panicked(_) => FailureKind::Panicked,
        }
    }

    /// The underlying connection error, if the host went away mid-check
    pub fn into_connection_error(self) -> Result<HostError, Self> {
        match self {
            CheckFailure::Host(err) if err.is_connection() => Ok(err),
            other => Err(other),
        }
    }

    pub(crate) fn assertion(
        subject: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        CheckFailure::Assertion {
            subject: subject.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Run `command` and require it to exit 0
pub(crate) fn run_ok(host: &dyn Host, command: &str) -> Result<CommandOutput, CheckFailure> {
    let output = host.run(command)?;
    if output.success() {
        Ok(output)
    } else {
        Err(CheckFailure::Command {
            command: command.to_string(),
            detail: output.summary(),
        })
    }
}
