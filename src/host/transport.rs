//! Local, ssh and docker command transports

use std::fmt;
use std::process::Command;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use super::executor::{run_with_timeout, CommandOutput};
use super::Host;
use crate::error::HostError;

/// ssh exits with 255 when the connection itself fails
const SSH_TRANSPORT_FAILURE: i32 = 255;

/// `docker exec` exits with 125 when the daemon or container is unavailable
const DOCKER_TRANSPORT_FAILURE: i32 = 125;

/// Where probe commands are executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The machine running pgverify
    Local,
    /// A remote machine reached with `ssh [user@]host`
    Ssh {
        destination: String,
        port: Option<u16>,
    },
    /// A running container reached with `docker exec`
    Docker { container: String },
}

impl Target {
    /// Client binary needed to reach this target
    fn program(&self) -> Option<&'static str> {
        match self {
            Target::Local => None,
            Target::Ssh { .. } => Some("ssh"),
            Target::Docker { .. } => Some("docker"),
        }
    }

    fn is_transport_failure(&self, exit_code: Option<i32>) -> bool {
        match self {
            Target::Local => false,
            Target::Ssh { .. } => exit_code == Some(SSH_TRANSPORT_FAILURE),
            Target::Docker { .. } => exit_code == Some(DOCKER_TRANSPORT_FAILURE),
        }
    }
}

impl FromStr for Target {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || HostError::InvalidTarget(s.to_string());

        if s.is_empty() || s == "local" || s == "local://" {
            return Ok(Target::Local);
        }

        if let Some(rest) = s.strip_prefix("ssh://") {
            let (destination, port) = match rest.rsplit_once(':') {
                Some((dest, port)) => (dest, Some(port.parse::<u16>().map_err(|_| invalid())?)),
                None => (rest, None),
            };
            if destination.is_empty()
                || destination.ends_with('@')
                || destination.contains('/')
                || destination.chars().any(char::is_whitespace)
            {
                return Err(invalid());
            }
            return Ok(Target::Ssh {
                destination: destination.to_string(),
                port,
            });
        }

        if let Some(container) = s.strip_prefix("docker://") {
            if container.is_empty()
                || container.contains('/')
                || container.chars().any(char::is_whitespace)
            {
                return Err(invalid());
            }
            return Ok(Target::Docker {
                container: container.to_string(),
            });
        }

        Err(invalid())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Local => write!(f, "local"),
            Target::Ssh {
                destination,
                port: Some(port),
            } => write!(f, "ssh://{destination}:{port}"),
            Target::Ssh {
                destination,
                port: None,
            } => write!(f, "ssh://{destination}"),
            Target::Docker { container } => write!(f, "docker://{container}"),
        }
    }
}

/// A [`Host`] that runs every probe as a child process
#[derive(Debug, Clone)]
pub struct CommandHost {
    target: Target,
    timeout: Duration,
}

impl CommandHost {
    /// Create a host for `target`.
    ///
    /// Fails with a connection error when the client binary the target
    /// needs (`ssh`, `docker`) is not installed.
    pub fn new(target: Target, timeout: Duration) -> Result<Self, HostError> {
        if let Some(program) = target.program() {
            let path = which::which(program).map_err(|e| HostError::Connection {
                target: target.to_string(),
                reason: format!("`{program}` is not available: {e}"),
            })?;
            debug!(program, path = %path.display(), "resolved transport client");
        }
        Ok(Self { target, timeout })
    }

    /// Wrap a shell command in the transport for this target
    fn build(&self, command: &str) -> Command {
        match &self.target {
            Target::Local => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(command);
                cmd
            }
            Target::Ssh { destination, port } => {
                let mut cmd = Command::new("ssh");
                cmd.args(["-o", "BatchMode=yes", "-o", "ConnectTimeout=10"]);
                if let Some(port) = port {
                    cmd.arg("-p").arg(port.to_string());
                }
                cmd.arg(destination).arg("--").arg(command);
                cmd
            }
            Target::Docker { container } => {
                let mut cmd = Command::new("docker");
                cmd.arg("exec")
                    .arg(container)
                    .arg("sh")
                    .arg("-c")
                    .arg(command);
                cmd
            }
        }
    }
}

impl Host for CommandHost {
    fn describe(&self) -> String {
        self.target.to_string()
    }

    fn run(&self, command: &str) -> Result<CommandOutput, HostError> {
        let output = run_with_timeout(self.build(command), command, self.timeout)?;
        if self.target.is_transport_failure(output.exit_code) {
            return Err(HostError::Connection {
                target: self.describe(),
                reason: output.summary(),
            });
        }
        Ok(output)
    }
}
