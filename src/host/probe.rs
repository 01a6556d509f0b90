//! File and socket inspection built on top of `Host::run`
//!
//! Both probes go through the command channel instead of the local
//! filesystem, so a local, ssh and docker target are all inspected the same
//! way.

use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use super::Host;
use crate::error::HostError;

/// Metadata for a path on the target host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub exists: bool,
    pub is_file: bool,
    pub is_directory: bool,
    pub owner: Option<String>,
    pub group: Option<String>,
    /// Permission bits, e.g. `0o700`
    pub mode: Option<u32>,
}

impl FileInfo {
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            exists: false,
            is_file: false,
            is_directory: false,
            owner: None,
            group: None,
            mode: None,
        }
    }

    /// Parse a line of `stat -c '%F|%U|%G|%a'` output
    fn from_stat_line(path: &str, line: &str) -> Option<Self> {
        let mut parts = line.trim().splitn(4, '|');
        let file_type = parts.next()?;
        let owner = parts.next()?;
        let group = parts.next()?;
        let mode = u32::from_str_radix(parts.next()?.trim(), 8).ok()?;

        Some(Self {
            path: path.to_string(),
            exists: true,
            // GNU stat reports "regular empty file" for zero-length files
            is_file: file_type.starts_with("regular"),
            is_directory: file_type == "directory",
            owner: Some(owner.to_string()),
            group: Some(group.to_string()),
            mode: Some(mode),
        })
    }
}

/// The shell command used to stat `path`
pub(crate) fn stat_command(path: &str) -> String {
    format!("stat -L -c '%F|%U|%G|%a' -- {}", quote(path))
}

pub(crate) fn exists_command(path: &str) -> String {
    format!("test -e {}", quote(path))
}

pub(crate) fn quote(value: &str) -> Cow<'_, str> {
    shell_escape::unix::escape(Cow::Borrowed(value))
}

/// Stat a path on the host.
///
/// A failing `stat` is disambiguated with `test -e`, so a missing path is
/// reported as `exists: false` while a permission problem stays an error.
pub fn stat_file<H: Host + ?Sized>(host: &H, path: &str) -> Result<FileInfo, HostError> {
    let command = stat_command(path);
    let output = host.run(&command)?;
    if output.timed_out {
        return Err(HostError::TimedOut {
            command,
            secs: output.duration.as_secs(),
        });
    }

    if output.success() {
        return FileInfo::from_stat_line(path, output.stdout_trimmed()).ok_or_else(|| {
            HostError::UnexpectedOutput {
                command,
                detail: output.stdout_trimmed().to_string(),
            }
        });
    }

    let exists = host.run(&exists_command(path))?;
    match exists.exit_code {
        Some(1) => Ok(FileInfo::missing(path)),
        _ => Err(HostError::UnexpectedOutput {
            command,
            detail: output.summary(),
        }),
    }
}

/// A socket specification such as `tcp://127.0.0.1:5432`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketAddress {
    Tcp { host: String, port: u16 },
    Udp { host: String, port: u16 },
    Unix { path: String },
}

static INET_SOCKET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(tcp|udp)://(\[[0-9A-Fa-f:.]+\]|[^:/\s\[\]]+):(\d{1,5})$")
        .expect("Invalid socket regex pattern")
});

impl SocketAddress {
    pub fn parse(spec: &str) -> Result<Self, HostError> {
        let invalid = || HostError::InvalidSocket(spec.to_string());

        if let Some(path) = spec.strip_prefix("unix://") {
            if path.starts_with('/') && path.len() > 1 {
                return Ok(Self::Unix {
                    path: path.to_string(),
                });
            }
            return Err(invalid());
        }

        let caps = INET_SOCKET.captures(spec).ok_or_else(invalid)?;
        let host = caps[2].to_string();
        let port: u16 = caps[3].parse().map_err(|_| invalid())?;
        match &caps[1] {
            "tcp" => Ok(Self::Tcp { host, port }),
            _ => Ok(Self::Udp { host, port }),
        }
    }

    /// `ss` invocation listing listening sockets of this family
    fn listing_command(&self) -> &'static str {
        match self {
            Self::Tcp { .. } => "ss -H -l -n -t",
            Self::Udp { .. } => "ss -H -l -n -u",
            Self::Unix { .. } => "ss -H -l -n -x",
        }
    }

    /// Whether a line of `ss` output shows this address listening
    fn matches_listing(&self, line: &str) -> bool {
        match self {
            Self::Unix { path } => line.split_whitespace().any(|token| token == path),
            Self::Tcp { host, port } | Self::Udp { host, port } => {
                let Some((local_host, local_port)) = local_endpoint(line) else {
                    return false;
                };
                local_port == *port && host_matches(host, local_host)
            }
        }
    }
}

impl fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
            Self::Udp { host, port } => write!(f, "udp://{host}:{port}"),
            Self::Unix { path } => write!(f, "unix://{path}"),
        }
    }
}

/// First `host:port` token with a numeric port; peers print as `*:*` or
/// `0.0.0.0:*` so the local endpoint always comes first.
fn local_endpoint(line: &str) -> Option<(&str, u16)> {
    line.split_whitespace().find_map(|token| {
        let (host, port) = token.rsplit_once(':')?;
        let port = port.parse().ok()?;
        // Strip interface scope, e.g. 127.0.0.53%lo
        let host = host.split('%').next().unwrap_or(host);
        Some((host, port))
    })
}

/// Any wildcard bind accepts any wanted address; a dual-stack `[::]`
/// socket also serves IPv4 clients.
fn host_matches(wanted: &str, bound: &str) -> bool {
    wanted == bound || matches!(bound, "*" | "0.0.0.0" | "[::]")
}

/// Listening state of a socket on the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocketInfo {
    pub address: String,
    pub is_listening: bool,
}

pub fn socket_state<H: Host + ?Sized>(host: &H, spec: &str) -> Result<SocketInfo, HostError> {
    let address = SocketAddress::parse(spec)?;
    let command = address.listing_command();
    let output = host.run(command)?;

    if output.timed_out {
        return Err(HostError::TimedOut {
            command: command.to_string(),
            secs: output.duration.as_secs(),
        });
    }
    if !output.success() {
        return Err(HostError::UnexpectedOutput {
            command: command.to_string(),
            detail: output.summary(),
        });
    }

    Ok(SocketInfo {
        address: address.to_string(),
        is_listening: output.stdout.lines().any(|l| address.matches_listing(l)),
    })
}

/// `ss` listing command for a socket spec, used by the scripted host
pub(crate) fn socket_listing_command(spec: &str) -> Result<&'static str, HostError> {
    Ok(SocketAddress::parse(spec)?.listing_command())
}
