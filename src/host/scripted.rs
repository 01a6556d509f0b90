//! A host that answers probes from canned responses
//!
//! Used to exercise checks and the harness without a provisioned machine.
//! Responses are matched by substring in registration order; commands that
//! match nothing behave like a missing binary (exit 127).

use std::sync::{Mutex, PoisonError};

use super::executor::CommandOutput;
use super::probe::{exists_command, socket_listing_command, stat_command};
use super::Host;
use crate::error::HostError;

#[derive(Debug, Default)]
pub struct ScriptedHost {
    rules: Vec<(String, CommandOutput)>,
    unreachable: bool,
    issued: Mutex<Vec<String>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose every command fails with a connection error
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Answer commands containing `needle` with the given exit code and output
    pub fn respond(mut self, needle: &str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        self.rules.push((
            needle.to_string(),
            CommandOutput::completed(needle, exit_code, stdout, stderr),
        ));
        self
    }

    /// Answer commands containing `needle` as if they had timed out
    pub fn time_out(mut self, needle: &str) -> Self {
        let mut output = CommandOutput::completed(needle, 0, "", "");
        output.exit_code = None;
        output.timed_out = true;
        self.rules.push((needle.to_string(), output));
        self
    }

    /// Make `path` stat as an existing file or directory
    pub fn with_file(self, path: &str, file_type: &str, owner: &str, group: &str, mode: u32) -> Self {
        let line = format!("{file_type}|{owner}|{group}|{mode:o}\n");
        self.respond(&stat_command(path), 0, &line, "")
    }

    /// Make `path` stat as missing
    pub fn without_file(self, path: &str) -> Self {
        let stderr = format!("stat: cannot statx '{path}': No such file or directory\n");
        self.respond(&stat_command(path), 1, "", &stderr)
            .respond(&exists_command(path), 1, "", "")
    }

    /// Register the `ss` listing used to probe `spec`'s socket family
    pub fn with_listening(self, spec: &str, listing: &str) -> Self {
        let command = socket_listing_command(spec).unwrap_or("ss");
        self.respond(command, 0, listing, "")
    }

    /// Every command issued so far, in order
    pub fn issued(&self) -> Vec<String> {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Host for ScriptedHost {
    fn describe(&self) -> String {
        "scripted".to_string()
    }

    fn ping(&self) -> Result<(), HostError> {
        if self.unreachable {
            return Err(HostError::Connection {
                target: self.describe(),
                reason: "no route to host".to_string(),
            });
        }
        Ok(())
    }

    fn run(&self, command: &str) -> Result<CommandOutput, HostError> {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.to_string());

        if self.unreachable {
            return Err(HostError::Connection {
                target: self.describe(),
                reason: "no route to host".to_string(),
            });
        }

        let output = self
            .rules
            .iter()
            .find(|(needle, _)| command.contains(needle.as_str()))
            .map(|(_, output)| CommandOutput {
                command: command.to_string(),
                ..output.clone()
            })
            .unwrap_or_else(|| {
                CommandOutput::completed(command, 127, "", "sh: command not found")
            });
        Ok(output)
    }
}
