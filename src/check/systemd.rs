//! systemd unit state checks

use super::{Check, CheckFailure};
use crate::host::{quote, Host};

/// Asserts `systemctl is-enabled <unit>` reports `enabled`
#[derive(Debug, Clone)]
pub struct UnitEnabledCheck {
    pub name: String,
    pub unit: String,
}

impl UnitEnabledCheck {
    pub fn new(name: &str, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
        }
    }
}

impl Check for UnitEnabledCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("systemd unit {} is enabled", self.unit)
    }

    fn run(&self, host: &dyn Host) -> Result<(), CheckFailure> {
        let command = format!("systemctl is-enabled {}", quote(&self.unit));
        let output = host.run(&command)?;
        let state = output.stdout_trimmed();

        // "enabled-runtime" counts, "disabled" does not
        if output.success() && output.stdout_lines().any(|line| line.starts_with("enabled")) {
            return Ok(());
        }

        if state.is_empty() {
            return Err(CheckFailure::Command {
                command,
                detail: output.summary(),
            });
        }

        Err(CheckFailure::assertion(
            format!("unit {}", self.unit),
            "enabled",
            state,
        ))
    }
}
