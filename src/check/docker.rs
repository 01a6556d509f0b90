//! Container and swarm service checks

use tracing::warn;

use super::{run_ok, Check, CheckFailure};
use crate::host::{quote, Host};

fn name_filter(filter: &str) -> String {
    format!("name={filter}")
}

/// Look up the first running container whose name matches `filter`.
///
/// `Ok(None)` means docker answered and nothing matched; callers must turn
/// that into a [`CheckFailure::LookupEmpty`] rather than issue a follow-up
/// command with an empty name.
pub fn find_container(host: &dyn Host, filter: &str) -> Result<Option<String>, CheckFailure> {
    let command = format!(
        "docker ps --filter {} --format '{{{{.Names}}}}'",
        quote(&name_filter(filter))
    );
    let output = run_ok(host, &command)?;

    let mut names = output.stdout_lines();
    let first = names.next().map(str::to_string);
    let others: Vec<&str> = names.collect();
    if let Some(name) = &first {
        if !others.is_empty() {
            warn!(filter, chosen = %name, ignored = ?others, "several containers match filter");
        }
    }
    Ok(first)
}

/// Like [`find_container`], but an empty lookup is a failure
pub(crate) fn require_container(host: &dyn Host, filter: &str) -> Result<String, CheckFailure> {
    find_container(host, filter)?.ok_or_else(|| CheckFailure::LookupEmpty {
        what: "container".to_string(),
        filter: name_filter(filter),
    })
}

/// Asserts a swarm service matching a filter runs its desired replica count
#[derive(Debug, Clone)]
pub struct ServiceReplicasCheck {
    pub name: String,
    pub filter: String,
    /// Replica ratio reported by `docker service ls`, e.g. `1/1`
    pub expected_replicas: String,
}

impl ServiceReplicasCheck {
    pub fn new(name: &str, filter: &str, expected_replicas: &str) -> Self {
        Self {
            name: name.to_string(),
            filter: filter.to_string(),
            expected_replicas: expected_replicas.to_string(),
        }
    }
}

impl Check for ServiceReplicasCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!(
            "service matching {} runs {} replicas",
            self.filter, self.expected_replicas
        )
    }

    fn run(&self, host: &dyn Host) -> Result<(), CheckFailure> {
        let command = format!(
            "docker service ls --filter {} --format '{{{{.Name}}}} {{{{.Replicas}}}}'",
            quote(&name_filter(&self.filter))
        );
        let output = run_ok(host, &command)?;

        // Lines look like "stack_postgres 1/1" or "pg 1/1 (max 1 per node)"
        let services: Vec<(&str, &str)> = output
            .stdout_lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                Some((fields.next()?, fields.next()?))
            })
            .filter(|(name, _)| name.contains(self.filter.as_str()))
            .collect();

        if services.is_empty() {
            return Err(CheckFailure::LookupEmpty {
                what: "service".to_string(),
                filter: name_filter(&self.filter),
            });
        }

        if services
            .iter()
            .any(|(_, replicas)| *replicas == self.expected_replicas)
        {
            return Ok(());
        }

        let actual = services
            .iter()
            .map(|(name, replicas)| format!("{name} {replicas}"))
            .collect::<Vec<_>>()
            .join(", ");
        Err(CheckFailure::assertion(
            format!("service {}", self.filter),
            format!("{} replicas", self.expected_replicas),
            actual,
        ))
    }
}

/// Asserts the container matching a filter reports a `healthy` health status
#[derive(Debug, Clone)]
pub struct ContainerHealthCheck {
    pub name: String,
    pub filter: String,
}

impl ContainerHealthCheck {
    pub fn new(name: &str, filter: &str) -> Self {
        Self {
            name: name.to_string(),
            filter: filter.to_string(),
        }
    }
}

impl Check for ContainerHealthCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("container matching {} is healthy", self.filter)
    }

    fn run(&self, host: &dyn Host) -> Result<(), CheckFailure> {
        let container = require_container(host, &self.filter)?;
        let command = format!(
            "docker inspect --format '{{{{.State.Health.Status}}}}' {}",
            quote(&container)
        );
        let output = run_ok(host, &command)?;

        match output.stdout_trimmed() {
            "healthy" => Ok(()),
            "" => Err(CheckFailure::assertion(
                format!("container {container}"),
                "healthy",
                "no health status",
            )),
            status => Err(CheckFailure::assertion(
                format!("container {container}"),
                "healthy",
                status,
            )),
        }
    }
}
