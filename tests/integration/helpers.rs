//! Shared fixtures for integration tests

use pgverify::config::Config;
use pgverify::harness::Selection;
use pgverify::host::ScriptedHost;
use pgverify::report::{Outcome, Report};

pub const CONTAINER: &str = "postgres.1.k3v9q2";

/// Append the responses of a correctly provisioned host to `host`.
///
/// Rules registered on `host` beforehand take precedence, so a test states
/// only the deviation it cares about.
pub fn provisioned(host: ScriptedHost) -> ScriptedHost {
    host.with_file("/usr/local/bin/pg-backup.sh", "regular file", "root", "root", 0o700)
        .with_file("/var/lib/postgresql/backups", "directory", "root", "root", 0o700)
        .with_file(
            "/etc/systemd/system/postgres-backup.service",
            "regular file",
            "root",
            "root",
            0o644,
        )
        .with_file(
            "/etc/systemd/system/postgres-backup.timer",
            "regular file",
            "root",
            "root",
            0o644,
        )
        .respond("systemctl is-enabled postgres-backup.timer", 0, "enabled\n", "")
        .respond("docker service ls", 0, "postgres 1/1\n", "")
        .respond("docker ps --filter name=postgres", 0, &format!("{CONTAINER}\n"), "")
        .respond("docker inspect", 0, "healthy\n", "")
        .with_listening(
            "tcp://127.0.0.1:5432",
            "LISTEN 0 4096 0.0.0.0:5432 0.0.0.0:*\nLISTEN 0 128 0.0.0.0:22 0.0.0.0:*\n",
        )
        .respond("SELECT datname FROM pg_database", 0, "postgres\ntest_db\ntemplate1\n", "")
        .respond("SELECT usename FROM pg_user", 0, "postgres\napp_user\n", "")
        .respond("SELECT 1", 0, "1\n", "")
}

pub fn run(host: &ScriptedHost) -> Report {
    run_with(host, &Config::default(), &Selection::default())
}

pub fn run_with(host: &ScriptedHost, config: &Config, selection: &Selection) -> Report {
    pgverify::commands::run::verify(host, config, selection).expect("run should complete")
}

/// Names of the failed checks, in report order
pub fn failed(report: &Report) -> Vec<&str> {
    report
        .results
        .iter()
        .filter(|r| !r.passed())
        .map(|r| r.name.as_str())
        .collect()
}

pub fn detail<'a>(report: &'a Report, name: &str) -> &'a str {
    let result = report
        .results
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no result for {name}"));
    match &result.outcome {
        Outcome::Failed { detail, .. } => detail,
        Outcome::Passed => panic!("{name} passed"),
    }
}
