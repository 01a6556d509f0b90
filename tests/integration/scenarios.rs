//! The check battery against scripted hosts

use pgverify::check::FailureKind;
use pgverify::config::Config;
use pgverify::error::HarnessError;
use pgverify::harness::Selection;
use pgverify::host::ScriptedHost;
use pgverify::report::{Outcome, EXIT_FAILED, EXIT_PASSED};

use super::helpers::{detail, failed, provisioned, run, run_with, CONTAINER};

#[test]
fn healthy_host_passes_every_check() {
    let host = provisioned(ScriptedHost::new());
    let report = run(&host);

    assert!(report.passed, "{}", report.render_text());
    assert_eq!(report.exit_code(), EXIT_PASSED);
    let names: Vec<_> = report.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "backup-script",
            "backup-directory",
            "backup-service-unit",
            "backup-timer-unit",
            "backup-timer-enabled",
            "postgres-service-replicas",
            "postgres-container-healthy",
            "postgres-listening",
            "database-exists",
            "role-exists",
            "role-can-connect",
        ]
    );
}

#[test]
fn missing_backup_script_names_the_path() {
    let host = provisioned(ScriptedHost::new().without_file("/usr/local/bin/pg-backup.sh"));
    let report = run(&host);

    assert_eq!(failed(&report), vec!["backup-script"]);
    assert!(detail(&report, "backup-script").contains("/usr/local/bin/pg-backup.sh"));
    assert_eq!(report.exit_code(), EXIT_FAILED);
}

#[test]
fn world_readable_backup_directory_fails() {
    let host = provisioned(ScriptedHost::new().with_file(
        "/var/lib/postgresql/backups",
        "directory",
        "root",
        "root",
        0o755,
    ));
    let report = run(&host);

    assert_eq!(failed(&report), vec!["backup-directory"]);
    assert_eq!(
        detail(&report, "backup-directory"),
        "/var/lib/postgresql/backups: expected root:root 0700, found root:root 0755"
    );
}

#[test]
fn disabled_timer_fails() {
    let host = provisioned(ScriptedHost::new().respond(
        "systemctl is-enabled postgres-backup.timer",
        0,
        "disabled\n",
        "",
    ));
    let report = run(&host);

    assert_eq!(failed(&report), vec!["backup-timer-enabled"]);
}

#[test]
fn missing_role_is_reported_by_name() {
    let host = provisioned(ScriptedHost::new().respond(
        "SELECT usename FROM pg_user",
        0,
        "postgres\n",
        "",
    ));
    let report = run(&host);

    assert_eq!(failed(&report), vec!["role-exists"]);
    assert!(detail(&report, "role-exists").contains("app_user not found"));
}

#[test]
fn empty_container_lookup_fails_dependents_without_follow_up_commands() {
    let host = provisioned(ScriptedHost::new().respond("docker ps", 0, "", ""));
    let report = run(&host);

    let dependents = [
        "postgres-container-healthy",
        "database-exists",
        "role-exists",
        "role-can-connect",
    ];
    assert_eq!(failed(&report), dependents.to_vec());
    for name in dependents {
        let result = report.results.iter().find(|r| r.name == name).unwrap();
        assert!(
            matches!(
                &result.outcome,
                Outcome::Failed { kind: FailureKind::LookupEmpty, detail }
                    if detail == "no container found matching filter name=postgres"
            ),
            "{name}: {:?}",
            result.outcome
        );
    }

    let issued = host.issued();
    assert!(!issued.iter().any(|c| c.starts_with("docker inspect")));
    assert!(!issued.iter().any(|c| c.starts_with("docker exec")));
}

#[test]
fn unhealthy_container_is_reported_with_its_name() {
    let host = provisioned(ScriptedHost::new().respond("docker inspect", 0, "unhealthy\n", ""));
    let report = run(&host);

    assert_eq!(failed(&report), vec!["postgres-container-healthy"]);
    assert_eq!(
        detail(&report, "postgres-container-healthy"),
        format!("container {CONTAINER}: expected healthy, found unhealthy")
    );
}

#[test]
fn degraded_service_fails_replica_check() {
    let host = provisioned(ScriptedHost::new().respond("docker service ls", 0, "postgres 0/1\n", ""));
    let report = run(&host);

    assert_eq!(failed(&report), vec!["postgres-service-replicas"]);
}

#[test]
fn closed_port_fails_and_exits_nonzero() {
    let host = provisioned(
        ScriptedHost::new().with_listening("tcp://127.0.0.1:5432", "LISTEN 0 128 0.0.0.0:22 0.0.0.0:*\n"),
    );
    let report = run(&host);

    assert_eq!(failed(&report), vec!["postgres-listening"]);
    assert_ne!(report.exit_code(), EXIT_PASSED);
}

#[test]
fn timed_out_probe_fails_only_its_check() {
    let host = provisioned(ScriptedHost::new().time_out("docker service ls"));
    let report = run(&host);

    assert_eq!(failed(&report), vec!["postgres-service-replicas"]);
    assert!(detail(&report, "postgres-service-replicas").contains("timed out"));
}

#[test]
fn unreachable_host_aborts_the_run() {
    let host = ScriptedHost::unreachable();
    let err = pgverify::commands::run::verify(&host, &Config::default(), &Selection::default())
        .unwrap_err();
    assert!(matches!(err, HarnessError::Unreachable(_)));
}

#[test]
fn selection_runs_only_named_checks() {
    let host = provisioned(ScriptedHost::new());
    let selection = Selection {
        only: vec!["backup-script".into(), "backup-timer-enabled".into()],
        skip: Vec::new(),
    };
    let report = run_with(&host, &Config::default(), &selection);

    assert_eq!(report.results.len(), 2);
    assert!(host.issued().iter().all(|c| !c.contains("docker")));
}

#[test]
fn custom_config_changes_probed_values() {
    let mut config = Config::default();
    config.postgres.role = "reporting".into();
    let host = provisioned(ScriptedHost::new());
    let report = run_with(&host, &config, &Selection::default());

    assert_eq!(failed(&report), vec!["role-exists"]);
    assert!(detail(&report, "role-exists").contains("reporting not found"));
}

#[test]
fn password_is_passed_to_psql_but_not_reported() {
    let mut config = Config::default();
    config.postgres.password = Some("hunter2".into());
    let host = provisioned(ScriptedHost::new().respond(
        "SELECT 1",
        2,
        "",
        "psql: error: FATAL:  password authentication failed for user \"app_user\"",
    ));
    let report = run_with(&host, &config, &Selection::default());

    assert_eq!(failed(&report), vec!["role-can-connect"]);
    assert!(host.issued().iter().any(|c| c.contains("PGPASSWORD=hunter2")));
    assert!(!report.to_json().unwrap().contains("hunter2"));
}

#[test]
fn parallel_and_repeated_runs_agree() {
    let host = provisioned(ScriptedHost::new().without_file("/usr/local/bin/pg-backup.sh"));
    let mut config = Config::default();

    let first = run_with(&host, &config, &Selection::default());
    let second = run_with(&host, &config, &Selection::default());
    config.jobs = 4;
    let parallel = run_with(&host, &config, &Selection::default());

    assert_eq!(first.outcomes(), second.outcomes());
    assert_eq!(first.outcomes(), parallel.outcomes());
}

#[test]
fn json_report_lists_every_check() {
    let host = provisioned(ScriptedHost::new().respond("docker inspect", 0, "starting\n", ""));
    let report = run(&host);
    let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(value["target"], "scripted");
    assert_eq!(value["passed"], false);
    let results = value["results"].as_array().unwrap();
    assert_eq!(results.len(), 11);
    let failed: Vec<_> = results
        .iter()
        .filter(|r| r["status"] == "failed")
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(failed, vec!["postgres-container-healthy"]);
}
