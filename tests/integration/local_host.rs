//! The local transport against the machine running the tests

use pgverify::check::{Check, FileCheck, FileKind, SocketListeningCheck};
use pgverify::host::{CommandHost, Host, Target};
use std::net::TcpListener;
use std::os::unix::fs::PermissionsExt;
use std::process::Command;
use std::time::Duration;

fn local() -> CommandHost {
    CommandHost::new(Target::Local, Duration::from_secs(5)).expect("local host")
}

fn id(flag: &str) -> String {
    let output = Command::new("id").arg(flag).output().expect("run id");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn file_check_reads_real_ownership_and_mode() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("pg-backup.sh");
    std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o700)).unwrap();

    let (user, group) = (id("-un"), id("-gn"));
    let owner = (user.as_str(), group.as_str());
    let path = script.to_string_lossy();
    let host = local();

    let check = FileCheck::new("script", &path, FileKind::File, owner, 0o700);
    check.run(&host).unwrap();

    let wrong_mode = FileCheck::new("script", &path, FileKind::File, owner, 0o644);
    let err = wrong_mode.run(&host).unwrap_err();
    assert!(err.to_string().contains("0700"), "{err}");
}

#[test]
fn file_check_on_missing_path_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.timer");
    let check = FileCheck::new(
        "timer",
        &path.to_string_lossy(),
        FileKind::File,
        ("root", "root"),
        0o644,
    );
    let err = check.run(&local()).unwrap_err();
    assert_eq!(err.to_string(), format!("file {} not found", path.display()));
}

#[test]
fn slow_command_is_killed_at_the_timeout() {
    let host = CommandHost::new(Target::Local, Duration::from_millis(200)).unwrap();
    let output = host.run("sleep 10").unwrap();
    assert!(output.timed_out);
    assert!(output.exit_code.is_none());
}

#[test]
fn listening_socket_is_detected() {
    if which::which("ss").is_err() {
        eprintln!("skipping: ss is not installed");
        return;
    }
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("tcp://127.0.0.1:{port}");

    SocketListeningCheck::new("listening", &address)
        .run(&local())
        .unwrap();

    drop(listener);
    let info = local().socket(&address).unwrap();
    assert!(!info.is_listening);
}
