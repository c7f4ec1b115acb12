#![cfg(unix)]
//! Drives `SshOpen3` with a stand-in `ssh` that runs the remote command locally.
#[macro_use] extern crate lazy_static;

use std::{fs,
          io::{self, Write},
          os::unix::fs::PermissionsExt,
          path::PathBuf,
          sync::{Mutex, MutexGuard},
          time::{Duration, Instant}};

use tempfile::TempDir;
use zetta_agent::{config::SshConfig,
                  exec::{Executor, Remote, SshOpen3},
                  ErrorKind};

// Last argument is the remote command line.
const FAKE_SSH: &str = "#!/bin/sh\nfor last; do :; done\nexec /bin/sh -c \"$last\"\n";

lazy_static! {
    // Writing an executable while another test forks gives ETXTBSY.
    static ref SERIAL: Mutex<()> = Mutex::new(());
}

fn serial() -> MutexGuard<'static, ()> { SERIAL.lock().unwrap_or_else(|e| e.into_inner()) }

fn fake_ssh_config(prefix: Option<&str>) -> (TempDir, SshConfig) {
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join("ssh");
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(FAKE_SSH.as_bytes()).unwrap();
    drop(file);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

    let config = SshConfig::builder()
        .host("localhost")
        .user("root")
        .command_prefix(prefix.map(String::from))
        .ssh_cmd(path.into_os_string())
        .build()
        .unwrap();
    (dir, config)
}

fn fake_ssh() -> (TempDir, SshOpen3) {
    let (dir, config) = fake_ssh_config(None);
    (dir, SshOpen3::new(config))
}

#[test]
fn test_stdout() {
    let _serial = serial();
    let (_dir, open3) = fake_ssh();
    let output = open3.run("echo tank", Duration::from_secs(10)).unwrap();
    assert_eq!("tank\n", output.stdout);
    assert!(output.stderr.is_empty());
    assert!(output.completed);
}

#[test]
fn test_stderr_with_zero_exit() {
    let _serial = serial();
    let (_dir, open3) = fake_ssh();
    let output = open3.run("echo oops >&2", Duration::from_secs(10)).unwrap();
    assert_eq!("oops\n", output.stderr);
    assert!(output.completed);
}

#[test]
fn test_timeout_kills_command() {
    let _serial = serial();
    let (_dir, open3) = fake_ssh();
    let started = Instant::now();
    let output = open3.run("exec sleep 5", Duration::from_millis(200)).unwrap();
    assert!(!output.completed);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_ssh_failure_is_transport_error() {
    let _serial = serial();
    let (_dir, open3) = fake_ssh();
    let err = open3.run("exit 255", Duration::from_secs(10)).unwrap_err();
    assert_eq!(io::ErrorKind::ConnectionAborted, err.kind());
}

#[test]
fn test_exit_code_reported() {
    let _serial = serial();
    let (_dir, open3) = fake_ssh();
    let output = open3.run("exit 1", Duration::from_secs(10)).unwrap();
    assert!(output.completed);
    assert!(output.stderr.is_empty());
    assert_eq!(Some(1), output.exit_code);
}

#[test]
fn test_silent_failure_is_remote_command_error() {
    let _serial = serial();
    let (_dir, open3) = fake_ssh();
    let remote = Remote::new(open3);
    let err = remote.execute(format_args!("exit 1")).unwrap_err();
    assert_eq!(ErrorKind::RemoteCommand, err.kind());
    assert!(remote.execute(format_args!("true")).is_ok());
}

#[test]
fn test_from_config_applies_prefix() {
    let _serial = serial();
    let (_dir, config) = fake_ssh_config(Some("echo"));
    let remote = Remote::from_config(config);
    assert_eq!("zpool destroy tank", remote.execute(format_args!("zpool destroy tank")).unwrap());
}

#[test]
fn test_remote_classifies_stderr() {
    let _serial = serial();
    let (_dir, open3) = fake_ssh();
    let remote = Remote::new(open3);
    assert_eq!("tank", remote.execute(format_args!("echo tank")).unwrap());

    let err = remote
        .execute(format_args!("echo \"cannot open 'tank/x': dataset does not exist\" >&2"))
        .unwrap_err();
    assert_eq!(ErrorKind::DatasetNotFound, err.kind());

    let err = remote.execute(format_args!("echo \"cannot open 'vault': no such pool\" >&2")).unwrap_err();
    assert_eq!(ErrorKind::PoolNotFound, err.kind());
}

#[test]
fn test_missing_ssh_binary() {
    let _serial = serial();
    let config = SshConfig::builder()
        .host("localhost")
        .user("root")
        .ssh_cmd("/nonexistent/ssh")
        .build()
        .unwrap();
    let remote = Remote::new(SshOpen3::new(config));
    let err = remote.execute(format_args!("true")).unwrap_err();
    assert_eq!(ErrorKind::Transport, err.kind());
}
