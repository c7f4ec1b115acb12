use std::{env, ffi::OsString, path::PathBuf};

use zetta_agent::{config::SshConfig, ErrorKind};

const VARS: [&str; 6] = [
    "ZFS_PROVIDER_HOSTNAME",
    "ZFS_PROVIDER_USERNAME",
    "ZFS_PROVIDER_PORT",
    "ZFS_PROVIDER_KEY_PATH",
    "ZFS_PROVIDER_COMMAND_PREFIX",
    "ZFS_PROVIDER_SSH_CMD",
];

fn clear() {
    for var in VARS.iter() {
        env::remove_var(var);
    }
}

// Environment is process wide, so everything lives in one test.
#[test]
fn test_from_env() {
    clear();
    assert_eq!(ErrorKind::InvalidConfig, SshConfig::from_env().unwrap_err().kind());

    env::set_var("ZFS_PROVIDER_HOSTNAME", "nas.local");
    let err = SshConfig::from_env().unwrap_err();
    assert_eq!(ErrorKind::InvalidConfig, err.kind());
    assert!(err.to_string().contains("ZFS_PROVIDER_USERNAME"));

    env::set_var("ZFS_PROVIDER_USERNAME", "admin");
    env::set_var("ZFS_PROVIDER_COMMAND_PREFIX", "");
    let config = SshConfig::from_env().unwrap();
    assert_eq!("nas.local", config.host());
    assert_eq!("admin", config.user());
    assert_eq!(&22, config.port());
    assert_eq!(&None, config.command_prefix());

    env::set_var("ZFS_PROVIDER_PORT", "2222");
    env::set_var("ZFS_PROVIDER_KEY_PATH", "/root/.ssh/id_ed25519");
    env::set_var("ZFS_PROVIDER_COMMAND_PREFIX", "sudo");
    env::set_var("ZFS_PROVIDER_SSH_CMD", "/opt/bin/ssh");
    let config = SshConfig::from_env().unwrap();
    assert_eq!(&2222, config.port());
    assert_eq!(&Some(PathBuf::from("/root/.ssh/id_ed25519")), config.key_path());
    assert_eq!(&Some(String::from("sudo")), config.command_prefix());
    assert_eq!(&OsString::from("/opt/bin/ssh"), config.ssh_cmd());

    env::set_var("ZFS_PROVIDER_PORT", "ssh");
    assert_eq!(ErrorKind::InvalidConfig, SshConfig::from_env().unwrap_err().kind());
    clear();
}
