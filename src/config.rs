//! Connection settings for [`SshOpen3`](../exec/struct.SshOpen3.html).
//!
//! Build one with [`SshConfigBuilder`](struct.SshConfigBuilder.html) or pick it up from the
//! environment with [`SshConfig::from_env`](struct.SshConfig.html#method.from_env):
//!
//! | variable                      | field            |
//! |-------------------------------|------------------|
//! | `ZFS_PROVIDER_HOSTNAME`       | `host`           |
//! | `ZFS_PROVIDER_USERNAME`       | `user`           |
//! | `ZFS_PROVIDER_PORT`           | `port`           |
//! | `ZFS_PROVIDER_KEY_PATH`       | `key_path`       |
//! | `ZFS_PROVIDER_COMMAND_PREFIX` | `command_prefix` |
//! | `ZFS_PROVIDER_SSH_CMD`        | `ssh_cmd`        |
use std::{env, ffi::OsString, path::PathBuf};

use crate::{Error, Result};

#[derive(Debug, Clone, Builder, Getters, PartialEq)]
#[builder(setter(into))]
#[get = "pub"]
pub struct SshConfig {
    host:           String,
    user:           String,
    #[builder(default = "22")]
    port:           u16,
    /// Identity file handed to `ssh -i`. Without it ssh falls back to agent and default keys.
    #[builder(default)]
    key_path:       Option<PathBuf>,
    /// Prepended to every remote command, `sudo` for example.
    #[builder(default)]
    command_prefix: Option<String>,
    /// Local ssh binary.
    #[builder(default = "OsString::from(\"ssh\")")]
    ssh_cmd:        OsString,
}

impl SshConfig {
    pub fn builder() -> SshConfigBuilder { SshConfigBuilder::default() }

    /// Read settings from `ZFS_PROVIDER_*` environment variables.
    pub fn from_env() -> Result<SshConfig> {
        SshConfig::from_lookup(|key| env::var_os(key))
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<SshConfig>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let string = |key: &str| -> Result<Option<String>> {
            match lookup(key) {
                None => Ok(None),
                Some(value) => value
                    .into_string()
                    .map(|s| if s.is_empty() { None } else { Some(s) })
                    .map_err(|_| Error::InvalidConfig(format!("{} is not valid unicode", key))),
            }
        };

        let host = string("ZFS_PROVIDER_HOSTNAME")?
            .ok_or_else(|| Error::InvalidConfig(String::from("ZFS_PROVIDER_HOSTNAME is not set")))?;
        let user = string("ZFS_PROVIDER_USERNAME")?
            .ok_or_else(|| Error::InvalidConfig(String::from("ZFS_PROVIDER_USERNAME is not set")))?;

        let mut builder = SshConfigBuilder::default();
        builder.host(host).user(user);
        if let Some(port) = string("ZFS_PROVIDER_PORT")? {
            let port = port.parse::<u16>().map_err(|e| {
                Error::InvalidConfig(format!("ZFS_PROVIDER_PORT {:?} is not a port: {}", port, e))
            })?;
            builder.port(port);
        }
        if let Some(key_path) = lookup("ZFS_PROVIDER_KEY_PATH").filter(|v| !v.is_empty()) {
            builder.key_path(Some(PathBuf::from(key_path)));
        }
        builder.command_prefix(string("ZFS_PROVIDER_COMMAND_PREFIX")?);
        if let Some(ssh_cmd) = lookup("ZFS_PROVIDER_SSH_CMD").filter(|v| !v.is_empty()) {
            builder.ssh_cmd(ssh_cmd);
        }
        builder.build().map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;
    use crate::ErrorKind;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> =
            pairs.iter().map(|(k, v)| (k.to_string(), OsString::from(v))).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SshConfig::builder().host("nas.local").user("root").build().unwrap();
        assert_eq!(&22, config.port());
        assert_eq!(&OsString::from("ssh"), config.ssh_cmd());
        assert!(config.key_path().is_none());
        assert!(config.command_prefix().is_none());
    }

    #[test]
    fn test_builder_missing_host() {
        assert!(SshConfig::builder().user("root").build().is_err());
    }

    #[test]
    fn test_from_lookup_full() {
        let config = SshConfig::from_lookup(lookup(&[
            ("ZFS_PROVIDER_HOSTNAME", "nas.local"),
            ("ZFS_PROVIDER_USERNAME", "admin"),
            ("ZFS_PROVIDER_PORT", "2222"),
            ("ZFS_PROVIDER_KEY_PATH", "/home/admin/.ssh/id_ed25519"),
            ("ZFS_PROVIDER_COMMAND_PREFIX", "sudo"),
            ("ZFS_PROVIDER_SSH_CMD", "/usr/local/bin/ssh"),
        ]))
        .unwrap();

        assert_eq!("nas.local", config.host());
        assert_eq!("admin", config.user());
        assert_eq!(&2222, config.port());
        assert_eq!(&Some(PathBuf::from("/home/admin/.ssh/id_ed25519")), config.key_path());
        assert_eq!(&Some(String::from("sudo")), config.command_prefix());
        assert_eq!(&OsString::from("/usr/local/bin/ssh"), config.ssh_cmd());
    }

    #[test]
    fn test_from_lookup_missing_user() {
        let err =
            SshConfig::from_lookup(lookup(&[("ZFS_PROVIDER_HOSTNAME", "nas.local")])).unwrap_err();
        assert_eq!(ErrorKind::InvalidConfig, err.kind());
    }

    #[test]
    fn test_from_lookup_bad_port() {
        let err = SshConfig::from_lookup(lookup(&[
            ("ZFS_PROVIDER_HOSTNAME", "nas.local"),
            ("ZFS_PROVIDER_USERNAME", "admin"),
            ("ZFS_PROVIDER_PORT", "ssh"),
        ]))
        .unwrap_err();
        assert_eq!(ErrorKind::InvalidConfig, err.kind());
    }

    #[test]
    fn test_empty_prefix_is_none() {
        let config = SshConfig::from_lookup(lookup(&[
            ("ZFS_PROVIDER_HOSTNAME", "nas.local"),
            ("ZFS_PROVIDER_USERNAME", "admin"),
            ("ZFS_PROVIDER_COMMAND_PREFIX", ""),
        ]))
        .unwrap();
        assert!(config.command_prefix().is_none());
    }
}
