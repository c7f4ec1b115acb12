//! Command channel to the remote host.
//!
//! [`Remote`](struct.Remote.html) is what the rest of the crate talks to. It owns an
//! [`Executor`](trait.Executor.html), which is the only thing that knows how bytes get to the
//! other side. [`SshOpen3`](struct.SshOpen3.html) is the one shipped with the crate.
//!
//! Arguments are never quoted here. Anything user supplied must go through
//! [`quote`](../utils/fn.quote.html) before it is formatted into a command line.
use std::{fmt, io, time::Duration};

use slog::Logger;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{config::SshConfig,
            log::{self, GlobalLogger},
            parsers::parse_rows,
            utils::strip_newline,
            Error, Result};

pub mod open3;
pub use open3::SshOpen3;

#[cfg(test)]
pub(crate) mod scripted;

/// Every remote command gets exactly this long.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// What came back from one command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutput {
    pub stdout:    String,
    pub stderr:    String,
    /// `false` if the command was still running when the timeout hit.
    pub completed: bool,
    /// `None` when the command was killed or the executor can't tell.
    pub exit_code: Option<i32>,
}

/// Runs one shell command line on the remote host.
pub trait Executor {
    /// Run `command` and wait at most `timeout`. `Err` means the command couldn't be delivered
    /// at all.
    fn run(&self, command: &str, timeout: Duration) -> io::Result<RunOutput>;
}

/// Which CLI a command or property belongs to.
#[derive(AsRefStr, EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseCommand {
    #[strum(serialize = "zfs")]
    Zfs,
    #[strum(serialize = "zpool")]
    Zpool,
}

pub struct Remote {
    executor:       Box<dyn Executor>,
    logger:         Logger,
    command_prefix: Option<String>,
}

impl fmt::Debug for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Remote").field("command_prefix", &self.command_prefix).finish()
    }
}

impl Remote {
    pub fn new<E: Executor + 'static>(executor: E) -> Self {
        Remote {
            executor:       Box::new(executor),
            logger:         GlobalLogger::module("exec", "remote"),
            command_prefix: None,
        }
    }

    /// `new` over ssh, with the configured command prefix applied.
    pub fn from_config(config: SshConfig) -> Self {
        let prefix = config.command_prefix().clone();
        let remote = Remote::new(SshOpen3::new(config));
        match prefix {
            Some(prefix) => remote.with_command_prefix(prefix),
            None => remote,
        }
    }

    /// Same as `new`, but log through supplied logger instead of the global one.
    pub fn with_logger<E: Executor + 'static>(executor: E, logger: &Logger) -> Self {
        let mut remote = Remote::new(executor);
        remote.logger = log::scoped(logger, "exec", "remote");
        remote
    }

    /// Prepend `prefix` (`sudo` for example) to every command.
    pub fn with_command_prefix<P: Into<String>>(mut self, prefix: P) -> Self {
        let prefix = prefix.into();
        self.command_prefix = if prefix.trim().is_empty() { None } else { Some(prefix) };
        self
    }

    pub(crate) fn logger(&self) -> &Logger { &self.logger }

    /// Run formatted command and classify the outcome. On success returns stdout minus one
    /// trailing newline.
    ///
    /// Non-empty stderr always wins over transport failures, even if the command timed out. A
    /// non-zero exit with nothing on stderr is still a failed command.
    pub fn execute(&self, command: fmt::Arguments<'_>) -> Result<String> {
        let command = match &self.command_prefix {
            Some(prefix) => format!("{} {}", prefix, command),
            None => command.to_string(),
        };
        debug!(self.logger, "executing"; "cmd" => &command);
        let output = self.executor.run(&command, COMMAND_TIMEOUT).map_err(Error::Transport)?;
        if !output.stderr.is_empty() {
            debug!(self.logger, "command failed"; "cmd" => &command, "stderr" => &output.stderr);
            return Err(Error::from_stderr(&output.stderr));
        }
        if !output.completed {
            warn!(self.logger, "command timed out"; "cmd" => &command, "timeout" => ?COMMAND_TIMEOUT);
            return Err(Error::timed_out());
        }
        if let Some(code) = output.exit_code.filter(|code| *code != 0) {
            debug!(self.logger, "command failed"; "cmd" => &command, "exit_code" => code);
            return Err(Error::RemoteCommand(format!("`{}` exited with status {}", command, code)));
        }
        Ok(strip_newline(output.stdout))
    }

    /// Find current name of the pool or dataset with given guid.
    pub fn name_by_guid(&self, base: BaseCommand, guid: &str) -> Result<String> {
        let stdout = self.execute(format_args!("{} list -H -o name,guid", base))?;
        let found = parse_rows(&stdout, 2)?
            .into_iter()
            .find(|row| row[1] == guid)
            .map(|row| row[0].to_string());
        match found {
            Some(name) => {
                debug!(self.logger, "resolved guid"; "guid" => guid, "name" => &name);
                Ok(name)
            },
            None => Err(Error::ResourceNotFound(guid.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{scripted::ScriptedExecutor, *};
    use crate::ErrorKind;

    #[test]
    fn test_trailing_newline_stripped_once() {
        let exec = ScriptedExecutor::default();
        exec.respond("echo", "a\n\n");
        let remote = exec.remote();
        assert_eq!("a\n", remote.execute(format_args!("echo")).unwrap());
    }

    #[test]
    fn test_stderr_classification() {
        let exec = ScriptedExecutor::default();
        exec.fail("zfs get all tank/a", "cannot open 'tank/a': dataset does not exist\n");
        exec.fail("zpool get all tank", "cannot open 'tank': no such pool\n");
        exec.fail("zfs destroy -r tank", "cannot destroy 'tank': operation not applicable\n");
        let remote = exec.remote();

        let err = remote.execute(format_args!("zfs get all {}", "tank/a")).unwrap_err();
        assert_eq!(ErrorKind::DatasetNotFound, err.kind());
        let err = remote.execute(format_args!("zpool get all {}", "tank")).unwrap_err();
        assert_eq!(ErrorKind::PoolNotFound, err.kind());
        let err = remote.execute(format_args!("zfs destroy -r {}", "tank")).unwrap_err();
        assert_eq!(ErrorKind::RemoteCommand, err.kind());
    }

    #[test]
    fn test_silent_non_zero_exit_is_failure() {
        let exec = ScriptedExecutor::default();
        exec.exit("zfs set atime=off tank", 1);
        let remote = exec.remote();
        let err = remote.execute(format_args!("zfs set atime=off {}", "tank")).unwrap_err();
        assert_eq!(ErrorKind::RemoteCommand, err.kind());
        assert_eq!("remote command failed: `zfs set atime=off tank` exited with status 1", err.to_string());
    }

    #[test]
    fn test_timeout_is_transport() {
        let exec = ScriptedExecutor::default();
        exec.time_out("zpool list -HPv tank");
        let remote = exec.remote();
        let err = remote.execute(format_args!("zpool list -HPv tank")).unwrap_err();
        assert_eq!(ErrorKind::Transport, err.kind());
        if let Error::Transport(e) = err {
            assert_eq!(io::ErrorKind::TimedOut, e.kind());
        }
    }

    #[test]
    fn test_disconnect_is_transport() {
        let exec = ScriptedExecutor::default();
        exec.disconnect("zfs list -H -o name,guid");
        let remote = exec.remote();
        let err = remote.execute(format_args!("zfs list -H -o name,guid")).unwrap_err();
        assert_eq!(ErrorKind::Transport, err.kind());
    }

    #[test]
    fn test_command_prefix() {
        let exec = ScriptedExecutor::default();
        let remote = exec.remote().with_command_prefix("sudo");
        remote.execute(format_args!("zpool destroy {}", "tank")).unwrap();
        assert_eq!(vec!["sudo zpool destroy tank"], exec.issued());
    }

    #[test]
    fn test_name_by_guid() {
        let exec = ScriptedExecutor::default();
        exec.respond("zfs list -H -o name,guid", include_str!("../zfs/fixtures/list_name_guid.txt"));
        let remote = exec.remote();

        assert_eq!("tank/renamed", remote.name_by_guid(BaseCommand::Zfs, "7263426347843853472").unwrap());
        let err = remote.name_by_guid(BaseCommand::Zfs, "1").unwrap_err();
        assert_eq!(ErrorKind::ResourceNotFound, err.kind());
        assert_eq!("no resource found with guid 1", err.to_string());
    }
}
