//! Open3 implementation of [`Executor`](../trait.Executor.html) on top of local `ssh` binary.
//!
//! ### Usage
//! ```rust,no_run
//! use zetta_agent::{config::SshConfig, exec::{Remote, SshOpen3}};
//!
//! let config = SshConfig::from_env().unwrap();
//! // Same as `Remote::from_config(config)`, minus the command prefix.
//! let remote = Remote::new(SshOpen3::new(config));
//!
//! let pools = remote.execute(format_args!("zpool list -H -o name")).unwrap();
//! ```
//!
//! It's called open 3 because it opens stdin, stdout, stder.
use std::{io::{self, Read},
          process::{Child, Command, ExitStatus, Stdio},
          thread,
          time::{Duration, Instant}};

use slog::Logger;

use super::{Executor, RunOutput};
use crate::{config::SshConfig,
            log::{self, GlobalLogger}};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// ssh uses this exit code for its own failures.
const SSH_FAILURE: i32 = 255;

pub struct SshOpen3 {
    config: SshConfig,
    logger: Logger,
}

impl SshOpen3 {
    pub fn new(config: SshConfig) -> Self {
        SshOpen3 { config, logger: GlobalLogger::module("exec", "ssh") }
    }

    /// Same as `new`, but log through supplied logger.
    pub fn with_logger(config: SshConfig, logger: &Logger) -> Self {
        SshOpen3 { config, logger: log::scoped(logger, "exec", "ssh") }
    }

    fn ssh(&self, command: &str) -> Command {
        let mut ssh = Command::new(self.config.ssh_cmd());
        ssh.args(&["-o", "BatchMode=yes", "-p"]).arg(self.config.port().to_string());
        if let Some(key_path) = self.config.key_path() {
            ssh.arg("-i").arg(key_path);
        }
        ssh.arg(format!("{}@{}", self.config.user(), self.config.host()));
        ssh.arg(command);
        ssh.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        ssh
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<io::Result<String>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
}

fn join(handle: thread::JoinHandle<io::Result<String>>) -> io::Result<String> {
    handle
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "output reader panicked"))?
}

/// Wait for the child until `deadline`. `None` if it had to be killed.
fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            // It may have exited on its own since try_wait.
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

impl Executor for SshOpen3 {
    fn run(&self, command: &str, timeout: Duration) -> io::Result<RunOutput> {
        let mut ssh = self.ssh(command);
        debug!(self.logger, "executing"; "cmd" => format_args!("{:?}", ssh));
        let mut child = ssh.spawn()?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = wait_until(&mut child, Instant::now() + timeout)?;
        let stdout = join(stdout)?;
        let stderr = join(stderr)?;

        match status {
            None => {
                warn!(self.logger, "killed after timeout"; "host" => self.config.host(), "timeout" => ?timeout);
                Ok(RunOutput { stdout, stderr, completed: false, exit_code: None })
            },
            Some(status) if status.code() == Some(SSH_FAILURE) && stderr.is_empty() => {
                Err(io::Error::new(
                    io::ErrorKind::ConnectionAborted,
                    format!("ssh to {} failed with {}", self.config.host(), status),
                ))
            },
            Some(status) => Ok(RunOutput { stdout, stderr, completed: true, exit_code: status.code() }),
        }
    }
}
