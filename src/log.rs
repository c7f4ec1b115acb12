//! Crate-wide slog logger.
//!
//! Records go to the `log` crate through `slog-stdlog` unless the host installs its own drain
//! with [`GlobalLogger::setup`]. `Remote` and `SshOpen3` take their logger when they are built, so
//! `setup` has to run before the first of them.
use std::ops::Deref;

use once_cell::sync::OnceCell;
use slog::{Drain, Logger};
use slog_stdlog::StdLog;

static AGENT_LOGGER: OnceCell<GlobalLogger> = OnceCell::new();

/// Root of every logger in the crate. Records carry `agent_version`.
#[derive(Debug, Clone)]
pub struct GlobalLogger(Logger);

impl Deref for GlobalLogger {
    type Target = Logger;

    fn deref(&self) -> &Logger { &self.0 }
}

impl GlobalLogger {
    fn wrap(root: &Logger) -> Self { GlobalLogger(root.new(o!("agent_version" => crate::VERSION))) }

    /// Logger installed by `setup`, or a `StdLog` backed one if `setup` was never called.
    pub fn get() -> &'static GlobalLogger {
        AGENT_LOGGER.get_or_init(|| GlobalLogger::wrap(&Logger::root(StdLog.fuse(), o!())))
    }

    /// Install `root` as the crate's logger. Only the first call wins, later ones get their
    /// logger back in `Err`.
    pub fn setup(root: &Logger) -> Result<(), GlobalLogger> { AGENT_LOGGER.set(GlobalLogger::wrap(root)) }

    /// Logger for one part of the crate, hanging off the global one.
    pub(crate) fn module(name: &'static str, implementation: &'static str) -> Logger {
        scoped(GlobalLogger::get(), name, implementation)
    }
}

/// Child of `parent` tagged with `zetta_module` and `zetta_impl`.
pub(crate) fn scoped(parent: &Logger, name: &'static str, implementation: &'static str) -> Logger {
    parent.new(o!("zetta_module" => name, "zetta_impl" => implementation))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scoped_keeps_parent_keys() {
        let parent = Logger::root(slog::Discard, o!("host" => "nas.local"));
        let keys = format!("{:?}", scoped(&parent, "exec", "ssh").list());
        assert!(keys.contains("zetta_module"), "{}", keys);
        assert!(keys.contains("zetta_impl"), "{}", keys);
        assert!(keys.ends_with("host)"), "{}", keys);
    }
}
