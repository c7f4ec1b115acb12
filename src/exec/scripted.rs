//! In-memory executor for tests. Replays canned responses keyed by exact command line and keeps
//! a log of everything that was issued.
use std::{cell::RefCell,
          collections::{HashMap, VecDeque},
          io,
          rc::Rc,
          time::Duration};

use super::{Executor, Remote, RunOutput};

#[derive(Debug, Clone)]
enum Response {
    Output(RunOutput),
    Disconnect(io::ErrorKind),
}

#[derive(Debug, Default)]
struct Script {
    responses: HashMap<String, VecDeque<Response>>,
    issued:    Vec<String>,
}

/// Unscripted commands succeed with empty output. When a command has several responses queued
/// they are handed out in order and the last one sticks.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    script: Rc<RefCell<Script>>,
}

impl ScriptedExecutor {
    fn push(&self, command: &str, response: Response) {
        self.script
            .borrow_mut()
            .responses
            .entry(command.to_string())
            .or_insert_with(VecDeque::new)
            .push_back(response);
    }

    pub fn respond(&self, command: &str, stdout: &str) {
        self.push(
            command,
            Response::Output(RunOutput {
                stdout:    stdout.to_string(),
                stderr:    String::new(),
                completed: true,
                exit_code: Some(0),
            }),
        );
    }

    pub fn fail(&self, command: &str, stderr: &str) {
        self.push(
            command,
            Response::Output(RunOutput {
                stdout:    String::new(),
                stderr:    stderr.to_string(),
                completed: true,
                exit_code: Some(1),
            }),
        );
    }

    /// Exit with `code` without printing anything.
    pub fn exit(&self, command: &str, code: i32) {
        self.push(command, Response::Output(RunOutput { completed: true, exit_code: Some(code), ..RunOutput::default() }));
    }

    pub fn time_out(&self, command: &str) {
        self.push(command, Response::Output(RunOutput::default()));
    }

    pub fn disconnect(&self, command: &str) {
        self.push(command, Response::Disconnect(io::ErrorKind::ConnectionReset));
    }

    /// Every command line issued so far, in order.
    pub fn issued(&self) -> Vec<String> { self.script.borrow().issued.clone() }

    /// Number of issued commands starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.script.borrow().issued.iter().filter(|cmd| cmd.starts_with(prefix)).count()
    }

    pub fn remote(&self) -> Remote { Remote::new(self.clone()) }
}

impl Executor for ScriptedExecutor {
    fn run(&self, command: &str, _timeout: Duration) -> io::Result<RunOutput> {
        let mut script = self.script.borrow_mut();
        script.issued.push(command.to_string());
        let response = match script.responses.get_mut(command) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        match response {
            Some(Response::Output(output)) => Ok(output),
            Some(Response::Disconnect(kind)) => Err(io::Error::new(kind, "connection lost")),
            None => Ok(RunOutput { completed: true, exit_code: Some(0), ..RunOutput::default() }),
        }
    }
}
