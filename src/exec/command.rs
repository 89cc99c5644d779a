// src/exec/command.rs

//! Shell command runner for a single pass.

use std::process::Command;
use std::sync::OnceLock;

use tracing::{debug, error, info, warn};

use crate::dag::{Action, ActionRef};
use crate::exec::PassStatus;

/// A pass implemented by a shell command.
///
/// A failing command is *not* a fatal fault: the outcome is recorded and
/// the pool keeps going. Callers inspect [`CommandAction::status`] after the
/// pool has drained.
#[derive(Debug)]
pub struct CommandAction {
    name: String,
    cmd: String,
    deps: Vec<ActionRef>,
    status: OnceLock<PassStatus>,
}

impl CommandAction {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>, deps: Vec<ActionRef>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            deps,
            status: OnceLock::new(),
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    /// Outcome of the pass, or `None` if it has not run (yet).
    pub fn status(&self) -> Option<PassStatus> {
        self.status.get().copied()
    }
}

impl Action for CommandAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn deps(&self) -> &[ActionRef] {
        &self.deps
    }

    fn exec(&self) {
        let status = run_command(&self.name, &self.cmd);

        if self.status.set(status).is_err() {
            warn!(pass = %self.name, "pass ran more than once; keeping first status");
        }
    }
}

/// Run `cmd` through the platform shell and wait for it.
fn run_command(name: &str, cmd: &str) -> PassStatus {
    info!(pass = %name, cmd = %cmd, "starting pass");

    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    let output = match command.output() {
        Ok(output) => output,
        Err(err) => {
            error!(pass = %name, error = %err, "failed to spawn pass process");
            return PassStatus::Failed(-1);
        }
    };

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        info!(pass = %name, "stdout: {}", line);
    }
    for line in String::from_utf8_lossy(&output.stderr).lines() {
        debug!(pass = %name, "stderr: {}", line);
    }

    let code = output.status.code().unwrap_or(-1);
    let success = output.status.success();
    info!(pass = %name, exit_code = code, success, "pass process exited");

    if success {
        PassStatus::Success
    } else {
        PassStatus::Failed(code)
    }
}
