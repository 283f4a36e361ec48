//! Subprocess invocation for the external collaborators: the dependency
//! manager, the test runner self-check, and the application's installer and
//! uninstaller.
//!
//! Every command gets its own working directory through
//! [`std::process::Command::current_dir`], so the caller's directory is never
//! touched. No timeout is enforced: a hung command blocks the caller.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::CommandSpec;
use crate::error::{Result, TestSiteError};

/// Exit status and captured stdout of one finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    pub output: Vec<String>,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external commands. The controller only talks to this trait, so tests
/// can substitute a recording fake.
pub trait CommandRunner {
    /// Run `command` in `cwd` and wait for it. A non-zero exit is not an
    /// error here; failure to spawn is.
    fn run(&self, command: &CommandSpec, cwd: &Path) -> Result<ProcessOutcome>;

    /// Like [`CommandRunner::run`], but a non-zero exit becomes
    /// [`TestSiteError::ExternalCommandFailed`].
    fn run_or_raise(&self, command: &CommandSpec, cwd: &Path) -> Result<ProcessOutcome> {
        let outcome = self.run(command, cwd)?;
        if !outcome.success() {
            return Err(TestSiteError::ExternalCommandFailed {
                command: command.to_string(),
                exit_code: outcome.exit_code,
                output: outcome.output,
            });
        }
        Ok(outcome)
    }
}

/// Real runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandSpec, cwd: &Path) -> Result<ProcessOutcome> {
        let program = resolve_program(&command.program, cwd);
        tracing::debug!(command = %command, cwd = %cwd.display(), "running external command");

        let output = Command::new(&program)
            .args(&command.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            // stderr flows through so installer progress stays visible
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| TestSiteError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let output = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect();
        tracing::debug!(command = %command, exit_code, "external command finished");
        Ok(ProcessOutcome { exit_code, output })
    }
}

/// A relative program containing a separator (`bin/behat`) is taken from
/// `cwd`; a bare name (`php`) is left for `PATH` lookup.
fn resolve_program(program: &str, cwd: &Path) -> PathBuf {
    let path = Path::new(program);
    if path.is_relative() && path.components().count() > 1 {
        cwd.join(path)
    } else {
        path.to_path_buf()
    }
}
