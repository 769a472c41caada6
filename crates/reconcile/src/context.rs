//! Provider traits
//!
//! These traits keep the reconciliation core independent of how commands
//! are spawned, which package manager the host uses, and how progress is
//! shown to the user.

use crate::error::{Error, Result};
use crate::types::{Action, Cmd, CommandOutput};
use std::process::{Command, Stdio};

/// Runs external commands and captures their output.
///
/// Implementations must never route a command through a shell.
pub trait CommandRunner: Send + Sync {
    /// Run `cmd` to completion.
    ///
    /// Fails only if the process could not be started; a non-zero exit is
    /// reported through [`CommandOutput::code`].
    fn output(&self, cmd: &Cmd) -> std::io::Result<CommandOutput>;

    /// Run `cmd` and treat a non-zero exit as an error
    fn run(&self, cmd: &Cmd) -> Result<CommandOutput> {
        let output = self.output(cmd).map_err(|source| Error::Spawn {
            command: cmd.to_string(),
            source,
        })?;

        if !output.success() {
            return Err(Error::CommandFailed {
                command: cmd.to_string(),
                code: output.code,
                stderr: output.stderr_str().trim().to_string(),
            });
        }

        Ok(output)
    }
}

/// Runner backed by `std::process::Command`.
///
/// Blocks until the child exits; there is no timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, cmd: &Cmd) -> std::io::Result<CommandOutput> {
        log::trace!("spawning: {cmd}");
        Command::new(cmd.program())
            .args(cmd.get_args())
            .envs(cmd.get_env().iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .output()
            .map(CommandOutput::from)
    }
}

/// Uniform capability set over a host package manager.
///
/// Queries fail closed: if the backend cannot answer, the package counts as
/// unavailable or not installed.
pub trait PackageBackend: Send + Sync {
    /// Short backend name (e.g., "apt", "pacman")
    fn name(&self) -> &'static str;

    /// Whether the package can be installed from the configured repositories
    fn exists_in_repository(&self, package: &str) -> bool;

    /// Whether the package is currently installed
    fn is_installed(&self, package: &str) -> bool;

    /// Non-interactive bulk install invocation; package names are appended
    /// by the caller
    fn install_command(&self) -> Cmd;
}

/// Progress callback for plan execution
pub trait ExecutionObserver {
    /// Called before an action's command is run
    fn on_action_start(&mut self, index: usize, total: usize, action: &Action);

    /// Called after an action's command finished
    fn on_action_complete(&mut self, action: &Action, result: &Result<()>);
}

/// Observer that ignores all events
pub struct NoProgress;

impl ExecutionObserver for NoProgress {
    fn on_action_start(&mut self, _index: usize, _total: usize, _action: &Action) {}
    fn on_action_complete(&mut self, _action: &Action, _result: &Result<()>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_runner_captures_output() {
        let out = SystemRunner
            .run(&Cmd::new("echo").arg("hello"))
            .expect("echo should run");
        assert!(out.success());
        assert_eq!(out.stdout_str().trim(), "hello");
    }

    #[test]
    fn test_system_runner_reports_exit_status() {
        let err = SystemRunner.run(&Cmd::new("false")).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { code: Some(1), .. }));
    }

    #[test]
    fn test_system_runner_missing_program() {
        let err = SystemRunner
            .run(&Cmd::new("/nonexistent/hearth-validator"))
            .unwrap_err();
        assert!(err.is_command_not_found());
    }

    #[test]
    fn test_system_runner_passes_env() {
        let out = SystemRunner
            .run(&Cmd::new("env").env("HEARTH_TEST_VALUE", "42"))
            .expect("env should run");
        assert!(out.stdout_str().contains("HEARTH_TEST_VALUE=42"));
    }
}
